use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use syminject_core::Binary;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Stamp values into symbols of already-linked binaries
#[derive(Parser)]
#[command(
    name = "syminject",
    about = "Overwrite symbol contents in ELF, Mach-O and PE files without relinking",
    version,
    author
)]
struct Cli {
    /// Path to input binary
    #[arg(required = true)]
    path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inject a nul-padded string into a symbol
    String {
        /// Symbol to inject into
        #[arg(short, long)]
        symbol: String,
        /// Value to inject
        #[arg(short, long)]
        value: String,
        /// Expected current value of the symbol, checked before injecting
        #[arg(long)]
        from: Option<String>,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Inject a little-endian 64-bit integer into an 8-byte symbol
    Uint64 {
        /// Symbol to inject into
        #[arg(short, long)]
        symbol: String,
        /// Value to inject, decimal or 0x-prefixed hex
        #[arg(short, long, value_parser = parse_u64)]
        value: u64,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the current contents of a symbol
    Read {
        #[arg(short, long)]
        symbol: String,
    },
    /// List all symbols
    Dump {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List all sections
    Sections,
}

#[derive(Serialize)]
struct SymbolRow<'a> {
    name: &'a str,
    address: u64,
    size: u64,
    section: &'a str,
}

#[derive(Tabled)]
struct SectionRow {
    #[tabled(rename = "Section")]
    name: String,
    #[tabled(rename = "VMA")]
    vma: String,
    #[tabled(rename = "Offset")]
    offset: String,
    #[tabled(rename = "Size")]
    size: String,
}

fn parse_u64(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid 64-bit value {s:?}: {e}"))
}

fn open(path: &Path) -> Result<Binary<fs::File>> {
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Binary::open(file).with_context(|| format!("reading {}", path.display()))
}

/// Run `write` against a temporary file next to `output` and move it into
/// place only if it succeeds.
fn write_atomically(
    input: &Path,
    output: &Path,
    write: impl FnOnce(&mut BufWriter<&fs::File>) -> syminject_core::Result<()>,
) -> Result<()> {
    let dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;
    log::debug!("Staging {} in {}", output.display(), tmp.path().display());
    {
        let mut writer = BufWriter::new(tmp.as_file());
        write(&mut writer)?;
        writer.flush()?;
    }
    let permissions = fs::metadata(input)?.permissions();
    fs::set_permissions(tmp.path(), permissions)?;
    tmp.persist(output)
        .with_context(|| format!("writing {}", output.display()))?;
    log::info!("Wrote {}", output.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::String {
            symbol,
            value,
            from,
            output,
        } => {
            let mut bin = open(&cli.path)?;
            write_atomically(&cli.path, &output, |w| {
                bin.inject_string(w, &symbol, &value, from.as_deref())
            })
            .with_context(|| format!("injecting into {symbol:?}"))?;
            println!(
                "{} {symbol} = {value:?} -> {}",
                "injected".green().bold(),
                output.display()
            );
        }

        Command::Uint64 {
            symbol,
            value,
            output,
        } => {
            let mut bin = open(&cli.path)?;
            write_atomically(&cli.path, &output, |w| bin.inject_u64(w, &symbol, value))
                .with_context(|| format!("injecting into {symbol:?}"))?;
            println!(
                "{} {symbol} = {value:#x} -> {}",
                "injected".green().bold(),
                output.display()
            );
        }

        Command::Read { symbol } => {
            let mut bin = open(&cli.path)?;
            let bytes = bin.read_symbol(&symbol)?;
            let text_end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
            println!("{:<8} {:?}", "string", String::from_utf8_lossy(&bytes[..text_end]));
            println!("{:<8} {}", "hex", hex.join(" "));
        }

        Command::Dump { json: false } => {
            let mut file = fs::File::open(&cli.path)
                .with_context(|| format!("opening {}", cli.path.display()))?;
            let stdout = io::stdout();
            syminject_core::dump_symbols(&mut file, &mut stdout.lock())?;
        }

        Command::Dump { json: true } => {
            let bin = open(&cli.path)?;
            let rows: Vec<SymbolRow> = bin
                .symbols()
                .iter()
                .map(|s| SymbolRow {
                    name: &s.name,
                    address: s.address,
                    size: s.size,
                    section: bin.table().section_of(s).map_or("", |sec| sec.name.as_str()),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }

        Command::Sections => {
            let bin = open(&cli.path)?;
            if bin.sections().is_empty() {
                println!("No sections found.");
            } else {
                let rows = bin.sections().iter().map(|s| SectionRow {
                    name: s.name.clone(),
                    vma: format!("0x{:x}", s.vma),
                    offset: format!("0x{:x}", s.file_offset),
                    size: format!("0x{:x}", s.size),
                });
                let mut table = Table::new(rows);
                table.with(Style::psql());
                println!("{} ({})", cli.path.display(), bin.format().bold());
                println!("{table}");
            }
        }
    }

    Ok(())
}
