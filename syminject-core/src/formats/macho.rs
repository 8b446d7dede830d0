use crate::formats::{strip_underscore, FormatReader};
use crate::{Error, Result, Section, Symbol, SymbolTable};
use byteorder::{ByteOrder, LE};
use goblin::mach::constants::{S_GB_ZEROFILL, S_THREAD_LOCAL_ZEROFILL, S_ZEROFILL, SECTION_TYPE};
use goblin::mach::header::{MH_CIGAM, MH_CIGAM_64, MH_MAGIC, MH_MAGIC_64};
use goblin::mach::symbols::N_STAB;
use goblin::mach::MachO;

const FORMAT: &str = "Mach-O";

/// Reads defined symbols from thin Mach-O files.
///
/// Mach-O records no symbol sizes, so every symbol is emitted with size 0
/// and symbols are ordered by address within their section for inference.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachOReader;

fn is_zerofill(flags: u32) -> bool {
    matches!(
        flags & SECTION_TYPE,
        S_ZEROFILL | S_GB_ZEROFILL | S_THREAD_LOCAL_ZEROFILL
    )
}

impl FormatReader for MachOReader {
    fn format_name(&self) -> &'static str {
        FORMAT
    }

    fn extract(&self, data: &[u8]) -> Result<SymbolTable> {
        if data.len() < 4 {
            return Err(Error::not_recognized(FORMAT, "file too short for a magic"));
        }
        let magic = LE::read_u32(data);
        if !matches!(magic, MH_MAGIC | MH_CIGAM | MH_MAGIC_64 | MH_CIGAM_64) {
            return Err(Error::not_recognized(
                FORMAT,
                format!("bad magic {magic:#010x}"),
            ));
        }
        let macho = MachO::parse(data, 0).map_err(|e| Error::goblin(FORMAT, e))?;

        let mut sections = Vec::new();
        for segment_sections in macho.segments.sections() {
            for item in segment_sections {
                let (section, _) = item.map_err(|e| Error::goblin(FORMAT, e))?;
                let segname = section.segname().map_err(|e| Error::goblin(FORMAT, e))?;
                let sectname = section.name().map_err(|e| Error::goblin(FORMAT, e))?;
                sections.push(Section {
                    name: format!("{segname},{sectname}"),
                    vma: section.addr,
                    file_offset: u64::from(section.offset),
                    size: section.size,
                    file_backed: !is_zerofill(section.flags),
                });
            }
        }

        let mut nlists = Vec::new();
        for entry in macho.symbols() {
            let (name, nlist) = entry.map_err(|e| Error::goblin(FORMAT, e))?;
            // Debugger (stab) entries carry no addressable data.
            if nlist.n_type & N_STAB != 0 || nlist.n_sect == 0 {
                continue;
            }
            nlists.push((name, nlist));
        }
        nlists.sort_by_key(|(_, nlist)| (nlist.n_sect, nlist.n_value));

        let mut symbols = Vec::with_capacity(nlists.len());
        for (name, nlist) in nlists {
            // n_sect numbers sections from 1 across all segments.
            let index = nlist.n_sect - 1;
            let section = sections.get(index).ok_or_else(|| {
                Error::malformed(
                    FORMAT,
                    format!(
                        "symbol {name:?} has section number {} past {} sections",
                        nlist.n_sect,
                        sections.len()
                    ),
                )
            })?;
            if !section.file_backed {
                log::warn!("Skipping {name:?}: section {:?} is zero-fill", section.name);
                continue;
            }
            let address = nlist.n_value.checked_sub(section.vma).ok_or_else(|| {
                Error::malformed(
                    FORMAT,
                    format!(
                        "symbol {name:?} value {:#x} is below section {:?} address {:#x}",
                        nlist.n_value, section.name, section.vma
                    ),
                )
            })?;
            symbols.push(Symbol::new(strip_underscore(name), address, 0, index));
        }

        log::debug!(
            "Mach-O: {} sections, {} defined symbols",
            sections.len(),
            symbols.len()
        );
        let table = SymbolTable::new(sections, symbols);
        table.validate(FORMAT, data.len() as u64)?;
        Ok(table)
    }
}
