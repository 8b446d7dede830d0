use crate::binary::{dispatch, read_all};
use crate::formats::{default_readers, FormatReader};
use crate::{Result, SymbolTable};
use std::io::{Read, Seek, Write};

/// Write a listing of every symbol in `source` to `out`.
///
/// Formats are tried in the same order, with the same error reporting, as
/// [`crate::Binary::open`].
pub fn dump_symbols<R: Read + Seek, W: Write>(source: &mut R, out: &mut W) -> Result<()> {
    dump_symbols_with(source, &default_readers(), out)
}

pub fn dump_symbols_with<R: Read + Seek, W: Write>(
    source: &mut R,
    readers: &[&dyn FormatReader],
    out: &mut W,
) -> Result<()> {
    let data = read_all(source)?;
    dispatch(&data, readers, |reader| reader.dump(&data, &mut *out))?;
    Ok(())
}

/// Render `table` as one line per symbol, preceded by a header naming `format`.
pub fn write_listing(format: &str, table: &SymbolTable, out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "{format}: {} symbols in {} sections",
        table.symbols.len(),
        table.sections.len()
    )?;
    for symbol in &table.symbols {
        let section = table
            .section_of(symbol)
            .map_or("<none>", |s| s.name.as_str());
        let size = match symbol.size {
            0 => "?".to_string(),
            n => n.to_string(),
        };
        writeln!(
            out,
            "{} addr={:#x} size={} section={}",
            symbol.name, symbol.address, size, section
        )?;
    }
    Ok(())
}
