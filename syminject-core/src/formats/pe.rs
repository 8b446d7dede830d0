use crate::formats::{strip_underscore, FormatReader};
use crate::{Error, Result, Section, Symbol, SymbolTable};
use goblin::pe::header::{COFF_MACHINE_X86, DOS_MAGIC};
use goblin::pe::PE;

const FORMAT: &str = "PE";

/// Reads the COFF symbol table of PE images.
///
/// COFF symbols have no size and their value is already an offset into
/// the section.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeReader;

impl FormatReader for PeReader {
    fn format_name(&self) -> &'static str {
        FORMAT
    }

    fn extract(&self, data: &[u8]) -> Result<SymbolTable> {
        if data.len() < 2 || u16::from_le_bytes([data[0], data[1]]) != DOS_MAGIC {
            return Err(Error::not_recognized(FORMAT, "missing MZ magic"));
        }
        let pe = PE::parse(data).map_err(|e| Error::goblin(FORMAT, e))?;

        let sections: Vec<Section> = pe
            .sections
            .iter()
            .map(|s| {
                let name = match &s.real_name {
                    Some(name) => name.clone(),
                    None => s.name().unwrap_or("").to_string(),
                };
                // The zero-filled tail past the raw data has no file bytes.
                let size = match s.virtual_size {
                    0 => s.size_of_raw_data,
                    virtual_size => virtual_size.min(s.size_of_raw_data),
                };
                Section {
                    name,
                    vma: u64::from(s.virtual_address),
                    file_offset: u64::from(s.pointer_to_raw_data),
                    size: u64::from(size),
                    file_backed: s.pointer_to_raw_data != 0 && s.size_of_raw_data != 0,
                }
            })
            .collect();

        let coff = &pe.header.coff_header;
        let strtab = coff.strings(data).map_err(|e| Error::goblin(FORMAT, e))?;
        let mut coff_symbols = Vec::new();
        match coff.symbols(data).map_err(|e| Error::goblin(FORMAT, e))? {
            Some(table) => {
                for (_, inline_name, sym) in table.iter() {
                    if sym.section_number <= 0 {
                        continue;
                    }
                    let name = match (inline_name, &strtab) {
                        (Some(name), _) => name.to_string(),
                        (None, Some(strtab)) => sym
                            .name(strtab)
                            .map_err(|e| Error::goblin(FORMAT, e))?
                            .to_string(),
                        (None, None) => {
                            return Err(Error::malformed(
                                FORMAT,
                                "long symbol name without a string table",
                            ))
                        }
                    };
                    coff_symbols.push((name, sym.section_number, sym.value));
                }
            }
            None => log::debug!("PE: no COFF symbol table"),
        }
        coff_symbols.sort_by_key(|&(_, section_number, value)| (section_number, value));

        let strip_prefix = coff.machine == COFF_MACHINE_X86;
        let mut symbols = Vec::with_capacity(coff_symbols.len());
        for (name, section_number, value) in coff_symbols {
            let index = section_number as usize - 1;
            let section = sections.get(index).ok_or_else(|| {
                Error::malformed(
                    FORMAT,
                    format!(
                        "symbol {name:?} has section number {section_number} past {} sections",
                        sections.len()
                    ),
                )
            })?;
            if !section.file_backed {
                log::warn!("Skipping {name:?}: section {:?} has no raw data", section.name);
                continue;
            }
            let name = if strip_prefix {
                strip_underscore(&name)
            } else {
                name.as_str()
            };
            symbols.push(Symbol::new(name, u64::from(value), 0, index));
        }

        log::debug!(
            "PE: {} sections, {} section symbols",
            sections.len(),
            symbols.len()
        );
        let table = SymbolTable::new(sections, symbols);
        table.validate(FORMAT, data.len() as u64)?;
        Ok(table)
    }
}
