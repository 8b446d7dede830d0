use crate::formats::FormatReader;
use crate::{Error, Result, Section, Symbol, SymbolTable};
use goblin::elf::header::{ELFMAG, SELFMAG};
use goblin::elf::section_header::{SHN_LORESERVE, SHN_UNDEF, SHT_NOBITS};
use goblin::elf::sym::STT_OBJECT;
use goblin::elf::Elf;

const FORMAT: &str = "ELF";

/// Reads data objects from the `.symtab` of ELF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElfReader;

impl FormatReader for ElfReader {
    fn format_name(&self) -> &'static str {
        FORMAT
    }

    fn extract(&self, data: &[u8]) -> Result<SymbolTable> {
        if data.len() < SELFMAG || &data[..SELFMAG] != ELFMAG {
            return Err(Error::not_recognized(FORMAT, "missing \\x7fELF magic"));
        }
        let elf = Elf::parse(data).map_err(|e| Error::goblin(FORMAT, e))?;

        let sections: Vec<Section> = elf
            .section_headers
            .iter()
            .map(|sh| Section {
                name: elf.shdr_strtab.get_at(sh.sh_name).unwrap_or("").to_string(),
                vma: sh.sh_addr,
                file_offset: sh.sh_offset,
                size: sh.sh_size,
                file_backed: sh.sh_type != SHT_NOBITS,
            })
            .collect();

        let mut symbols = Vec::new();
        for sym in elf.syms.iter() {
            if sym.st_type() != STT_OBJECT {
                continue;
            }
            if sym.st_shndx == SHN_UNDEF as usize || sym.st_shndx >= SHN_LORESERVE as usize {
                continue;
            }
            let name = elf.strtab.get_at(sym.st_name).unwrap_or("");
            let section = sections.get(sym.st_shndx).ok_or_else(|| {
                Error::malformed(
                    FORMAT,
                    format!(
                        "symbol {name:?} has section index {} past {} sections",
                        sym.st_shndx,
                        sections.len()
                    ),
                )
            })?;
            if !section.file_backed {
                log::warn!("Skipping {name:?}: section {:?} has no file contents", section.name);
                continue;
            }
            let address = sym.st_value.checked_sub(section.vma).ok_or_else(|| {
                Error::malformed(
                    FORMAT,
                    format!(
                        "symbol {name:?} value {:#x} is below section {:?} address {:#x}",
                        sym.st_value, section.name, section.vma
                    ),
                )
            })?;
            symbols.push(Symbol::new(name, address, sym.st_size, sym.st_shndx));
        }

        log::debug!(
            "ELF: {} sections, {} object symbols",
            sections.len(),
            symbols.len()
        );
        let table = SymbolTable::new(sections, symbols);
        table.validate(FORMAT, data.len() as u64)?;
        Ok(table)
    }
}
