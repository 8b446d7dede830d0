use crate::{Error, Result, Section};

/// A named location inside exactly one [`Section`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    /// Offset of the symbol from the start of its section's address range.
    ///
    /// Readers subtract the section's virtual address, so
    /// `section.file_offset + address` is the symbol's file position.
    pub address: u64,
    /// Size in bytes, or 0 when the format does not record one.
    pub size: u64,
    /// Index into [`SymbolTable::sections`].
    pub section: usize,
}

impl Symbol {
    pub fn new(name: impl Into<String>, address: u64, size: u64, section: usize) -> Self {
        Self {
            name: name.into(),
            address,
            size,
            section,
        }
    }
}

/// The uniform model every format reader produces.
///
/// Symbol order is the reader's order and matters for size inference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    pub symbols: Vec<Symbol>,
    pub sections: Vec<Section>,
}

impl SymbolTable {
    pub fn new(sections: Vec<Section>, symbols: Vec<Symbol>) -> Self {
        Self { symbols, sections }
    }

    /// The section a symbol lives in.
    pub fn section_of(&self, symbol: &Symbol) -> Option<&Section> {
        self.sections.get(symbol.section)
    }

    /// Check that every section holding a symbol lies inside the file.
    pub(crate) fn validate(&self, format: &'static str, file_len: u64) -> Result<()> {
        for symbol in &self.symbols {
            let section = self.section_of(symbol).ok_or_else(|| {
                Error::malformed(
                    format,
                    format!(
                        "symbol {:?} refers to section {} of {}",
                        symbol.name,
                        symbol.section,
                        self.sections.len()
                    ),
                )
            })?;
            if !section.fits_in(file_len) {
                return Err(Error::malformed(
                    format,
                    format!(
                        "section {:?} at {:#x}+{:#x} extends past end of file ({:#x})",
                        section.name, section.file_offset, section.size, file_len
                    ),
                ));
            }
        }
        Ok(())
    }
}
