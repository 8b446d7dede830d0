use crate::{Error, ErrorKind, Result, SymbolTable};

/// Largest span accepted when a symbol's size has to be inferred.
///
/// Unsized symbols are expected to be scalars or short strings; a wider
/// span means the next-symbol heuristic latched onto something unrelated.
pub const MAX_INFERRED_SIZE: u64 = 4096;

/// The file byte range a symbol occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSymbol {
    /// Absolute offset of the symbol's first byte in the file.
    pub offset: u64,
    /// Number of bytes that may be overwritten.
    pub size: u64,
}

/// Find the first symbol called `name` and compute its file range.
///
/// A recorded size of 0 is inferred from the next symbol in the same section
/// at a higher address, or from the end of the section.
pub fn find_symbol(table: &SymbolTable, name: &str) -> Result<ResolvedSymbol> {
    let (index, symbol) = table
        .symbols
        .iter()
        .enumerate()
        .find(|(_, s)| s.name == name)
        .ok_or_else(|| Error::not_found(name))?;

    let section = table.section_of(symbol).ok_or_else(|| {
        Error::malformed(
            "symbol table",
            format!("symbol {name:?} refers to missing section {}", symbol.section),
        )
    })?;

    let size = if symbol.size != 0 {
        symbol.size
    } else {
        let next = table.symbols[index..]
            .iter()
            .take_while(|s| s.section == symbol.section)
            .find(|s| s.address > symbol.address);
        let end = match next {
            Some(next) => next.address,
            None => section.size,
        };
        if end <= symbol.address || end - symbol.address > MAX_INFERRED_SIZE {
            return Err(Error::symbol(
                ErrorKind::ImplausibleSymbolSize,
                format!(
                    "symbol {name:?} end address does not seem valid, {:#x}:{:#x}",
                    symbol.address, end
                ),
            ));
        }
        log::debug!(
            "Inferred size {} for {name:?} from {}",
            end - symbol.address,
            next.map_or("end of section", |s| s.name.as_str())
        );
        end - symbol.address
    };

    let offset = section
        .file_offset
        .checked_add(symbol.address)
        .ok_or_else(|| {
            Error::malformed(
                "symbol table",
                format!(
                    "symbol {name:?} offset {:#x}+{:#x} overflows",
                    section.file_offset, symbol.address
                ),
            )
        })?;

    // The whole range must stay inside the section's file bytes.
    let section_end = section.file_end();
    offset
        .checked_add(size)
        .filter(|&end| section_end.is_some_and(|section_end| end <= section_end))
        .ok_or_else(|| {
            Error::malformed(
                "symbol table",
                format!(
                    "symbol {name:?} at {offset:#x}+{size:#x} extends past section {:?} ({:#x}+{:#x})",
                    section.name, section.file_offset, section.size
                ),
            )
        })?;

    Ok(ResolvedSymbol { offset, size })
}
