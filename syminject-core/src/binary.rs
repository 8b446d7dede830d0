use crate::formats::{default_readers, FormatReader};
use crate::resolve::{self, ResolvedSymbol};
use crate::{Error, ErrorKind, Result, Section, Symbol, SymbolTable};
use std::io::{Read, Seek, SeekFrom};

/// A parsed binary together with the byte source it was read from.
///
/// The symbol model is fixed once opened. Injection streams a patched copy
/// of the source to a writer and never modifies the source itself.
#[derive(Debug)]
pub struct Binary<R> {
    pub(crate) source: R,
    format: &'static str,
    table: SymbolTable,
}

impl<R: Read + Seek> Binary<R> {
    /// Parse `source` as ELF, then Mach-O, then PE.
    ///
    /// If no reader recognizes the file, the ELF reader's error is returned.
    pub fn open(source: R) -> Result<Self> {
        Self::open_with(source, &default_readers())
    }

    /// Parse `source` with an explicit, ordered list of readers.
    pub fn open_with(mut source: R, readers: &[&dyn FormatReader]) -> Result<Self> {
        let data = read_all(&mut source)?;
        let (table, reader) = dispatch(&data, readers, |reader| reader.extract(&data))?;
        log::info!(
            "Parsed {} file: {} symbols in {} sections",
            reader.format_name(),
            table.symbols.len(),
            table.sections.len()
        );
        Ok(Self {
            source,
            format: reader.format_name(),
            table,
        })
    }

    /// Resolve `name` to the file range it occupies.
    pub fn find_symbol(&self, name: &str) -> Result<ResolvedSymbol> {
        resolve::find_symbol(&self.table, name)
    }

    /// Read the current contents of a symbol from the source.
    pub fn read_symbol(&mut self, name: &str) -> Result<Vec<u8>> {
        let resolved = self.find_symbol(name)?;
        read_range(&mut self.source, resolved.offset, resolved.size)
    }
}

impl<R> Binary<R> {
    /// Name of the format the file was parsed as.
    pub fn format(&self) -> &'static str {
        self.format
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.table.symbols
    }

    pub fn sections(&self) -> &[Section] {
        &self.table.sections
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Give the byte source back.
    pub fn into_inner(self) -> R {
        self.source
    }
}

/// Run `attempt` with each reader until one succeeds.
///
/// Only [`ErrorKind::FormatNotRecognized`] moves on to the next reader; any
/// other error is returned straight away. When every reader rejects the
/// file, the first reader's error is kept.
pub(crate) fn dispatch<'r, T>(
    data: &[u8],
    readers: &[&'r dyn FormatReader],
    mut attempt: impl FnMut(&'r dyn FormatReader) -> Result<T>,
) -> Result<(T, &'r dyn FormatReader)> {
    let mut first_error = None;
    for &reader in readers {
        log::debug!("Trying {} reader on {} bytes", reader.format_name(), data.len());
        match attempt(reader) {
            Ok(value) => return Ok((value, reader)),
            Err(e) if e.kind() == ErrorKind::FormatNotRecognized => {
                log::debug!("{e}");
                first_error.get_or_insert(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(first_error.unwrap_or_else(|| Error::not_recognized("object", "no format readers")))
}

pub(crate) fn read_all<R: Read + Seek>(source: &mut R) -> Result<Vec<u8>> {
    source.seek(SeekFrom::Start(0))?;
    let mut data = Vec::new();
    source.read_to_end(&mut data)?;
    Ok(data)
}

pub(crate) fn read_range<R: Read + Seek>(source: &mut R, offset: u64, size: u64) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; size as usize];
    source.seek(SeekFrom::Start(offset))?;
    source.read_exact(&mut buf)?;
    Ok(buf)
}
