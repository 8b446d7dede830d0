pub mod elf;
pub mod macho;
pub mod pe;

pub use elf::ElfReader;
pub use macho::MachOReader;
pub use pe::PeReader;

use crate::{Result, SymbolTable};
use std::io::Write;

/// Extracts the uniform symbol model from one container format.
pub trait FormatReader: std::fmt::Debug + Send + Sync {
    /// Returns a short human-readable name, e.g. "ELF" or "PE".
    fn format_name(&self) -> &'static str;

    /// Parses `data` into a [`SymbolTable`].
    ///
    /// Fails with [`crate::ErrorKind::FormatNotRecognized`] if `data` is not
    /// this format at all, and [`crate::ErrorKind::MalformedContainer`] if it
    /// is but cannot be read.
    fn extract(&self, data: &[u8]) -> Result<SymbolTable>;

    /// Writes a symbol listing for `data` to `out`.
    fn dump(&self, data: &[u8], out: &mut dyn Write) -> Result<()> {
        let table = self.extract(data)?;
        crate::dump::write_listing(self.format_name(), &table, out)
    }
}

/// The readers tried by [`crate::Binary::open`], in order.
pub fn default_readers() -> [&'static dyn FormatReader; 3] {
    [&ElfReader, &MachOReader, &PeReader]
}

/// Strip a single leading underscore added by the platform's C symbol mangling.
pub(crate) fn strip_underscore(name: &str) -> &str {
    name.strip_prefix('_').unwrap_or(name)
}
