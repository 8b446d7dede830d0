//! Locate a named symbol inside an ELF, Mach-O or PE file and overwrite its
//! bytes in a copy of the file, without relinking.
//!
//! ```no_run
//! use syminject_core::Binary;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let input = std::fs::File::open("app")?;
//!     let mut output = std::fs::File::create("app.stamped")?;
//!     let mut binary = Binary::open(input)?;
//!     binary.inject_string(&mut output, "build_fingerprint", "release-42", None)?;
//!     Ok(())
//! }
//! ```

pub mod binary;
pub mod dump;
mod error;
pub mod formats;
pub mod inject;
pub mod resolve;
pub mod sections;
pub mod symbols;

pub use binary::*;
pub use dump::{dump_symbols, dump_symbols_with};
pub use error::{Error, ErrorKind, Result};
pub use formats::{default_readers, FormatReader};
pub use resolve::{ResolvedSymbol, MAX_INFERRED_SIZE};
pub use sections::*;
pub use symbols::*;
