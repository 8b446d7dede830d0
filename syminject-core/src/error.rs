use std::{error, fmt, io};

/// An error that occurred while reading or patching a binary.
#[derive(Debug)]
pub struct Error {
    inner: ErrorInner,
}

#[derive(Debug)]
enum ErrorInner {
    Io(io::Error),
    Format {
        format: &'static str,
        message: String,
    },
    Malformed {
        format: &'static str,
        message: String,
    },
    Symbol {
        kind: ErrorKind,
        message: String,
    },
}

/// The kind of error.
///
/// Every kind is terminal for the requested operation. The dispatcher only
/// looks past [`ErrorKind::FormatNotRecognized`]; everything else stops it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input is not a file of the format a reader handles.
    FormatNotRecognized,
    /// The format matched but its structure is inconsistent.
    MalformedContainer,
    /// No symbol with the requested name exists.
    SymbolNotFound,
    /// The inferred size of an unsized symbol is zero, negative or too large.
    ImplausibleSymbolSize,
    /// A string value does not fit in the symbol with a terminating nul.
    ValueOverflowsCapacity,
    /// The symbol size does not match the value being injected.
    TypeMismatch,
    /// The symbol's current bytes differ from the expected prior value.
    PriorValueMismatch,
    /// The source ended before the expected number of bytes were copied.
    UnexpectedTruncation,
    /// An I/O error occurred on the source or the output.
    Io(io::ErrorKind),
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            ErrorInner::Io(e) => e.fmt(f),
            ErrorInner::Format { format, message } => {
                write!(f, "not a valid {format} file: {message}")
            }
            ErrorInner::Malformed { format, message } => {
                write!(f, "malformed {format} file: {message}")
            }
            ErrorInner::Symbol { message, .. } => f.write_str(message),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.inner {
            ErrorInner::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::io(error)
    }
}

impl Error {
    /// Get the kind of error.
    pub fn kind(&self) -> ErrorKind {
        match &self.inner {
            ErrorInner::Io(e) => ErrorKind::Io(e.kind()),
            ErrorInner::Format { .. } => ErrorKind::FormatNotRecognized,
            ErrorInner::Malformed { .. } => ErrorKind::MalformedContainer,
            ErrorInner::Symbol { kind, .. } => *kind,
        }
    }

    /// The container format named by a format error, if any.
    pub fn format(&self) -> Option<&'static str> {
        match &self.inner {
            ErrorInner::Format { format, .. } | ErrorInner::Malformed { format, .. } => {
                Some(format)
            }
            _ => None,
        }
    }

    pub(crate) fn io(error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            return Self::truncated(error.to_string());
        }
        Self {
            inner: ErrorInner::Io(error),
        }
    }

    pub(crate) fn not_recognized(format: &'static str, message: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::Format {
                format,
                message: message.into(),
            },
        }
    }

    pub(crate) fn malformed(format: &'static str, message: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::Malformed {
                format,
                message: message.into(),
            },
        }
    }

    /// Map a goblin parse failure for a file whose magic already matched.
    pub(crate) fn goblin(format: &'static str, error: goblin::error::Error) -> Self {
        match error {
            goblin::error::Error::BadMagic(magic) => {
                Self::not_recognized(format, format!("bad magic {magic:#x}"))
            }
            goblin::error::Error::IO(e) => Self::io(e),
            other => Self::malformed(format, other.to_string()),
        }
    }

    pub(crate) fn not_found(symbol: &str) -> Self {
        Self::symbol(ErrorKind::SymbolNotFound, format!("symbol {symbol:?} not found"))
    }

    pub(crate) fn truncated(message: impl Into<String>) -> Self {
        Self::symbol(ErrorKind::UnexpectedTruncation, message)
    }

    pub(crate) fn symbol(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            inner: ErrorInner::Symbol {
                kind,
                message: message.into(),
            },
        }
    }
}

/// The `Result` type for this library.
pub type Result<T> = std::result::Result<T, Error>;
