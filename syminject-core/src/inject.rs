use crate::binary::read_range;
use crate::{Binary, Error, ErrorKind, Result};
use byteorder::{ByteOrder, LE};
use std::io::{self, Read, Seek, SeekFrom, Write};

impl<R: Read + Seek> Binary<R> {
    /// Write a copy of the source to `out` with `symbol` holding `value` as a
    /// nul-padded string.
    ///
    /// The symbol must have room for `value` plus a terminating nul. If
    /// `expected_prior` is a non-empty string, the symbol's current contents
    /// must equal it (nul-padded the same way) or nothing is written.
    pub fn inject_string<W: Write>(
        &mut self,
        out: &mut W,
        symbol: &str,
        value: &str,
        expected_prior: Option<&str>,
    ) -> Result<()> {
        let resolved = self.find_symbol(symbol)?;

        if value.len() as u64 + 1 > resolved.size {
            return Err(Error::symbol(
                ErrorKind::ValueOverflowsCapacity,
                format!(
                    "value length {} overflows symbol {symbol:?} size {}",
                    value.len(),
                    resolved.size
                ),
            ));
        }

        if let Some(prior) = expected_prior.filter(|p| !p.is_empty()) {
            let existing = read_range(&mut self.source, resolved.offset, resolved.size)?;
            let expected = padded(prior, resolved.size);
            if existing != expected {
                return Err(Error::symbol(
                    ErrorKind::PriorValueMismatch,
                    format!(
                        "existing symbol contents {:?} did not match expected value {:?}",
                        String::from_utf8_lossy(&existing),
                        String::from_utf8_lossy(&expected)
                    ),
                ));
            }
        }

        log::info!("Injecting {value:?} into {symbol:?}");
        copy_and_inject(&mut self.source, out, resolved.offset, &padded(value, resolved.size))
    }

    /// Write a copy of the source to `out` with the 8-byte `symbol` set to
    /// `value` in little-endian order.
    pub fn inject_u64<W: Write>(&mut self, out: &mut W, symbol: &str, value: u64) -> Result<()> {
        let mut buf = [0u8; 8];
        LE::write_u64(&mut buf, value);
        self.inject_bytes(out, symbol, &buf).map_err(|e| match e.kind() {
            ErrorKind::TypeMismatch => Error::symbol(
                ErrorKind::TypeMismatch,
                format!("symbol {symbol:?} is not a uint64: {e}"),
            ),
            _ => e,
        })
    }

    /// Write a copy of the source to `out` with `symbol` replaced by `bytes`.
    ///
    /// `bytes` must be exactly as long as the symbol.
    pub fn inject_bytes<W: Write>(&mut self, out: &mut W, symbol: &str, bytes: &[u8]) -> Result<()> {
        let resolved = self.find_symbol(symbol)?;
        if resolved.size != bytes.len() as u64 {
            return Err(Error::symbol(
                ErrorKind::TypeMismatch,
                format!(
                    "symbol {symbol:?} is {} bytes long, value is {}",
                    resolved.size,
                    bytes.len()
                ),
            ));
        }
        log::info!("Injecting {} bytes into {symbol:?}", bytes.len());
        copy_and_inject(&mut self.source, out, resolved.offset, bytes)
    }
}

/// `value` followed by zeroes up to `size` bytes.
fn padded(value: &str, size: u64) -> Vec<u8> {
    let mut buf = vec![0u8; size as usize];
    let len = value.len().min(buf.len());
    buf[..len].copy_from_slice(&value.as_bytes()[..len]);
    buf
}

/// Stream `source` to `out`, replacing `replacement.len()` bytes at `offset`.
///
/// The output has exactly the source's length. A source too short to hold
/// the replaced range fails before anything is written.
pub fn copy_and_inject<R: Read + Seek, W: Write>(
    source: &mut R,
    out: &mut W,
    offset: u64,
    replacement: &[u8],
) -> Result<()> {
    let len = source.seek(SeekFrom::End(0))?;
    let end = offset
        .checked_add(replacement.len() as u64)
        .filter(|&end| end <= len)
        .ok_or_else(|| {
            Error::truncated(format!(
                "source is {len:#x} bytes, symbol range is {offset:#x}+{:#x}",
                replacement.len()
            ))
        })?;
    log::debug!("Replacing {:#x}..{end:#x} of {len:#x} bytes", offset);

    source.seek(SeekFrom::Start(0))?;
    copy_exact(source, out, offset)?;
    out.write_all(replacement)?;
    source.seek(SeekFrom::Start(end))?;
    copy_exact(source, out, len - end)?;
    out.flush()?;
    Ok(())
}

fn copy_exact<R: Read, W: Write>(source: &mut R, out: &mut W, len: u64) -> Result<()> {
    let copied = io::copy(&mut source.by_ref().take(len), out)?;
    if copied != len {
        return Err(Error::truncated(format!(
            "source ended after {copied} of {len} bytes"
        )));
    }
    Ok(())
}
