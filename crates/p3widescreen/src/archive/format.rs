//! On-disk layout of Ascaron `.cpr` archives.
//!
//! ```text
//! 0x00  "ASCARON_ARCHIVE V0.9\0" (padded)
//! 0x20  header: [u32 length][4 reserved][u32 entry_count][i32 next_rel]
//!       entry_count * [u32 offset][u32 length][4 reserved][name\0]
//!       ...file data...
//!       next header at header_start + length + next_rel
//! ```
//!
//! All integers are little-endian.

use std::io::{self, BufRead, ErrorKind, Read};

use encoding_rs::{Encoding, WINDOWS_1252};

use crate::error::{Error, Result};

/// Archive signature, stored NUL-terminated at offset 0.
pub const SIGNATURE: &str = "ASCARON_ARCHIVE V0.9";

/// Offset of the first index header.
pub const FIRST_HEADER_OFFSET: u64 = 0x20;

/// Size of the fixed part of a header.
pub const HEADER_FIXED_SIZE: usize = 16;

/// Size of the fixed part of an index entry (name excluded).
pub const ENTRY_FIXED_SIZE: usize = 12;

/// Reserved field width in headers and entries.
pub const RESERVED_SIZE: usize = 4;

/// Encoding of entry names and text resources. At least one shipped file
/// name uses a non-ASCII Western European character.
pub static TEXT_ENCODING: &Encoding = WINDOWS_1252;

/// Read a little-endian u32, failing on any short read.
pub(crate) fn read_u32<R: Read>(reader: &mut R, offset: u64) -> Result<u32> {
    try_read_u32(reader, offset)?.ok_or(Error::Truncated {
        offset,
        expected: 4,
        actual: 0,
    })
}

/// Read a little-endian u32, returning `None` if the input is already at EOF.
///
/// A partial read is still an error.
pub(crate) fn try_read_u32<R: Read>(reader: &mut R, offset: u64) -> Result<Option<u32>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    match filled {
        0 => Ok(None),
        4 => Ok(Some(u32::from_le_bytes(buf))),
        actual => Err(Error::Truncated {
            offset,
            expected: 4,
            actual,
        }),
    }
}

pub(crate) fn skip_reserved<R: Read>(reader: &mut R, offset: u64) -> Result<()> {
    let mut buf = [0u8; RESERVED_SIZE];
    reader.read_exact(&mut buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => Error::Truncated {
            offset,
            expected: RESERVED_SIZE,
            actual: 0,
        },
        _ => e.into(),
    })
}

/// Read a NUL-terminated byte string, without the terminator.
pub(crate) fn read_cstring<R: BufRead>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.read_until(0, &mut bytes)?;
    if bytes.pop() != Some(0) {
        return Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            "unterminated string",
        ));
    }
    Ok(bytes)
}

pub fn decode_text(bytes: &[u8]) -> String {
    let (decoded, _) = TEXT_ENCODING.decode_without_bom_handling(bytes);
    decoded.into_owned()
}

/// Encode text back into the archive's single-byte encoding.
pub fn encode_text(text: &str) -> Result<Vec<u8>> {
    let (encoded, _, had_errors) = TEXT_ENCODING.encode(text);
    if had_errors {
        return Err(Error::EncodingError(format!(
            "text contains characters not representable in {}",
            TEXT_ENCODING.name()
        )));
    }
    Ok(encoded.into_owned())
}
