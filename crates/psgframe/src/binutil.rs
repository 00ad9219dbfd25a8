//! Utilities used by the parsers: parse error type and bounds-checked byte readers.
use std::fmt;

/// Error type returned by the parsing helpers and the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An attempted read was outside the available range.
    ///
    /// - `offset` is the index that was attempted to be accessed.
    /// - `needed` is the number of bytes required for the operation.
    /// - `available` is the length of the readable range.
    /// - `context` is an optional string describing the logical location
    ///   (for example `"data_offset"` or `"frame payload"`) where the access
    ///   was attempted.
    OffsetOutOfRange {
        offset: usize,
        needed: usize,
        available: usize,
        context: Option<String>,
    },

    /// The four-byte file identifier did not match `"Vgm "`.
    ///
    /// The contained array is the raw 4 bytes that were read.
    InvalidIdent([u8; 4]),

    /// A header was shorter than the minimum required length.
    HeaderTooShort(String),

    /// An opcode byte was not recognized and the caller asked for
    /// unknown opcodes to be treated as fatal.
    UnknownOpcode { opcode: u8, offset: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::OffsetOutOfRange {
                offset,
                needed,
                available,
                context,
            } => {
                if let Some(ctx) = context {
                    write!(
                        f,
                        "offset out of range at {}: 0x{:X} (needed {} bytes, available {})",
                        ctx, offset, needed, available
                    )
                } else {
                    write!(
                        f,
                        "offset out of range: 0x{:X} (needed {} bytes, available {})",
                        offset, needed, available
                    )
                }
            }
            ParseError::InvalidIdent(id) => write!(f, "invalid ident: {:?}", id),
            ParseError::HeaderTooShort(name) => write!(f, "header too short: {}", name),
            ParseError::UnknownOpcode { opcode, offset } => {
                write!(
                    f,
                    "unknown opcode 0x{:02X} at offset 0x{:X}",
                    opcode, offset
                )
            }
        }
    }
}

impl std::error::Error for ParseError {}

fn out_of_range(off: usize, needed: usize, end: usize) -> ParseError {
    ParseError::OffsetOutOfRange {
        offset: off,
        needed,
        available: end,
        context: None,
    }
}

/// Read a 32-bit little-endian unsigned integer from `bytes` at `off`.
///
/// Returns `Err(ParseError::OffsetOutOfRange)` when the buffer is too short.
pub fn read_u32_le_at(bytes: &[u8], off: usize) -> Result<u32, ParseError> {
    let s = read_slice(bytes, off, 4)?;
    let mut tmp: [u8; 4] = [0; 4];
    tmp.copy_from_slice(s);
    Ok(u32::from_le_bytes(tmp))
}

/// Read a 16-bit little-endian unsigned integer from `bytes` at `off`,
/// refusing to read at or past `end`.
///
/// `end` is the exclusive upper bound of the readable region; it is clamped
/// to the buffer length so a bogus bound can never cause an out-of-bounds
/// slice access.
pub fn read_u16_le_bounded(bytes: &[u8], off: usize, end: usize) -> Result<u16, ParseError> {
    let end = end.min(bytes.len());
    if off.checked_add(2).is_none_or(|last| last > end) {
        return Err(out_of_range(off, 2, end));
    }
    Ok(u16::from_le_bytes([bytes[off], bytes[off + 1]]))
}

/// Read a single byte from `bytes` at `off`, refusing to read at or past `end`.
pub fn read_u8_bounded(bytes: &[u8], off: usize, end: usize) -> Result<u8, ParseError> {
    let end = end.min(bytes.len());
    if off >= end {
        return Err(out_of_range(off, 1, end));
    }
    Ok(bytes[off])
}

/// Read a single byte from `bytes` at `off`.
pub fn read_u8_at(bytes: &[u8], off: usize) -> Result<u8, ParseError> {
    read_u8_bounded(bytes, off, bytes.len())
}

/// Return a borrowed slice of length `len` starting at `off` from `bytes`.
///
/// Returns `Err(ParseError::OffsetOutOfRange)` when the requested range
/// exceeds the available buffer.
pub fn read_slice(bytes: &[u8], off: usize, len: usize) -> Result<&[u8], ParseError> {
    match off.checked_add(len) {
        Some(last) if last <= bytes.len() => Ok(&bytes[off..last]),
        _ => Err(ParseError::OffsetOutOfRange {
            offset: off,
            needed: len,
            // Report the remaining number of bytes from `off` to the end of the buffer.
            available: bytes.len().saturating_sub(off),
            context: Some("read_slice".into()),
        }),
    }
}
