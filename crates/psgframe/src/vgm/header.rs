//! VGM header fields used to locate and describe the command stream.
use crate::binutil::{ParseError, read_slice, read_u8_at, read_u16_le_bounded, read_u32_le_at};

/// Ident bytes every VGM file starts with.
pub const VGM_IDENT: &[u8; 4] = b"Vgm ";

/// Command data start used when the header's `data_offset` field is zero.
pub const DEFAULT_DATA_START: usize = 0x40;

/// Relative offsets in the VGM header are counted from these positions.
const EOF_OFFSET_BASE: usize = 0x04;
const GD3_OFFSET_BASE: usize = 0x14;
const DATA_OFFSET_BASE: usize = 0x34;

/// Smallest buffer that still contains the `data_offset` field.
const MIN_HEADER_SIZE: usize = DATA_OFFSET_BASE + 4;

/// The subset of the VGM header an SN76489 conversion cares about.
///
/// Offsets are stored exactly as they appear in the file (relative to
/// their own field position); use [`VgmHeader::data_start`] and
/// [`VgmHeader::data_end`] to get absolute positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VgmHeader {
    pub ident: [u8; 4],
    pub eof_offset: u32,
    pub version: u32,
    pub sn76489_clock: u32,
    pub gd3_offset: u32,
    pub total_samples: u32,
    pub loop_offset: u32,
    pub loop_samples: u32,
    pub sample_rate: u32,
    pub sn_fb: u16,
    pub snw: u8,
    pub data_offset: u32,
}

impl VgmHeader {
    /// Absolute position of the first command byte.
    ///
    /// A zero `data_offset` means the file predates the field (VGM < 1.50)
    /// and commands start at the fixed position 0x40.
    pub fn data_start(&self) -> usize {
        if self.data_offset == 0 {
            DEFAULT_DATA_START
        } else {
            DATA_OFFSET_BASE.saturating_add(self.data_offset as usize)
        }
    }

    /// Exclusive bound of the command stream inside a buffer of `len` bytes.
    ///
    /// The bound is the buffer length, narrowed by the EOF offset and by the
    /// start of the GD3 tag when those fields are set and point inside the
    /// buffer after the command data start.
    pub fn data_end(&self, len: usize) -> usize {
        let mut end = len;
        if self.eof_offset != 0 {
            end = end.min(EOF_OFFSET_BASE.saturating_add(self.eof_offset as usize));
        }
        if self.gd3_offset != 0 {
            let gd3_start = GD3_OFFSET_BASE.saturating_add(self.gd3_offset as usize);
            if gd3_start > self.data_start() {
                end = end.min(gd3_start);
            }
        }
        end
    }

    /// Version in the usual dotted form, e.g. `0x00000150` → `"1.50"`.
    pub fn version_string(&self) -> String {
        format!("{:x}.{:02x}", self.version >> 8, self.version & 0xFF)
    }
}

/// Attempt to convert a raw VGM byte slice into a `VgmHeader`.
impl TryFrom<&[u8]> for VgmHeader {
    type Error = ParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        parse_vgm_header(bytes)
    }
}

/// Parse the VGM header at the start of `bytes`.
///
/// Verifies the `"Vgm "` ident and reads the fixed fields up to and
/// including `data_offset` (0x34). VGM files older than 1.50 carry zero in
/// that position, which [`VgmHeader::data_start`] maps to 0x40.
pub fn parse_vgm_header(bytes: &[u8]) -> Result<VgmHeader, ParseError> {
    if bytes.len() < MIN_HEADER_SIZE {
        return Err(ParseError::HeaderTooShort(format!(
            "vgm: base header (0x{:02X})",
            MIN_HEADER_SIZE
        )));
    }

    let ident_slice = read_slice(bytes, 0x00, 4)?;
    let mut ident: [u8; 4] = [0; 4];
    ident.copy_from_slice(ident_slice);
    if &ident != VGM_IDENT {
        return Err(ParseError::InvalidIdent(ident));
    }

    Ok(VgmHeader {
        ident,
        eof_offset: read_u32_le_at(bytes, 0x04)?,
        version: read_u32_le_at(bytes, 0x08)?,
        sn76489_clock: read_u32_le_at(bytes, 0x0C)?,
        gd3_offset: read_u32_le_at(bytes, 0x14)?,
        total_samples: read_u32_le_at(bytes, 0x18)?,
        loop_offset: read_u32_le_at(bytes, 0x1C)?,
        loop_samples: read_u32_le_at(bytes, 0x20)?,
        sample_rate: read_u32_le_at(bytes, 0x24)?,
        sn_fb: read_u16_le_bounded(bytes, 0x28, bytes.len())?,
        snw: read_u8_at(bytes, 0x2A)?,
        data_offset: read_u32_le_at(bytes, DATA_OFFSET_BASE)?,
    })
}
