//! Playback-side frame decoder.
//!
//! Mirrors what a driver does with the encoded buffer: read a header, apply
//! the payload bytes it announces to a register image, then wait the
//! header's tick count.
use super::{FrameFlags, FrameHeader};
use crate::binutil::{ParseError, read_u8_at};
use crate::chip::{NOISE_VOLUME, Sn76489Registers, TONE_CHANNELS};

/// One frame as seen by the playback driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Offset of the header byte in the encoded buffer.
    pub offset: usize,
    pub header: FrameHeader,
    /// Register image after applying this frame.
    pub registers: Sn76489Registers,
}

/// Iterator over the frames of an encoded buffer.
///
/// Yields `Err(ParseError::OffsetOutOfRange)` once if the last frame's
/// payload is cut short, then stops.
#[derive(Debug, Clone)]
pub struct FrameReader<'a> {
    bytes: &'a [u8],
    off: usize,
    registers: Sn76489Registers,
    failed: bool,
}

impl<'a> FrameReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            off: 0,
            registers: Sn76489Registers::default(),
            failed: false,
        }
    }

    /// Register image after the frames read so far.
    pub fn registers(&self) -> &Sn76489Registers {
        &self.registers
    }

    fn next_payload(&mut self) -> Result<u8, ParseError> {
        let b = read_u8_at(self.bytes, self.off).map_err(|_| ParseError::OffsetOutOfRange {
            offset: self.off,
            needed: 1,
            available: self.bytes.len(),
            context: Some("frame payload".into()),
        })?;
        self.off += 1;
        Ok(b)
    }

    fn read_frame(&mut self) -> Result<DecodedFrame, ParseError> {
        let offset = self.off;
        let header = FrameHeader::from(read_u8_at(self.bytes, self.off)?);
        self.off += 1;

        // Work on a copy so a truncated frame leaves the image untouched.
        let mut regs = self.registers;
        for ch in 0..TONE_CHANNELS {
            if header.flags.contains(FrameFlags::tone(ch)) {
                regs.tone[ch] = self.next_payload()?;
            }
        }
        if header.flags.contains(FrameFlags::NOISE) {
            regs.noise = self.next_payload()?;
        }
        if header.flags.contains(FrameFlags::VOLUME_0_1) {
            let b = self.next_payload()?;
            regs.volume[0] = b & 0x0F;
            regs.volume[1] = b >> 4;
        }
        if header.flags.contains(FrameFlags::VOLUME_2_N) {
            let b = self.next_payload()?;
            regs.volume[2] = b & 0x0F;
            regs.volume[NOISE_VOLUME] = b >> 4;
        }

        self.registers = regs;
        Ok(DecodedFrame {
            offset,
            header,
            registers: regs,
        })
    }
}

impl Iterator for FrameReader<'_> {
    type Item = Result<DecodedFrame, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.off >= self.bytes.len() {
            return None;
        }
        let frame = self.read_frame();
        if frame.is_err() {
            self.failed = true;
        }
        Some(frame)
    }
}

/// Replay a whole encoded buffer and return the final register image and
/// the total number of ticks it waits.
pub fn replay(bytes: &[u8]) -> Result<(Sn76489Registers, u64), ParseError> {
    let mut reader = FrameReader::new(bytes);
    let mut ticks = 0u64;
    for frame in &mut reader {
        ticks += u64::from(frame?.header.delay);
    }
    Ok((*reader.registers(), ticks))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_payload_in_flag_order() {
        let bytes = [0x40 | 0x3D, 0x11, 0x33, 0x04, 0x0F, 0x80, 0xC0];
        let frames: Vec<DecodedFrame> = FrameReader::new(&bytes).map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].header.delay, 1);
        assert_eq!(
            frames[0].registers,
            Sn76489Registers {
                tone: [0x11, 0x00, 0x33],
                noise: 0x04,
                volume: [0x0F, 0x00, 0x00, 0x08],
            }
        );
        assert_eq!(frames[1].offset, 6);
        assert!(frames[1].header.is_delay_only());
        assert_eq!(replay(&bytes).unwrap().1, 4);
    }

    #[test]
    fn truncated_frame_is_an_error() {
        let bytes = [0x00, 0x03, 0x11];
        let mut reader = FrameReader::new(&bytes);
        assert!(reader.next().unwrap().is_ok());
        match reader.next() {
            Some(Err(ParseError::OffsetOutOfRange { offset, .. })) => assert_eq!(offset, 3),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(reader.next().is_none());
        assert!(replay(&bytes).is_err());
    }
}
