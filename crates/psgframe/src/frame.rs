//! Delta-frame format.
//!
//! Every frame is one header byte followed by 0..=6 payload bytes:
//!
//! ```text
//!  bit  7 6 | 5 4 | 3 2 1 0
//!       d d | v v | n t t t
//! ```
//!
//! - `ttt`: tone 0/1/2 byte follows (bit 0 = tone 0)
//! - `n`:   noise byte follows
//! - `vv`:  bit 4 = tone 0/1 volume byte follows, bit 5 = tone 2/noise
//!   volume byte follows
//! - `dd`:  0..=3 ticks to wait after this frame
//!
//! Payload bytes appear in the order tone0, tone1, tone2, noise,
//! `vol0 | vol1 << 4`, `vol2 | vol3 << 4`. A header with no change flags is
//! a pure delay frame; the encoder uses those to spell out waits longer
//! than three ticks.
use bitflags::bitflags;

mod buffer;
mod encoder;
mod reader;

pub use buffer::{CapacityExceeded, OutputBuffer};
pub use encoder::{EncodeOutcome, FrameEncoder, Truncated};
pub use reader::{DecodedFrame, FrameReader, replay};

/// Largest delay a single frame header can carry.
pub const MAX_FRAME_TICKS: u8 = 3;

/// Header plus every possible payload byte.
pub const MAX_FRAME_LEN: usize = 7;

const DELAY_SHIFT: u8 = 6;

bitflags! {
    /// Change flags in the low six bits of a frame header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FrameFlags: u8 {
        /// Tone 0 byte follows
        const TONE_0 = 0x01;
        /// Tone 1 byte follows
        const TONE_1 = 0x02;
        /// Tone 2 byte follows
        const TONE_2 = 0x04;
        /// Noise byte follows
        const NOISE = 0x08;
        /// Packed tone 0 / tone 1 volume byte follows
        const VOLUME_0_1 = 0x10;
        /// Packed tone 2 / noise volume byte follows
        const VOLUME_2_N = 0x20;
    }
}

impl FrameFlags {
    /// Flag for a tone channel (0..=2).
    pub fn tone(channel: usize) -> Self {
        match channel {
            0 => FrameFlags::TONE_0,
            1 => FrameFlags::TONE_1,
            2 => FrameFlags::TONE_2,
            _ => FrameFlags::empty(),
        }
    }

    /// Number of payload bytes that follow a header with these flags.
    pub fn payload_len(&self) -> usize {
        self.bits().count_ones() as usize
    }
}

/// A decoded frame header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    pub flags: FrameFlags,
    /// Ticks to wait after the frame, 0..=3.
    pub delay: u8,
}

impl FrameHeader {
    /// Build a header; `delay` is clamped to [`MAX_FRAME_TICKS`].
    pub fn new(flags: FrameFlags, delay: u8) -> Self {
        Self {
            flags,
            delay: delay.min(MAX_FRAME_TICKS),
        }
    }

    /// Header of a pure delay frame.
    pub fn delay_only(delay: u8) -> Self {
        Self::new(FrameFlags::empty(), delay)
    }

    /// `true` when the frame carries no register payload.
    pub fn is_delay_only(&self) -> bool {
        self.flags.is_empty()
    }

    /// Encoded header byte.
    pub fn to_byte(&self) -> u8 {
        (self.delay << DELAY_SHIFT) | self.flags.bits()
    }
}

impl From<u8> for FrameHeader {
    fn from(byte: u8) -> Self {
        Self {
            flags: FrameFlags::from_bits_truncate(byte),
            delay: byte >> DELAY_SHIFT,
        }
    }
}

impl From<FrameHeader> for u8 {
    fn from(header: FrameHeader) -> Self {
        header.to_byte()
    }
}
