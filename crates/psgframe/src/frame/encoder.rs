//! Frame encoder: turns register deltas and pending delay into frames.
use std::fmt;

use log::trace;

use super::buffer::{CapacityExceeded, OutputBuffer};
use super::{FrameFlags, FrameHeader, MAX_FRAME_LEN, MAX_FRAME_TICKS};
use crate::chip::{NOISE_VOLUME, Sn76489Registers, TONE_CHANNELS};

/// What one [`FrameEncoder::encode`] call appended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOutcome {
    /// Frames written, including continuation frames.
    pub frames: usize,
    /// Pure delay frames written after the first frame.
    pub continuation_frames: usize,
    /// Payload bytes written (excluding headers).
    pub payload_bytes: usize,
    /// Ticks represented by the written frames.
    pub ticks: u64,
}

/// Returned when the output capacity stopped [`FrameEncoder::encode`].
///
/// `written` describes the frames that were committed before the one that
/// did not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Truncated {
    pub written: EncodeOutcome,
    pub cause: CapacityExceeded,
}

impl fmt::Display for Truncated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} after {} frame(s)", self.cause, self.written.frames)
    }
}

impl std::error::Error for Truncated {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// Stateful encoder holding the last emitted register state.
///
/// The previous state starts zeroed, so the first frame transmits every
/// register that differs from zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameEncoder {
    previous: Sn76489Registers,
    tick_samples: u32,
}

impl FrameEncoder {
    /// Create an encoder for ticks of `tick_samples` samples each.
    ///
    /// A zero tick length is treated as one sample.
    pub fn new(tick_samples: u32) -> Self {
        Self {
            previous: Sn76489Registers::default(),
            tick_samples: tick_samples.max(1),
        }
    }

    /// Register state as of the last committed frame.
    pub fn previous(&self) -> &Sn76489Registers {
        &self.previous
    }

    pub fn tick_samples(&self) -> u32 {
        self.tick_samples
    }

    /// Whole ticks contained in `samples`.
    pub fn whole_ticks(&self, samples: u64) -> u64 {
        samples / u64::from(self.tick_samples)
    }

    /// Build the delta frame for `current` against the previous state.
    ///
    /// Returns the frame bytes and their length. Does not change the
    /// encoder.
    pub fn build_frame(
        &self,
        current: &Sn76489Registers,
        delay: u8,
    ) -> ([u8; MAX_FRAME_LEN], usize) {
        let prev = &self.previous;
        let mut frame = [0u8; MAX_FRAME_LEN];
        let mut flags = FrameFlags::empty();
        let mut len = 1;

        for ch in 0..TONE_CHANNELS {
            if current.tone[ch] != prev.tone[ch] {
                flags |= FrameFlags::tone(ch);
                frame[len] = current.tone[ch];
                len += 1;
            }
        }

        if current.noise != prev.noise {
            flags |= FrameFlags::NOISE;
            frame[len] = current.noise;
            len += 1;
        }

        // Volumes travel in pairs; a change to either half resends both.
        if current.volume[0] != prev.volume[0] || current.volume[1] != prev.volume[1] {
            flags |= FrameFlags::VOLUME_0_1;
            frame[len] = pack_volumes(current.volume[0], current.volume[1]);
            len += 1;
        }

        if current.volume[2] != prev.volume[2]
            || current.volume[NOISE_VOLUME] != prev.volume[NOISE_VOLUME]
        {
            flags |= FrameFlags::VOLUME_2_N;
            frame[len] = pack_volumes(current.volume[2], current.volume[NOISE_VOLUME]);
            len += 1;
        }

        frame[0] = FrameHeader::new(flags, delay).to_byte();
        (frame, len)
    }

    /// Flush `current` and the whole ticks in `pending_samples` into `out`.
    ///
    /// The first frame carries the register delta and up to three ticks;
    /// remaining ticks are written as one-byte delay frames of at most
    /// three ticks each. `pending_samples` is decreased by every tick that
    /// was committed, so on success it holds the sub-tick remainder and on
    /// error it still accounts for the ticks that were not written.
    ///
    /// Frames are committed one at a time: on [`Truncated`] the buffer ends
    /// on the last frame that fit. The previous state only advances
    /// once the delta frame itself has been committed.
    pub fn encode(
        &mut self,
        current: &Sn76489Registers,
        pending_samples: &mut u64,
        out: &mut OutputBuffer,
    ) -> Result<EncodeOutcome, Truncated> {
        let mut outcome = EncodeOutcome::default();
        match self.encode_into(current, pending_samples, out, &mut outcome) {
            Ok(()) => Ok(outcome),
            Err(cause) => Err(Truncated {
                written: outcome,
                cause,
            }),
        }
    }

    fn encode_into(
        &mut self,
        current: &Sn76489Registers,
        pending_samples: &mut u64,
        out: &mut OutputBuffer,
        outcome: &mut EncodeOutcome,
    ) -> Result<(), CapacityExceeded> {
        let tick = u64::from(self.tick_samples);
        let mut ticks = *pending_samples / tick;

        let first = ticks.min(u64::from(MAX_FRAME_TICKS));
        let (frame, len) = self.build_frame(current, first as u8);
        out.push_frame(&frame[..len])?;
        trace!("frame {:02X?}", &frame[..len]);

        self.previous = *current;
        ticks -= first;
        *pending_samples -= first * tick;
        outcome.frames = 1;
        outcome.payload_bytes = len - 1;
        outcome.ticks = first;

        while ticks != 0 {
            let n = ticks.min(u64::from(MAX_FRAME_TICKS));
            let header = FrameHeader::delay_only(n as u8);
            out.push_frame(&[header.to_byte()])?;
            trace!("delay frame {:02X}", header.to_byte());

            ticks -= n;
            *pending_samples -= n * tick;
            outcome.frames += 1;
            outcome.continuation_frames += 1;
            outcome.ticks += n;
        }

        Ok(())
    }
}

fn pack_volumes(low: u8, high: u8) -> u8 {
    (low & 0x0F) | ((high & 0x0F) << 4)
}
