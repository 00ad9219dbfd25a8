//! SN76489 (PSG) register state.
//!
//! The SN76489 uses a latch-based write interface:
//! - Latch byte (bit 7 = 1): bits 6-4 select the register, bits 3-0 carry
//!   the low nibble of its value.
//! - Data byte (bit 7 = 0): bits 5-0 carry the high bits of the latched
//!   register (for tone registers) or a full 4-bit value (volume, noise).
//!
//! Tone periods are 10 bits on the chip but are kept here as 8 bits with
//! the two least significant bits dropped, which is all the frame format
//! transmits. Attenuations are inverted on the way in (`15 - attenuation`)
//! so the stored volume grows with loudness and the playback driver can
//! use it directly.

/// Number of tone channels.
pub const TONE_CHANNELS: usize = 3;

/// Number of volume registers (three tone channels plus noise).
pub const VOLUME_CHANNELS: usize = 4;

/// Index of the noise channel's volume in [`Sn76489Registers::volume`].
pub const NOISE_VOLUME: usize = 3;

/// Attenuation value meaning "silent".
pub const MAX_ATTENUATION: u8 = 0x0F;

/// Logical PSG register state at one point in the stream.
///
/// All fields start at zero. The value is `Copy` so the encoder can keep
/// the previously emitted state next to the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Sn76489Registers {
    /// Tone periods, 10-bit hardware value shifted right by two.
    pub tone: [u8; TONE_CHANNELS],
    /// Noise control (4 bits: feedback mode and shift rate).
    pub noise: u8,
    /// Volumes as `15 - attenuation`; index 3 is the noise channel.
    pub volume: [u8; VOLUME_CHANNELS],
}

impl Sn76489Registers {
    /// Approximate 10-bit tone period recovered from the stored 8 bits.
    pub fn tone_period(&self, channel: usize) -> Option<u16> {
        self.tone.get(channel).map(|t| u16::from(*t) << 2)
    }

    /// Hardware attenuation (0 = loudest, 15 = silent) for a volume register.
    pub fn attenuation(&self, channel: usize) -> Option<u8> {
        self.volume
            .get(channel)
            .map(|v| MAX_ATTENUATION - (v & MAX_ATTENUATION))
    }

    /// Tone frequency in Hz for `channel` given the chip's master clock.
    ///
    /// Formula: f = master_clock / (32 * period). Returns `None` for a zero
    /// period or an invalid channel.
    pub fn tone_hz(&self, channel: usize, master_clock_hz: f32) -> Option<f32> {
        let period = self.tone_period(channel)?;
        if period == 0 {
            return None;
        }
        Some(master_clock_hz / (32.0f32 * f32::from(period)))
    }
}

/// Register targeted by the most recent latch byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Latch {
    /// Tone period of channel 0..=2.
    Tone(u8),
    /// Volume of channel 0..=3 (3 = noise).
    Volume(u8),
    /// Noise control.
    Noise,
}

impl Default for Latch {
    fn default() -> Self {
        Latch::Tone(0)
    }
}

impl Latch {
    /// Decode the 3-bit register selector (bits 6-4 of a latch byte).
    ///
    /// Selector layout: bit 0 chooses volume, bits 2-1 the channel; channel
    /// 3 without the volume bit is the noise control register.
    pub fn from_selector(selector: u8) -> Self {
        let selector = selector & 0x07;
        let channel = selector >> 1;
        match (selector & 0x01 != 0, channel) {
            (true, ch) => Latch::Volume(ch),
            (false, 3) => Latch::Noise,
            (false, ch) => Latch::Tone(ch),
        }
    }

    /// Inverse of [`Latch::from_selector`].
    pub fn selector(&self) -> u8 {
        match self {
            Latch::Tone(ch) => ch << 1,
            Latch::Volume(ch) => (ch << 1) | 0x01,
            Latch::Noise => 0x06,
        }
    }
}

/// SN76489 write decoder: register state plus the latch that links the
/// two halves of a split write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sn76489State {
    registers: Sn76489Registers,
    latch: Latch,
}

impl Sn76489State {
    /// Create a state with all registers zeroed and the latch on tone 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current register snapshot.
    pub fn registers(&self) -> &Sn76489Registers {
        &self.registers
    }

    /// Register the next data byte will be applied to.
    pub fn latch(&self) -> Latch {
        self.latch
    }

    /// Apply one byte written to the PSG port and return the register it
    /// touched.
    ///
    /// # Examples
    ///
    /// ```
    /// use psgframe::chip::{Latch, Sn76489State};
    ///
    /// let mut psg = Sn76489State::new();
    /// psg.write(0x85); // latch tone 0, low nibble 0x5
    /// psg.write(0x30); // high six bits 0x30
    /// // period 0x305 stored without its two low bits
    /// assert_eq!(psg.registers().tone[0], 0xC1);
    /// assert_eq!(psg.latch(), Latch::Tone(0));
    /// ```
    pub fn write(&mut self, value: u8) -> Latch {
        let low = value & 0x0F;
        if value & 0x80 != 0 {
            self.latch = Latch::from_selector(value >> 4);
            match self.latch {
                Latch::Tone(ch) => {
                    let tone = &mut self.registers.tone[usize::from(ch)];
                    *tone = (*tone & 0xFC) | (low >> 2);
                }
                Latch::Volume(ch) => self.set_volume(ch, low),
                Latch::Noise => self.registers.noise = low,
            }
        } else {
            match self.latch {
                Latch::Tone(ch) => {
                    let tone = &mut self.registers.tone[usize::from(ch)];
                    *tone = (*tone & 0x03) | ((value & 0x3F) << 2);
                }
                Latch::Volume(ch) => self.set_volume(ch, low),
                Latch::Noise => self.registers.noise = low,
            }
        }
        self.latch
    }

    fn set_volume(&mut self, channel: u8, attenuation: u8) {
        self.registers.volume[usize::from(channel)] = MAX_ATTENUATION - attenuation;
    }
}
