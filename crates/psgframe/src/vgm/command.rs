//! Classified VGM commands relevant to an SN76489 stream.

/// VGM opcodes understood by the parser.
pub mod opcode {
    /// Game Gear PSG stereo mask, one operand byte.
    pub const GAME_GEAR_STEREO: u8 = 0x4F;
    /// SN76489 register write, one operand byte.
    pub const PSG_WRITE: u8 = 0x50;
    /// Wait n samples, u16 little-endian operand.
    pub const WAIT_SAMPLES: u8 = 0x61;
    /// Wait 735 samples (1/60 s).
    pub const WAIT_735: u8 = 0x62;
    /// Wait 882 samples (1/50 s).
    pub const WAIT_882: u8 = 0x63;
    /// End of sound data.
    pub const END_OF_DATA: u8 = 0x66;
    /// First of the 0x70..=0x7F "wait n+1 samples" family.
    pub const WAIT_N_FIRST: u8 = 0x70;
    /// Last of the 0x70..=0x7F "wait n+1 samples" family.
    pub const WAIT_N_LAST: u8 = 0x7F;
}

/// Samples in one 1/60 s wait at the 44100 Hz VGM reference rate.
pub const SAMPLES_60HZ: u32 = 735;
/// Samples in one 1/50 s wait at the 44100 Hz VGM reference rate.
pub const SAMPLES_50HZ: u32 = 882;

/// A single command decoded from the VGM command stream.
///
/// The parser produces exactly one variant per opcode; every opcode it does
/// not model becomes [`Command::Unknown`] so the caller decides how to
/// resynchronize instead of the parser guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `0x50 dd`: write `dd` to the PSG.
    PsgWrite(u8),
    /// `0x4F dd`: Game Gear stereo mask. Carries no register state for
    /// the frame format and is skipped.
    GameGearStereo(u8),
    /// `0x61 nn nn`: wait an explicit number of samples.
    WaitSamples(u16),
    /// `0x62`: wait 1/60 s.
    Wait735Samples,
    /// `0x63`: wait 1/50 s.
    Wait882Samples,
    /// `0x7n`: wait `n + 1` samples. The stored value is the sample count
    /// (1..=16), not the low nibble.
    WaitNSample(u8),
    /// `0x66`: end of sound data.
    EndOfData,
    /// Any opcode the parser does not model. `offset` is the absolute
    /// position of the opcode byte.
    Unknown { opcode: u8, offset: usize },
}

impl Command {
    /// Number of samples this command waits, or `None` for non-wait commands.
    pub fn wait_samples(&self) -> Option<u32> {
        match self {
            Command::WaitSamples(n) => Some(u32::from(*n)),
            Command::Wait735Samples => Some(SAMPLES_60HZ),
            Command::Wait882Samples => Some(SAMPLES_50HZ),
            Command::WaitNSample(n) => Some(u32::from(*n)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_samples_per_variant() {
        assert_eq!(Command::WaitSamples(1234).wait_samples(), Some(1234));
        assert_eq!(Command::Wait735Samples.wait_samples(), Some(735));
        assert_eq!(Command::Wait882Samples.wait_samples(), Some(882));
        assert_eq!(Command::WaitNSample(16).wait_samples(), Some(16));
        assert_eq!(Command::PsgWrite(0x9F).wait_samples(), None);
        assert_eq!(Command::EndOfData.wait_samples(), None);
    }
}
