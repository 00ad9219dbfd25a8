// Register decoding and delta coding as seen through the frame reader.
use psgframe::chip::Sn76489Registers;
use psgframe::frame::{FrameFlags, FrameReader, replay};

use super::convert_default;

/// Independent model of the PSG: full 10-bit periods and raw attenuations.
struct Model {
    period: [u16; 3],
    attenuation: [u8; 4],
    noise: u8,
    latch: u8,
}

impl Default for Model {
    fn default() -> Self {
        // silent until written
        Self {
            period: [0; 3],
            attenuation: [15; 4],
            noise: 0,
            latch: 0,
        }
    }
}

impl Model {
    fn write(&mut self, value: u8) {
        if value & 0x80 != 0 {
            self.latch = (value >> 4) & 0x07;
            self.apply(value & 0x0F, true);
        } else {
            self.apply(value, false);
        }
    }

    fn apply(&mut self, data: u8, is_latch: bool) {
        match self.latch {
            0 | 2 | 4 => {
                let p = &mut self.period[usize::from(self.latch >> 1)];
                if is_latch {
                    *p = (*p & 0x3F0) | u16::from(data);
                } else {
                    *p = (*p & 0x00F) | (u16::from(data & 0x3F) << 4);
                }
            }
            6 => self.noise = data & 0x0F,
            sel => self.attenuation[usize::from(sel >> 1)] = data & 0x0F,
        }
    }

    fn expected(&self) -> Sn76489Registers {
        Sn76489Registers {
            tone: self.period.map(|p| (p >> 2) as u8),
            noise: self.noise,
            volume: self.attenuation.map(|a| 15 - a),
        }
    }
}

#[test]
fn latch_low_nibble_then_data_high_bits() {
    let conv = convert_default(&[0x50, 0x85, 0x50, 0x30, 0x66]);
    // period (0x30 << 4) | 0x5 = 0x305, sent without its two low bits
    assert_eq!(conv.registers.tone[0], 0xC1);
    assert_eq!(conv.output, vec![0x01, 0xC1]);
}

#[test]
fn unchanged_state_sends_no_payload() {
    let conv = convert_default(&[
        0x50, 0x90, 0x62, //
        0x50, 0x90, 0x62, //
        0x50, 0x90, 0x66,
    ]);
    assert_eq!(conv.output, vec![0x50, 0x0F, 0x40, 0x00]);
    let frames: Vec<_> = FrameReader::new(&conv.output).map(|f| f.unwrap()).collect();
    assert!(frames[1].header.is_delay_only());
    assert!(frames[2].header.is_delay_only());
}

#[test]
fn volume_pair_carries_both_halves() {
    let conv = convert_default(&[
        0x50, 0x90, 0x50, 0xB5, 0x62, // vol0 = 15, vol1 = 10
        0x50, 0xB6, 0x66, // vol1 = 9
    ]);
    assert_eq!(conv.output, vec![0x50, 0xAF, 0x10, 0x9F]);
}

#[test]
fn noise_and_noise_volume() {
    let conv = convert_default(&[0x50, 0xE4, 0x50, 0xF0, 0x66]);
    let flags = FrameFlags::NOISE | FrameFlags::VOLUME_2_N;
    assert_eq!(conv.output, vec![flags.bits(), 0x04, 0xF0]);
}

#[test]
fn writing_zero_is_not_a_change() {
    let conv = convert_default(&[0x50, 0x80, 0x50, 0x00, 0x66]);
    assert_eq!(conv.output, vec![0x00]);
}

#[test]
fn game_gear_stereo_is_ignored() {
    let conv = convert_default(&[0x4F, 0xFF, 0x50, 0x90, 0x66]);
    assert_eq!(conv.output, vec![0x10, 0x0F]);
    assert_eq!(conv.stats.skipped_bytes, 1);
}

#[test]
fn replay_recovers_written_registers() {
    for seed in 1..=50u32 {
        let mut state = seed;
        let mut model = Model::default();
        let mut commands = Vec::new();
        for _ in 0..64 {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let value = (state >> 24) as u8;
            model.write(value);
            commands.extend_from_slice(&[0x50, value]);
        }
        commands.push(0x66);

        let conv = convert_default(&commands);
        let (registers, ticks) = replay(&conv.output).unwrap();
        assert_eq!(ticks, 0);
        assert_eq!(registers, model.expected(), "seed {}", seed);
        assert_eq!(registers, conv.registers, "seed {}", seed);
    }
}

#[test]
fn replay_tracks_state_across_frames() {
    // one register change per tick
    let conv = convert_default(&[
        0x50, 0x8A, 0x50, 0x12, 0x62, // tone 0 = 0x12A
        0x50, 0xA3, 0x50, 0x07, 0x62, // tone 1 = 0x073
        0x50, 0xD0, 0x62, // vol 2 = 15
        0x50, 0x9F, 0x66, // vol 0 = 0
    ]);
    let frames: Vec<_> = FrameReader::new(&conv.output).map(|f| f.unwrap()).collect();
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[0].registers.tone[0], (0x12Au16 >> 2) as u8);
    assert_eq!(frames[1].registers.tone[1], (0x073u16 >> 2) as u8);
    assert_eq!(frames[2].registers.volume, [0, 0, 15, 0]);
    assert_eq!(frames[3].registers, conv.registers);
    assert_eq!(
        frames.iter().map(|f| f.header.delay).collect::<Vec<_>>(),
        vec![1, 1, 1, 0]
    );
}
