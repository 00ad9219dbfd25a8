// Delay accumulation, tick splitting and clamping.
use psgframe::{ConvertOptions, Termination, convert};

use super::{convert_default, frame_delays, vgm_image};

/// Small deterministic generator so failures are reproducible.
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        self.0 >> 8
    }
}

#[test]
fn four_tick_wait_is_split_after_three() {
    // 0x61 with 2940 samples = 4 ticks of 735
    let conv = convert_default(&[0x61, 0x7C, 0x0B, 0x66]);
    assert_eq!(conv.output, vec![0xC0, 0x40]);
    assert_eq!(conv.stats.frames, 2);
    assert_eq!(conv.stats.continuation_frames, 1);
    assert_eq!(conv.leftover_samples, 0);
}

#[test]
fn two_sixtieth_waits_make_one_frame() {
    let conv = convert_default(&[0x62, 0x62, 0x66]);
    assert_eq!(conv.termination, Termination::EndOfData);
    assert_eq!(conv.output, vec![0x80]);
    assert_eq!(frame_delays(&conv.output), vec![2]);
}

#[test]
fn fiftieth_waits_with_pal_ticks() {
    let options = ConvertOptions::new().tick_samples(882);
    let conv = convert(&vgm_image(&[0x63, 0x63, 0x63, 0x63, 0x66]), &options).unwrap();
    assert_eq!(conv.output, vec![0xC0, 0x40]);

    // at 1/60 s ticks the same stream is 4 ticks plus 588 samples
    let conv = convert_default(&[0x63, 0x63, 0x63, 0x63, 0x66]);
    assert_eq!(frame_delays(&conv.output), vec![3, 1]);
    assert_eq!(conv.leftover_samples, 4 * 882 - 4 * 735);
}

#[test]
fn short_waits_accumulate_across_commands() {
    // 46 waits of 16 samples = 736 samples: one tick and one sample left
    let mut commands = vec![0x7F; 46];
    commands.push(0x66);
    let conv = convert_default(&commands);
    assert_eq!(conv.output, vec![0x40]);
    assert_eq!(conv.leftover_samples, 1);
    assert_eq!(conv.stats.wait_samples, 736);
}

#[test]
fn waits_flush_only_at_the_next_write() {
    let mut commands = vec![0x62; 7];
    commands.extend_from_slice(&[0x50, 0x90, 0x66]);
    let conv = convert_default(&commands);
    // 7 ticks flushed before the write, the volume change at the end
    assert_eq!(conv.output, vec![0xC0, 0xC0, 0x40, 0x10, 0x0F]);
    assert_eq!(frame_delays(&conv.output), vec![3, 3, 1, 0]);
}

#[test]
fn delay_is_conserved() {
    for (seed, tick) in [(1u32, 735u32), (7, 882), (42, 100), (99, 1)] {
        let mut rng = Lcg(seed);
        let mut commands = Vec::new();
        for _ in 0..200 {
            match rng.next() % 6 {
                0 => {
                    let n = (rng.next() % 5000) as u16;
                    commands.push(0x61);
                    commands.extend_from_slice(&n.to_le_bytes());
                }
                1 => commands.push(0x62),
                2 => commands.push(0x63),
                3 => commands.push(0x70 | (rng.next() % 16) as u8),
                _ => commands.extend_from_slice(&[0x50, (rng.next() & 0xFF) as u8]),
            }
        }
        commands.push(0x66);

        let options = ConvertOptions::new()
            .tick_samples(tick)
            .capacity(usize::MAX);
        let conv = convert(&vgm_image(&commands), &options).unwrap();
        assert!(!conv.truncated());

        let ticks: u64 = frame_delays(&conv.output)
            .iter()
            .map(|d| u64::from(*d))
            .sum();
        assert_eq!(ticks, conv.stats.ticks, "seed {}", seed);
        assert_eq!(
            ticks * u64::from(tick) + conv.leftover_samples,
            conv.stats.wait_samples,
            "seed {} tick {}",
            seed, tick
        );
        assert!(conv.leftover_samples < u64::from(tick));
    }
}
