// Conversion tests over complete VGM images.
use psgframe::frame::FrameReader;
use psgframe::{Conversion, ConvertOptions, ParseError, Termination, UnknownOpcodePolicy, convert};

#[path = "convert/delay.rs"]
mod delay;
#[path = "convert/registers.rs"]
mod registers;

/// NTSC master clock written into test headers.
pub const SN76489_CLOCK: u32 = 3_579_545;

/// Build a VGM 1.50 image with `commands` starting at 0x40.
pub fn vgm_image(commands: &[u8]) -> Vec<u8> {
    vgm_image_at(commands, 0x40)
}

/// Build a VGM 1.50 image whose command data starts at `data_start`.
pub fn vgm_image_at(commands: &[u8], data_start: usize) -> Vec<u8> {
    assert!(data_start >= 0x40);
    let mut bytes = vec![0u8; data_start];
    bytes[0x00..0x04].copy_from_slice(b"Vgm ");
    bytes[0x08..0x0C].copy_from_slice(&0x0000_0150u32.to_le_bytes());
    bytes[0x0C..0x10].copy_from_slice(&SN76489_CLOCK.to_le_bytes());
    bytes[0x24..0x28].copy_from_slice(&60u32.to_le_bytes());
    bytes[0x34..0x38].copy_from_slice(&((data_start - 0x34) as u32).to_le_bytes());
    bytes.extend_from_slice(commands);
    let eof = (bytes.len() - 0x04) as u32;
    bytes[0x04..0x08].copy_from_slice(&eof.to_le_bytes());
    bytes
}

pub fn convert_default(commands: &[u8]) -> Conversion {
    convert(&vgm_image(commands), &ConvertOptions::default()).expect("conversion failed")
}

/// Delay field of every frame in `output`.
pub fn frame_delays(output: &[u8]) -> Vec<u8> {
    FrameReader::new(output)
        .map(|f| f.expect("malformed frame").header.delay)
        .collect()
}

#[test]
fn data_offset_selects_command_start() {
    // padding between 0x40 and 0x100 would be misread as commands
    let mut image = vgm_image_at(&[0x50, 0x90, 0x66], 0x100);
    image[0x40] = 0x50;
    image[0x41] = 0x9F;
    let conv = convert(&image, &ConvertOptions::default()).unwrap();
    assert_eq!(conv.output, vec![0x10, 0x0F]);
    assert_eq!(conv.stats.commands, 2);
}

#[test]
fn zero_data_offset_starts_at_0x40() {
    let mut image = vgm_image(&[0x50, 0x90, 0x66]);
    image[0x34..0x38].copy_from_slice(&[0, 0, 0, 0]);
    let conv = convert(&image, &ConvertOptions::default()).unwrap();
    assert_eq!(conv.output, vec![0x10, 0x0F]);
}

#[test]
fn missing_end_of_data_still_flushes() {
    let conv = convert_default(&[0x50, 0x90, 0x62]);
    assert_eq!(conv.termination, Termination::Exhausted);
    assert_eq!(conv.output, vec![0x50, 0x0F]);
}

#[test]
fn commands_after_end_of_data_are_ignored() {
    let conv = convert_default(&[0x66, 0x50, 0x90]);
    assert_eq!(conv.termination, Termination::EndOfData);
    assert_eq!(conv.output, vec![0x00]);
}

#[test]
fn eof_offset_bounds_the_command_region() {
    let mut image = vgm_image(&[0x62, 0x62]);
    // trailing bytes past the declared EOF are not commands
    image.extend_from_slice(&[0x50, 0x90]);
    let conv = convert(&image, &ConvertOptions::default()).unwrap();
    assert_eq!(conv.termination, Termination::Exhausted);
    assert_eq!(conv.output, vec![0x80]);
}

#[test]
fn truncated_command_is_fatal() {
    let image = vgm_image(&[0x62, 0x61, 0x10]);
    let err = convert(&image, &ConvertOptions::default()).unwrap_err();
    match err {
        ParseError::OffsetOutOfRange { offset, .. } => assert_eq!(offset, 0x42),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn not_a_vgm_is_rejected() {
    let mut image = vgm_image(&[0x66]);
    image[0..4].copy_from_slice(b"RIFF");
    assert!(matches!(
        convert(&image, &ConvertOptions::default()),
        Err(ParseError::InvalidIdent(_))
    ));
}

#[test]
fn unknown_opcodes_are_recorded_and_skipped() {
    // 0xDD is not modeled; decoding resumes with the next byte
    let conv = convert_default(&[0x50, 0x90, 0xDD, 0x62, 0x66]);
    assert_eq!(conv.unknown_opcodes.len(), 1);
    assert_eq!(conv.unknown_opcodes[0].opcode, 0xDD);
    assert_eq!(conv.unknown_opcodes[0].offset, 0x42);
    assert_eq!(conv.output, vec![0x50, 0x0F]);

    let options = ConvertOptions::new().unknown_opcodes(UnknownOpcodePolicy::Fail);
    assert_eq!(
        convert(&vgm_image(&[0x50, 0x90, 0xDD, 0x62, 0x66]), &options).unwrap_err(),
        ParseError::UnknownOpcode {
            opcode: 0xDD,
            offset: 0x42
        }
    );
}

#[test]
fn unknown_opcode_operand_can_desynchronize() {
    // YM2413 write 0x51 aa dd: only the opcode is skipped, so its operands
    // are decoded as commands. 0x62 here is the YM2413 register number.
    let conv = convert_default(&[0x51, 0x62, 0x00, 0x66]);
    assert_eq!(conv.unknown_opcodes.len(), 2);
    assert_eq!(conv.stats.waits, 1);
}

#[test]
fn capacity_truncates_on_frame_boundary() {
    // every tick changes tone 0 and volume 0: 3 bytes per frame
    let mut commands = Vec::new();
    for i in 0..100u8 {
        commands.extend_from_slice(&[0x50, 0x80 | (i & 0x0F), 0x50, (i >> 4) & 0x3F]);
        commands.extend_from_slice(&[0x50, 0x90 | (i & 0x0F), 0x62]);
    }
    commands.push(0x66);

    for capacity in [0usize, 1, 2, 3, 10, 31, 64] {
        let options = ConvertOptions::new().capacity(capacity);
        let conv = convert(&vgm_image(&commands), &options).unwrap();
        assert!(conv.truncated(), "capacity {}", capacity);
        assert!(conv.output.len() <= capacity);
        // the reader consumes the output exactly, with no partial frame
        let frames: Vec<_> = FrameReader::new(&conv.output)
            .collect::<Result<_, _>>()
            .unwrap_or_else(|e| panic!("capacity {}: {}", capacity, e));
        assert_eq!(frames.len(), conv.stats.frames);
    }

    let conv = convert(&vgm_image(&commands), &ConvertOptions::default()).unwrap();
    assert!(!conv.truncated());
}
