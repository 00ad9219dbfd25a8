//! psgframe — SN76489 VGM streams to delta-encoded playback frames
//!
//! `psgframe` reads the command stream of a VGM file written for the
//! SN76489 family of PSGs (Sega Master System, Game Gear, BBC Micro, …)
//! and produces a compact byte sequence that a small driver can replay at
//! a fixed tick rate.
//!
//! Key features:
//! - Single forward pass over the command stream: PSG writes update a
//!   register image, waits accumulate as pending delay.
//! - Delta frames: each frame carries only the registers that changed since
//!   the previous frame plus 0..=3 ticks of delay; longer waits become extra
//!   one-byte delay frames.
//! - Capacity-bounded output: the encoder stops before a frame that would
//!   not fit, so the result always ends on a frame boundary.
//! - A playback-side [`frame::FrameReader`] to check what a driver will see.
//!
//! Tone periods lose their two least significant bits in the frame format;
//! volumes are sent as `15 - attenuation`.
//!
//! Example: converting a VGM image
//!
//! ```rust
//! use psgframe::{ConvertOptions, convert};
//! use psgframe::frame::FrameReader;
//!
//! let mut vgm = vec![0u8; 0x40];
//! vgm[..4].copy_from_slice(b"Vgm ");
//! vgm.extend_from_slice(&[
//!     0x50, 0x8E, 0x50, 0x0F, // tone 0 period 0x0FE
//!     0x50, 0x92,             // tone 0 attenuation 2
//!     0x62, 0x62, 0x66,       // two 1/60 s waits, end
//! ]);
//!
//! let conv = convert(&vgm, &ConvertOptions::default()).expect("valid VGM");
//! assert!(!conv.truncated());
//!
//! let frames: Vec<_> = FrameReader::new(&conv.output)
//!     .collect::<Result<_, _>>()
//!     .expect("well-formed frames");
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].header.delay, 2);
//! assert_eq!(frames[0].registers.tone[0], 0x3F);
//! assert_eq!(frames[0].registers.volume[0], 13);
//! ```
//!
//! Example: driving the converter over an explicit region
//!
//! ```rust
//! use psgframe::{ConvertOptions, Converter, Termination};
//!
//! let commands = [0x61, 0x7C, 0x0B, 0x66]; // wait 2940 samples (4 ticks)
//! let conv = Converter::new(&ConvertOptions::default())
//!     .run(&commands, 0, commands.len())
//!     .unwrap();
//! assert_eq!(conv.termination, Termination::EndOfData);
//! assert_eq!(conv.output, vec![0xC0, 0x40]);
//! ```
mod binutil;
pub mod chip;
pub mod convert;
pub mod frame;
pub mod vgm;

pub use binutil::ParseError;
pub use convert::{
    Conversion, ConvertOptions, ConvertStats, Converter, DEFAULT_CAPACITY, DEFAULT_TICK_SAMPLES,
    Termination, UnknownOpcode, UnknownOpcodePolicy, convert,
};
pub use vgm::{Command, VgmHeader};
