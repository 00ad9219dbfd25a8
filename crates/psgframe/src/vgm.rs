//! VGM container handling: header fields and command-stream classification.
//!
//! Only the parts of the VGM format an SN76489 stream needs are modeled
//! here. Commands for other chips are reported as unknown opcodes by the
//! parser and left to the converter's unknown-opcode policy.
pub mod command;
mod header;
pub mod parser;

pub use command::Command;
pub use header::{DEFAULT_DATA_START, VGM_IDENT, VgmHeader, parse_vgm_header};
