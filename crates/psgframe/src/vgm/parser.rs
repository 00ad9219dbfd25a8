//! VGM command-stream parser.
//!
//! Entry points:
//! - `parse_command(bytes, off, end)`: classify the single command at
//!   `off` and return it together with the number of bytes it occupies.
//! - `Commands`: a forward-only iterator that walks a command region,
//!   yielding `(offset, Command)` pairs until `EndOfData`, the end of the
//!   region, or the first framing error.
//!
//! Every read is bounded by `end` (exclusive), so a command whose operands
//! run past the declared data region is reported as
//! `ParseError::OffsetOutOfRange` rather than read from whatever follows.
use crate::binutil::{ParseError, read_u8_bounded, read_u16_le_bounded};
use crate::vgm::command::{Command, opcode};

/// Parse a single VGM command beginning at `off`.
///
/// Returns the decoded command and the total number of bytes consumed,
/// including the opcode byte. Unrecognized opcodes are returned as
/// [`Command::Unknown`] with a length of one byte: the parser does not know
/// their operand size, so the caller owns the resynchronization decision.
pub fn parse_command(bytes: &[u8], off: usize, end: usize) -> Result<(Command, usize), ParseError> {
    let op = read_operand_u8(bytes, off, end, "opcode")?;
    let cur = off + 1;
    match op {
        opcode::GAME_GEAR_STEREO => {
            let v = read_operand_u8(bytes, cur, end, "0x4F operand")?;
            Ok((Command::GameGearStereo(v), 2))
        }
        opcode::PSG_WRITE => {
            let v = read_operand_u8(bytes, cur, end, "0x50 operand")?;
            Ok((Command::PsgWrite(v), 2))
        }
        opcode::WAIT_SAMPLES => {
            let n = read_operand_u16(bytes, cur, end, "0x61 operand")?;
            Ok((Command::WaitSamples(n), 3))
        }
        opcode::WAIT_735 => Ok((Command::Wait735Samples, 1)),
        opcode::WAIT_882 => Ok((Command::Wait882Samples, 1)),
        opcode::END_OF_DATA => Ok((Command::EndOfData, 1)),
        opcode::WAIT_N_FIRST..=opcode::WAIT_N_LAST => {
            Ok((Command::WaitNSample((op & 0x0F) + 1), 1))
        }
        other => Ok((
            Command::Unknown {
                opcode: other,
                offset: off,
            },
            1,
        )),
    }
}

fn read_operand_u8(bytes: &[u8], off: usize, end: usize, ctx: &str) -> Result<u8, ParseError> {
    read_u8_bounded(bytes, off, end).map_err(|e| with_context(e, ctx))
}

fn read_operand_u16(bytes: &[u8], off: usize, end: usize, ctx: &str) -> Result<u16, ParseError> {
    read_u16_le_bounded(bytes, off, end).map_err(|e| with_context(e, ctx))
}

fn with_context(err: ParseError, ctx: &str) -> ParseError {
    match err {
        ParseError::OffsetOutOfRange {
            offset,
            needed,
            available,
            context: None,
        } => ParseError::OffsetOutOfRange {
            offset,
            needed,
            available,
            context: Some(ctx.to_string()),
        },
        other => other,
    }
}

/// Forward-only iterator over the commands of a VGM command region.
///
/// The iterator is fused: after yielding `EndOfData` or an error it
/// returns `None`.
#[derive(Debug, Clone)]
pub struct Commands<'a> {
    bytes: &'a [u8],
    off: usize,
    end: usize,
    done: bool,
}

impl<'a> Commands<'a> {
    /// Walk `bytes[start..end]`. `end` is clamped to the buffer length.
    pub fn new(bytes: &'a [u8], start: usize, end: usize) -> Self {
        Self {
            bytes,
            off: start,
            end: end.min(bytes.len()),
            done: false,
        }
    }
}

impl Iterator for Commands<'_> {
    type Item = Result<(usize, Command), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.off >= self.end {
            return None;
        }
        let at = self.off;
        match parse_command(self.bytes, at, self.end) {
            Ok((cmd, consumed)) => {
                self.off += consumed;
                if cmd == Command::EndOfData {
                    self.done = true;
                }
                Some(Ok((at, cmd)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Commands<'_> {}
