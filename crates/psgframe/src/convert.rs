//! VGM → frame conversion.
//!
//! [`Converter`] owns the whole decoding context of one pass: the PSG
//! register state with its latch, the pending delay, the frame encoder
//! (which holds the previously emitted state) and the output buffer.
//! Nothing outlives the pass except the returned [`Conversion`].
//!
//! Flush points:
//! - before a PSG write, when at least one whole tick is pending, so every
//!   write between two waits lands in the same frame;
//! - at `EndOfData`, and when the command region runs out without one.
//!
//! Waits only accumulate; they never flush on their own.
use log::{debug, trace, warn};

use crate::binutil::ParseError;
use crate::chip::{Sn76489Registers, Sn76489State};
use crate::frame::{EncodeOutcome, FrameEncoder, OutputBuffer};
use crate::vgm::VgmHeader;
use crate::vgm::command::{Command, SAMPLES_60HZ};
use crate::vgm::parser::Commands;

/// Output budget of the reference playback target, in bytes.
pub const DEFAULT_CAPACITY: usize = 7680;

/// Default tick length: 1/60 s at the 44100 Hz VGM sample rate.
pub const DEFAULT_TICK_SAMPLES: u32 = SAMPLES_60HZ;

/// What to do with an opcode the parser does not model.
///
/// The parser cannot know the operand length of an unknown opcode. `Skip`
/// resumes at the very next byte, which misreads the stream if the opcode
/// did have operands; the occurrence is recorded in
/// [`Conversion::unknown_opcodes`] so callers can judge the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownOpcodePolicy {
    /// Log, record and continue with the next byte.
    #[default]
    Skip,
    /// Abort the pass with `ParseError::UnknownOpcode`.
    Fail,
}

/// Conversion settings.
///
/// ```
/// use psgframe::{ConvertOptions, UnknownOpcodePolicy};
///
/// let options = ConvertOptions::new()
///     .tick_samples(882)
///     .capacity(4096)
///     .unknown_opcodes(UnknownOpcodePolicy::Fail);
/// assert_eq!(options.tick_samples, 882);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Samples per output tick.
    pub tick_samples: u32,
    /// Maximum size of the encoded output in bytes.
    pub capacity: usize,
    pub unknown_opcodes: UnknownOpcodePolicy,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            tick_samples: DEFAULT_TICK_SAMPLES,
            capacity: DEFAULT_CAPACITY,
            unknown_opcodes: UnknownOpcodePolicy::default(),
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_samples(mut self, samples: u32) -> Self {
        self.tick_samples = samples;
        self
    }

    pub fn capacity(mut self, bytes: usize) -> Self {
        self.capacity = bytes;
        self
    }

    pub fn unknown_opcodes(mut self, policy: UnknownOpcodePolicy) -> Self {
        self.unknown_opcodes = policy;
        self
    }
}

/// Why the pass stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// An `EndOfData` command was reached.
    EndOfData,
    /// The command region ended without `EndOfData`.
    Exhausted,
    /// The next frame did not fit into the output capacity.
    CapacityReached,
}

/// An unknown opcode skipped under [`UnknownOpcodePolicy::Skip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownOpcode {
    pub opcode: u8,
    pub offset: usize,
}

/// Counters collected during a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertStats {
    /// Commands decoded, including unknown opcodes.
    pub commands: usize,
    pub psg_writes: usize,
    pub waits: usize,
    /// Sum of all waits, in samples.
    pub wait_samples: u64,
    /// Operand bytes of commands that carry nothing for the frame format.
    pub skipped_bytes: usize,
    pub frames: usize,
    pub continuation_frames: usize,
    pub payload_bytes: usize,
    /// Ticks written into frame headers.
    pub ticks: u64,
}

/// Result of a conversion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Encoded frames. Always ends on a frame boundary.
    pub output: Vec<u8>,
    pub termination: Termination,
    /// Samples still pending when the pass stopped (less than one tick
    /// unless the pass was truncated).
    pub leftover_samples: u64,
    /// PSG register state at the end of the pass.
    pub registers: Sn76489Registers,
    pub unknown_opcodes: Vec<UnknownOpcode>,
    pub stats: ConvertStats,
}

impl Conversion {
    /// `true` when the output capacity cut the conversion short.
    pub fn truncated(&self) -> bool {
        self.termination == Termination::CapacityReached
    }
}

/// Decoding context for one conversion pass.
#[derive(Debug, Clone)]
pub struct Converter {
    psg: Sn76489State,
    pending: u64,
    encoder: FrameEncoder,
    out: OutputBuffer,
    policy: UnknownOpcodePolicy,
    stats: ConvertStats,
    unknown: Vec<UnknownOpcode>,
}

impl Converter {
    pub fn new(options: &ConvertOptions) -> Self {
        Self {
            psg: Sn76489State::new(),
            pending: 0,
            encoder: FrameEncoder::new(options.tick_samples),
            out: OutputBuffer::with_capacity(options.capacity),
            policy: options.unknown_opcodes,
            stats: ConvertStats::default(),
            unknown: Vec::new(),
        }
    }

    /// Convert the commands in `bytes[start..end]`.
    ///
    /// `end` is clamped to the buffer length. A command whose operands
    /// extend to or past `end` aborts the pass with
    /// `ParseError::OffsetOutOfRange`.
    pub fn run(mut self, bytes: &[u8], start: usize, end: usize) -> Result<Conversion, ParseError> {
        let end = end.min(bytes.len());
        if start > end {
            return Err(ParseError::OffsetOutOfRange {
                offset: start,
                needed: 1,
                available: end,
                context: Some("data_offset".into()),
            });
        }

        let mut commands = Commands::new(bytes, start, end);
        let termination = loop {
            let Some(item) = commands.next() else {
                debug!("command data ended at 0x{:X} without end-of-data", end);
                break self.finish(Termination::Exhausted);
            };
            let (offset, cmd) = item?;
            trace!("0x{:06X}: {:?}", offset, cmd);
            self.stats.commands += 1;

            match cmd {
                Command::PsgWrite(value) => {
                    if self.encoder.whole_ticks(self.pending) > 0 && !self.flush() {
                        break Termination::CapacityReached;
                    }
                    self.psg.write(value);
                    self.stats.psg_writes += 1;
                }
                Command::GameGearStereo(_) => {
                    self.stats.skipped_bytes += 1;
                }
                Command::WaitSamples(_)
                | Command::Wait735Samples
                | Command::Wait882Samples
                | Command::WaitNSample(_) => {
                    let samples = u64::from(cmd.wait_samples().unwrap_or(0));
                    self.pending += samples;
                    self.stats.waits += 1;
                    self.stats.wait_samples += samples;
                }
                Command::EndOfData => {
                    break self.finish(Termination::EndOfData);
                }
                Command::Unknown { opcode, offset } => match self.policy {
                    UnknownOpcodePolicy::Skip => {
                        warn!(
                            "unknown command 0x{:02X} at 0x{:X}, skipped",
                            opcode, offset
                        );
                        self.unknown.push(UnknownOpcode { opcode, offset });
                    }
                    UnknownOpcodePolicy::Fail => {
                        return Err(ParseError::UnknownOpcode { opcode, offset });
                    }
                },
            }

            if self.out.is_full() {
                warn!("output full at {} bytes, stopping", self.out.len());
                break Termination::CapacityReached;
            }
        };

        Ok(Conversion {
            output: self.out.into_vec(),
            termination,
            leftover_samples: self.pending,
            registers: *self.psg.registers(),
            unknown_opcodes: self.unknown,
            stats: self.stats,
        })
    }

    fn finish(&mut self, reason: Termination) -> Termination {
        if self.flush() {
            reason
        } else {
            Termination::CapacityReached
        }
    }

    /// Encode the current state and pending ticks. Returns `false` when the
    /// output capacity stopped the encoder.
    fn flush(&mut self) -> bool {
        let result = self
            .encoder
            .encode(self.psg.registers(), &mut self.pending, &mut self.out);
        match result {
            Ok(outcome) => {
                self.record(&outcome);
                true
            }
            Err(e) => {
                self.record(&e.written);
                warn!("{}; output truncated at {} bytes", e, self.out.len());
                false
            }
        }
    }

    fn record(&mut self, outcome: &EncodeOutcome) {
        self.stats.frames += outcome.frames;
        self.stats.continuation_frames += outcome.continuation_frames;
        self.stats.payload_bytes += outcome.payload_bytes;
        self.stats.ticks += outcome.ticks;
    }
}

/// Convert a complete, uncompressed VGM file.
///
/// The command region starts at the header's data offset (0x40 when the
/// field is zero) and ends at the buffer end, the EOF offset or the GD3
/// tag, whichever comes first.
///
/// # Examples
///
/// ```
/// use psgframe::{ConvertOptions, Termination, convert};
///
/// let mut vgm = vec![0u8; 0x40];
/// vgm[..4].copy_from_slice(b"Vgm ");
/// // tone 0 latch + data, channel 0 full volume, 1/60 s, end
/// vgm.extend_from_slice(&[0x50, 0x85, 0x50, 0x30, 0x50, 0x90, 0x62, 0x66]);
///
/// let conv = convert(&vgm, &ConvertOptions::default()).unwrap();
/// assert_eq!(conv.termination, Termination::EndOfData);
/// assert_eq!(conv.output, vec![0x51, 0xC1, 0x0F]);
/// ```
pub fn convert(vgm: &[u8], options: &ConvertOptions) -> Result<Conversion, ParseError> {
    let header = VgmHeader::try_from(vgm)?;
    let start = header.data_start();
    let end = header.data_end(vgm.len());
    debug!(
        "vgm {} sn76489 {} Hz, commands 0x{:X}..0x{:X}",
        header.version_string(),
        header.sn76489_clock,
        start,
        end
    );
    Converter::new(options).run(vgm, start, end)
}
