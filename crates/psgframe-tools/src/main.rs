use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use psgframe::vgm::command::SAMPLES_50HZ;
use psgframe::{ConvertOptions, DEFAULT_CAPACITY, DEFAULT_TICK_SAMPLES, UnknownOpcodePolicy};

mod asm;
mod vgm;
use vgm::{convert as vgm_convert, frames as vgm_frames, info as vgm_info, read_vgm_as_vec};

/// SN76489 VGM to delta frame converter
#[derive(Parser)]
#[command(
    name = "psgframe",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a VGM file into frames (accepts .vgm or .vgz; use '-' for stdin)
    Convert {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Output file (stdout when omitted or '-')
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Asm)]
        format: OutputFormat,
        /// Fail instead of writing a truncated result
        #[arg(long)]
        strict: bool,
        #[command(flatten)]
        conversion: ConversionArgs,
    },
    /// Show header fields and conversion statistics for a VGM file
    Info {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        conversion: ConversionArgs,
    },
    /// Convert, then replay the frames and print them one per line
    Frames {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        conversion: ConversionArgs,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `.db` assembler directives
    Asm,
    /// Raw frame bytes
    Bin,
}

#[derive(Args, Debug)]
struct ConversionArgs {
    /// Samples per output tick (735 = 1/60 s at 44100 Hz)
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_TICK_SAMPLES,
        conflicts_with = "pal"
    )]
    tick_samples: u32,
    /// Use 1/50 s ticks (882 samples)
    #[arg(long)]
    pal: bool,
    /// Maximum output size in bytes
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,
    /// Stop at the first command the converter does not know
    #[arg(long)]
    fail_on_unknown: bool,
}

impl ConversionArgs {
    fn options(&self) -> ConvertOptions {
        let tick_samples = if self.pal {
            SAMPLES_50HZ
        } else {
            self.tick_samples
        };
        let policy = if self.fail_on_unknown {
            UnknownOpcodePolicy::Fail
        } else {
            UnknownOpcodePolicy::Skip
        };
        ConvertOptions::new()
            .tick_samples(tick_samples)
            .capacity(self.capacity)
            .unknown_opcodes(policy)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            file,
            output,
            format,
            strict,
            conversion,
        } => {
            let bytes = read_vgm_as_vec(&file)?;
            let options = conversion.options();
            vgm_convert(&bytes, &options, output.as_ref(), format, strict)?;
        }
        Commands::Info { file, conversion } => {
            let bytes = read_vgm_as_vec(&file)?;
            vgm_info(&file, &bytes, &conversion.options())?;
        }
        Commands::Frames { file, conversion } => {
            let bytes = read_vgm_as_vec(&file)?;
            vgm_frames(&bytes, &conversion.options())?;
        }
    }

    Ok(())
}
