use std::fs;
use std::io::{BufWriter, Read, Write, stdin, stdout};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, ContentArrangement, Table, presets::NOTHING};
use flate2::read::GzDecoder;
use log::{info, warn};
use psgframe::chip::{Sn76489Registers, TONE_CHANNELS};
use psgframe::frame::{DecodedFrame, FrameReader};
use psgframe::vgm::VGM_IDENT;
use psgframe::{Conversion, ConvertOptions, VgmHeader};

use crate::OutputFormat;
use crate::asm::render_db;

/// Largest uncompressed VGM accepted.
pub const SOURCE_SIZE_MAX: usize = 512 * 1024;

/// gzip member header: magic and the deflate method byte.
const GZIP_MAGIC: [u8; 3] = [0x1F, 0x8B, 0x08];

/// VGM sample rate all wait commands are counted in.
const VGM_SAMPLE_RATE: f64 = 44100.0;

/// Clock field bits 30-31 are chip flags.
const SN76489_CLOCK_MASK: u32 = 0x3FFF_FFFF;

/// Read VGM bytes from a path or stdin ('-') into a Vec<u8>.
///
/// `.vgz`/`.gz` files and anything starting with the gzip magic are
/// decompressed. The result must be a VGM image no larger than
/// [`SOURCE_SIZE_MAX`].
pub fn read_vgm_as_vec(path: &PathBuf) -> Result<Vec<u8>> {
    // If path is literal '-' treat it as stdin
    let (data, gzip_name) = if path == Path::new("-") {
        let mut inbuf = Vec::new();
        stdin()
            .read_to_end(&mut inbuf)
            .context("failed to read from stdin")?;
        (inbuf, false)
    } else {
        let data = fs::read(path)
            .with_context(|| format!("failed to read input file: {}", path.display()))?;
        let gzip_name = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("vgz") || ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);
        (data, gzip_name)
    };
    decode_source(data, gzip_name)
}

fn decode_source(data: Vec<u8>, gzip_name: bool) -> Result<Vec<u8>> {
    let bytes = if gzip_name || data.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        // one byte past the limit is enough to reject the file
        GzDecoder::new(&data[..])
            .take(SOURCE_SIZE_MAX as u64 + 1)
            .read_to_end(&mut out)
            .context("failed to decompress gzip data")?;
        out
    } else {
        data
    };

    if bytes.len() > SOURCE_SIZE_MAX {
        bail!("source file (uncompressed) larger than 512 KiB");
    }
    if !bytes.starts_with(VGM_IDENT) {
        bail!("file is not a valid VGM");
    }
    Ok(bytes)
}

fn log_header(header: &VgmHeader) {
    info!("Version: {}.", header.version_string());
    info!("Clock rate: {} Hz.", header.sn76489_clock);
    info!("Rate: {} Hz.", header.sample_rate);
    info!("VGM offset: 0x{:02x}.", header.data_offset);
}

fn run_conversion(bytes: &[u8], options: &ConvertOptions) -> Result<(VgmHeader, Conversion)> {
    let header = VgmHeader::try_from(bytes).context("failed to parse VGM header")?;
    let conv = psgframe::convert(bytes, options).context("conversion failed")?;
    if !conv.unknown_opcodes.is_empty() {
        warn!(
            "{} unknown command(s) skipped; output may be wrong",
            conv.unknown_opcodes.len()
        );
    }
    if conv.truncated() {
        warn!(
            "output truncated at {} of {} bytes",
            conv.output.len(),
            options.capacity
        );
    }
    Ok((header, conv))
}

/// `convert` subcommand: write the frames as asm text or raw bytes.
pub fn convert(
    bytes: &[u8],
    options: &ConvertOptions,
    output: Option<&PathBuf>,
    format: OutputFormat,
    strict: bool,
) -> Result<()> {
    let mut text = Vec::new();
    let written = convert_to(&mut text, bytes, options, format, strict)?;

    match output_file(output) {
        Some(path) => {
            fs::write(path, &text)
                .with_context(|| format!("failed to write output file: {}", path.display()))?;
        }
        None => {
            let mut out = stdout().lock();
            out.write_all(&text).context("failed to write output")?;
            out.flush().context("failed to write output")?;
        }
    }

    info!("Done. {} bytes output.", written);
    Ok(())
}

/// Run the conversion and render it into `w`.
///
/// Returns the number of frame bytes rendered. In strict mode a truncated
/// conversion is an error and nothing is written.
pub fn convert_to<W: Write>(
    w: &mut W,
    bytes: &[u8],
    options: &ConvertOptions,
    format: OutputFormat,
    strict: bool,
) -> Result<usize> {
    let (header, conv) = run_conversion(bytes, options)?;
    log_header(&header);

    if strict && conv.truncated() {
        bail!(
            "output does not fit into {} bytes ({} bytes written before the limit)",
            options.capacity,
            conv.output.len()
        );
    }

    match format {
        OutputFormat::Asm => render_db(w, &conv.output),
        OutputFormat::Bin => w.write_all(&conv.output),
    }
    .context("failed to write output")?;
    Ok(conv.output.len())
}

/// Output path, or `None` for stdout (no path or '-').
fn output_file(output: Option<&PathBuf>) -> Option<&PathBuf> {
    output.filter(|path| *path != Path::new("-"))
}

/// `info` subcommand: header fields and conversion statistics as a table.
pub fn info(path: &Path, bytes: &[u8], options: &ConvertOptions) -> Result<()> {
    let (header, conv) = run_conversion(bytes, options)?;
    let stats = &conv.stats;

    let seconds = |samples: u64| samples as f64 / VGM_SAMPLE_RATE;
    let tick_seconds = seconds(stats.ticks * u64::from(options.tick_samples));

    let rows: Vec<(&str, String)> = vec![
        ("file", path.display().to_string()),
        ("VGM version", header.version_string()),
        ("sn76489_clock", format!("{} Hz", header.sn76489_clock)),
        ("rate", format!("{} Hz", header.sample_rate)),
        (
            "sn_fb / snw",
            format!("0x{:04X} / {}", header.sn_fb, header.snw),
        ),
        (
            "commands",
            format!(
                "0x{:08X}..0x{:08X}",
                header.data_start(),
                header.data_end(bytes.len())
            ),
        ),
        (
            "total_samples",
            format!(
                "{} ({:.3} s)",
                header.total_samples,
                seconds(u64::from(header.total_samples))
            ),
        ),
        ("loop_offset", format!("0x{:08X}", header.loop_offset)),
        ("loop_samples", header.loop_samples.to_string()),
        ("gd3_offset", format!("0x{:08X}", header.gd3_offset)),
        ("decoded", stats.commands.to_string()),
        ("psg_writes", stats.psg_writes.to_string()),
        (
            "waits",
            format!(
                "{} ({} samples, {:.3} s)",
                stats.waits,
                stats.wait_samples,
                seconds(stats.wait_samples)
            ),
        ),
        ("skipped_bytes", stats.skipped_bytes.to_string()),
        ("unknown", conv.unknown_opcodes.len().to_string()),
        (
            "frames",
            format!(
                "{} ({} delay only)",
                stats.frames, stats.continuation_frames
            ),
        ),
        ("payload_bytes", stats.payload_bytes.to_string()),
        (
            "ticks",
            format!(
                "{} x {} samples ({:.3} s)",
                stats.ticks, options.tick_samples, tick_seconds
            ),
        ),
        ("leftover_samples", conv.leftover_samples.to_string()),
        (
            "output",
            format!("{} / {} bytes", conv.output.len(), options.capacity),
        ),
        ("termination", format!("{:?}", conv.termination)),
    ];

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new("Field"), Cell::new("Value")]);
    for (k, v) in rows {
        table.add_row(vec![Cell::new(k), Cell::new(v)]);
    }
    println!("{}", table);

    Ok(())
}

fn tone_column(r: &Sn76489Registers, channel: usize, clock_hz: f32) -> String {
    match r.tone_hz(channel, clock_hz) {
        Some(hz) => format!("{:02X}/{:.0}Hz", r.tone[channel], hz),
        None => format!("{:02X}/-", r.tone[channel]),
    }
}

fn format_frame(frame: &DecodedFrame, clock_hz: f32) -> String {
    let names: Vec<&str> = frame.header.flags.iter_names().map(|(n, _)| n).collect();
    let flags = if names.is_empty() {
        "-".to_string()
    } else {
        names.join("|")
    };
    let r = &frame.registers;
    let tones: Vec<String> = (0..TONE_CHANNELS)
        .map(|ch| tone_column(r, ch, clock_hz))
        .collect();
    format!(
        "{:06X}  +{}  {:<30} tone {:<12} {:<12} {:<12} noise {:X}  vol {:X} {:X} {:X} {:X}",
        frame.offset,
        frame.header.delay,
        flags,
        tones[0],
        tones[1],
        tones[2],
        r.noise,
        r.volume[0],
        r.volume[1],
        r.volume[2],
        r.volume[3]
    )
}

/// `frames` subcommand: replay the converted output the way a driver would.
pub fn frames(bytes: &[u8], options: &ConvertOptions) -> Result<()> {
    let (header, conv) = run_conversion(bytes, options)?;
    let clock_hz = (header.sn76489_clock & SN76489_CLOCK_MASK) as f32;

    let mut out = BufWriter::new(stdout().lock());
    let mut ticks = 0u64;
    let mut count = 0usize;
    for frame in FrameReader::new(&conv.output) {
        let frame = frame.context("encoded output is malformed")?;
        writeln!(out, "{}", format_frame(&frame, clock_hz))?;
        ticks += u64::from(frame.header.delay);
        count += 1;
    }
    out.flush()?;

    info!(
        "{} frames, {} ticks ({:.3} s)",
        count,
        ticks,
        (ticks * u64::from(options.tick_samples)) as f64 / VGM_SAMPLE_RATE
    );
    Ok(())
}
