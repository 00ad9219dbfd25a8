//! Assembler listing of an encoded frame buffer.
use std::io::{self, Write};

/// Bytes per `.db` line.
const BYTES_PER_LINE: usize = 8;

/// Write `bytes` as `.db` directives followed by a `0x00` end marker.
///
/// The listing always starts with `.db`; every byte is written as
/// ` 0xNN` and followed by `,` or, after each eighth byte, by a new `.db`
/// line. The end marker closes the last line.
pub fn render_db<W: Write>(w: &mut W, bytes: &[u8]) -> io::Result<()> {
    w.write_all(b".db")?;
    for (i, b) in bytes.iter().enumerate() {
        let sep = if i % BYTES_PER_LINE == BYTES_PER_LINE - 1 {
            "\n.db"
        } else {
            ","
        };
        write!(w, " 0x{:02x}{}", b, sep)?;
    }
    w.write_all(b" 0x00\n")
}
