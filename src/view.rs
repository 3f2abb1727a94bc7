//! Facilities for displaying binary data as a classic hex dump.

use std::fmt;

//===========================================================================//

const BYTES_PER_LINE: usize = 16;

//===========================================================================//

/// Renders `data` as lines of sixteen bytes, each line giving the offset,
/// the bytes in hex, and the bytes as ASCII (with `.` for unprintable
/// bytes).  A short final line is padded with spaces so that its columns
/// line up.  Empty data renders as `No data`.
pub fn format_hex_view(data: &[u8]) -> String {
    if data.is_empty() {
        return "No data".to_string();
    }
    HexView(data).to_string()
}

struct HexView<'a>(&'a [u8]);

impl fmt::Display for HexView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        for (index, chunk) in self.0.chunks(BYTES_PER_LINE).enumerate() {
            write!(f, "{:08X}: ", index * BYTES_PER_LINE)?;
            for column in 0..BYTES_PER_LINE {
                match chunk.get(column) {
                    Some(byte) => write!(f, "{byte:02X} ")?,
                    None => f.write_str("   ")?,
                }
                if column == 7 {
                    f.write_str(" ")?;
                }
            }
            f.write_str(" |")?;
            for column in 0..BYTES_PER_LINE {
                let ch = match chunk.get(column) {
                    Some(&byte) if (0x20..0x7f).contains(&byte) => {
                        byte as char
                    }
                    Some(_) => '.',
                    None => ' ',
                };
                write!(f, "{ch}")?;
            }
            f.write_str("|\n")?;
        }
        Ok(())
    }
}

//===========================================================================//


//===========================================================================//
