//! Facilities for encoding and decoding Intel HEX records.

use crate::rom::BLANK_BYTE;
use byteorder::{BigEndian, ByteOrder};
use std::fmt;
use std::io;

mod lex;
mod parse;
mod types;

pub use parse::parse_records;
pub use types::{ParseError, SrcLoc};

//===========================================================================//

/// The canonical text of the end-of-file record.
pub const EOF_LINE: &str = ":00000001FF";

/// The largest image that [`assemble`] will build, in bytes.  Data placed
/// beyond this is dropped.
pub const MAX_IMAGE_SIZE: usize = 1 << 24;

/// Returns the checksum byte for a record whose other bytes (byte count,
/// address, record type, and data) are `bytes`: the two's complement of their
/// sum, so that all of the record's bytes sum to zero.
pub fn checksum_of(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte)).wrapping_neg()
}

//===========================================================================//

/// The type of an Intel HEX record.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RecordKind {
    /// Type `00`: data bytes at an address.
    Data,
    /// Type `01`: the end of the file.
    EndOfFile,
    /// Type `02`: sets bits 4-19 of the base address.
    ExtendedSegmentAddress,
    /// Type `03`: the CS:IP start address.
    StartSegmentAddress,
    /// Type `04`: sets bits 16-31 of the base address.
    ExtendedLinearAddress,
    /// Type `05`: the 32-bit start address.
    StartLinearAddress,
}

impl RecordKind {
    /// Returns the numeric record type.
    pub fn code(self) -> u8 {
        match self {
            RecordKind::Data => 0x00,
            RecordKind::EndOfFile => 0x01,
            RecordKind::ExtendedSegmentAddress => 0x02,
            RecordKind::StartSegmentAddress => 0x03,
            RecordKind::ExtendedLinearAddress => 0x04,
            RecordKind::StartLinearAddress => 0x05,
        }
    }

    /// Returns the record kind with the given numeric type, if any.
    pub fn from_code(code: u8) -> Option<RecordKind> {
        match code {
            0x00 => Some(RecordKind::Data),
            0x01 => Some(RecordKind::EndOfFile),
            0x02 => Some(RecordKind::ExtendedSegmentAddress),
            0x03 => Some(RecordKind::StartSegmentAddress),
            0x04 => Some(RecordKind::ExtendedLinearAddress),
            0x05 => Some(RecordKind::StartLinearAddress),
            _ => None,
        }
    }

    /// Returns the number of data bytes a record of this kind must hold, or
    /// `None` if it can hold any number.
    pub fn data_len(self) -> Option<usize> {
        match self {
            RecordKind::Data => None,
            RecordKind::EndOfFile => Some(0),
            RecordKind::ExtendedSegmentAddress
            | RecordKind::ExtendedLinearAddress => Some(2),
            RecordKind::StartSegmentAddress
            | RecordKind::StartLinearAddress => Some(4),
        }
    }

    /// Returns the human-readable name for this kind of record.
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Data => "data",
            RecordKind::EndOfFile => "end of file",
            RecordKind::ExtendedSegmentAddress => "extended segment address",
            RecordKind::StartSegmentAddress => "start segment address",
            RecordKind::ExtendedLinearAddress => "extended linear address",
            RecordKind::StartLinearAddress => "start linear address",
        }
    }
}

//===========================================================================//

/// The letter case used for hex digits A-F.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum HexCase {
    /// `A` through `F`.
    #[default]
    Upper,
    /// `a` through `f`.
    Lower,
}

/// The terminator written after each record.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LineEnding {
    /// `"\r\n"`, as a serial console `println` produces.
    #[default]
    CrLf,
    /// `"\n"`.
    Lf,
}

impl LineEnding {
    /// Returns the terminator text.
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::CrLf => "\r\n",
            LineEnding::Lf => "\n",
        }
    }
}

/// Controls the textual rendering of records.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HexFormat {
    /// The case of hex digits.
    pub case: HexCase,
    /// The terminator after each record.
    pub line_ending: LineEnding,
}

//===========================================================================//

/// A single Intel HEX record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    kind: RecordKind,
    addr: u16,
    data: Vec<u8>,
}

impl Record {
    /// Returns a record of the given kind.  Panics if `data` holds more than
    /// 255 bytes.
    pub fn new(kind: RecordKind, addr: u16, data: Vec<u8>) -> Record {
        assert!(data.len() <= usize::from(u8::MAX));
        Record { kind, addr, data }
    }

    /// Returns a data record holding `bytes` at `addr`.
    pub fn data(addr: u16, bytes: &[u8]) -> Record {
        Record::new(RecordKind::Data, addr, bytes.to_vec())
    }

    /// Returns the end-of-file record.
    pub fn end_of_file() -> Record {
        Record::new(RecordKind::EndOfFile, 0, Vec::new())
    }

    /// Returns a record that sets the upper 16 bits of the base address for
    /// subsequent data records.
    pub fn extended_linear_address(upper: u16) -> Record {
        let mut data = vec![0u8; 2];
        BigEndian::write_u16(&mut data, upper);
        Record::new(RecordKind::ExtendedLinearAddress, 0, data)
    }

    /// Returns the kind of this record.
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Returns the 16-bit address field of this record.
    pub fn addr(&self) -> u16 {
        self.addr
    }

    /// Returns the data bytes of this record.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns every byte of the record after the start code, including the
    /// trailing checksum.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data.len() + 5);
        bytes.push(self.data.len() as u8);
        let mut addr = [0u8; 2];
        BigEndian::write_u16(&mut addr, self.addr);
        bytes.extend_from_slice(&addr);
        bytes.push(self.kind.code());
        bytes.extend_from_slice(&self.data);
        bytes.push(checksum_of(&bytes));
        bytes
    }

    /// Returns this record's checksum byte.
    pub fn checksum(&self) -> u8 {
        let bytes = self.to_bytes();
        bytes[bytes.len() - 1]
    }

    /// Renders this record as a line of text, without a line terminator.
    pub fn to_line(&self, case: HexCase) -> String {
        // The end record is always written in its canonical form.
        if *self == Record::end_of_file() {
            return EOF_LINE.to_string();
        }
        let digits: String = self
            .to_bytes()
            .iter()
            .map(|byte| match case {
                HexCase::Upper => format!("{byte:02X}"),
                HexCase::Lower => format!("{byte:02x}"),
            })
            .collect();
        format!(":{digits}")
    }

    /// Writes this record, followed by a line terminator.
    pub fn write_to<W: io::Write>(
        &self,
        writer: &mut W,
        format: HexFormat,
    ) -> io::Result<()> {
        writer.write_all(self.to_line(format.case).as_bytes())?;
        writer.write_all(format.line_ending.as_str().as_bytes())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str(&self.to_line(HexCase::Upper))
    }
}

//===========================================================================//

/// Builds a flat memory image from a sequence of records.
///
/// Extended address records move the base address for the data records that
/// follow them.  Bytes not covered by any data record are left blank (0xff),
/// and anything after the first end-of-file record is ignored.
pub fn assemble(records: &[Record]) -> Vec<u8> {
    let mut image: Vec<u8> = Vec::new();
    let mut base: usize = 0;
    for record in records {
        match record.kind {
            RecordKind::Data => {
                let start = base + usize::from(record.addr);
                let end = start + record.data.len();
                if end > MAX_IMAGE_SIZE {
                    tracing::warn!(
                        "dropping {} bytes at ${:x}, beyond the largest \
                         supported image",
                        record.data.len(),
                        start
                    );
                    continue;
                }
                if image.len() < end {
                    image.resize(end, BLANK_BYTE);
                }
                image[start..end].copy_from_slice(&record.data);
            }
            RecordKind::EndOfFile => break,
            RecordKind::ExtendedSegmentAddress => {
                if let [hi, lo] = record.data[..] {
                    base = usize::from(u16::from_be_bytes([hi, lo])) << 4;
                }
            }
            RecordKind::ExtendedLinearAddress => {
                if let [hi, lo] = record.data[..] {
                    base = usize::from(u16::from_be_bytes([hi, lo])) << 16;
                }
            }
            RecordKind::StartSegmentAddress
            | RecordKind::StartLinearAddress => {}
        }
    }
    image
}

//===========================================================================//


//===========================================================================//
