//! Facilities for dumping a device's contents as Intel HEX.

use crate::bus::ReadBus;
use crate::hex::{HexFormat, Record};
use crate::rom::{BLANK_BYTE, ROM_SIZE};
use std::io;

//===========================================================================//

/// The number of data bytes in each record of a dump.
pub const RECORD_LEN: u16 = 16;

//===========================================================================//

/// Returns the lowest address whose byte is not blank (0xff), or `ROM_SIZE`
/// if every byte of the device is blank.
///
/// Addresses are read in ascending order, and the scan stops at the first
/// non-blank byte.
pub fn first_nonempty<B: ReadBus + ?Sized>(bus: &mut B) -> u16 {
    (0..ROM_SIZE)
        .find(|&addr| bus.read_byte(addr) != BLANK_BYTE)
        .unwrap_or(ROM_SIZE)
}

/// Returns true if every byte of the device is blank (0xff).
pub fn is_blank<B: ReadBus + ?Sized>(bus: &mut B) -> bool {
    first_nonempty(bus) == ROM_SIZE
}

//===========================================================================//

/// Returns an iterator over the records of a full dump of the device: one
/// 16-byte data record for each 16-byte block, in ascending address order,
/// followed by a single end-of-file record.
///
/// Nothing is read from the bus until the iterator is advanced, and each
/// record reads only its own block.
pub fn dump<B: ReadBus + ?Sized>(bus: &mut B) -> DumpRecords<'_, B> {
    DumpRecords { bus, next_addr: 0, finished: false }
}

/// The iterator returned by [`dump`].
pub struct DumpRecords<'a, B: ?Sized> {
    bus: &'a mut B,
    next_addr: u32,
    finished: bool,
}

impl<B: ReadBus + ?Sized> Iterator for DumpRecords<'_, B> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.finished {
            return None;
        }
        if self.next_addr >= u32::from(ROM_SIZE) {
            self.finished = true;
            return Some(Record::end_of_file());
        }
        let addr = self.next_addr as u16;
        let mut data = [0u8; RECORD_LEN as usize];
        for (offset, byte) in (0..RECORD_LEN).zip(data.iter_mut()) {
            *byte = self.bus.read_byte(addr + offset);
        }
        self.next_addr += u32::from(RECORD_LEN);
        if addr % 0x400 == 0 {
            tracing::debug!("dumping ${:04x}", addr);
        }
        Some(Record::data(addr, &data))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.finished {
            0
        } else {
            let blocks = (u32::from(ROM_SIZE) - self.next_addr)
                .div_ceil(u32::from(RECORD_LEN));
            blocks as usize + 1
        };
        (remaining, Some(remaining))
    }
}

impl<B: ReadBus + ?Sized> ExactSizeIterator for DumpRecords<'_, B> {}

//===========================================================================//

/// Writes a full dump of the device to `writer`, one record per line, and
/// returns the number of records written.
pub fn write_dump<B: ReadBus + ?Sized, W: io::Write>(
    bus: &mut B,
    writer: &mut W,
    format: HexFormat,
) -> io::Result<usize> {
    let mut count = 0;
    for record in dump(bus) {
        record.write_to(writer, format)?;
        count += 1;
    }
    writer.flush()?;
    tracing::debug!("wrote {} records", count);
    Ok(count)
}

/// Determines whether a device is dumped regardless of its contents.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DumpPolicy {
    /// Always write a dump.
    #[default]
    Always,
    /// Write a dump only if the device holds at least one non-blank byte.
    SkipBlank,
}

/// The result of [`write_dump_with_policy`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DumpOutcome {
    /// A dump was written, holding this many records.
    Written(usize),
    /// The device was blank, so nothing was written.
    SkippedBlank,
}

/// Like [`write_dump`], but under [`DumpPolicy::SkipBlank`] first scans the
/// device and writes nothing at all if it is blank.
pub fn write_dump_with_policy<B: ReadBus + ?Sized, W: io::Write>(
    bus: &mut B,
    writer: &mut W,
    format: HexFormat,
    policy: DumpPolicy,
) -> io::Result<DumpOutcome> {
    if policy == DumpPolicy::SkipBlank {
        let first = first_nonempty(bus);
        if first == ROM_SIZE {
            tracing::info!("{} is blank; skipping dump", bus.description());
            return Ok(DumpOutcome::SkippedBlank);
        }
        tracing::debug!("first non-blank byte at ${:04x}", first);
    }
    Ok(DumpOutcome::Written(write_dump(bus, writer, format)?))
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{
        DumpOutcome, DumpPolicy, dump, first_nonempty, is_blank, write_dump,
        write_dump_with_policy,
    };
    use crate::bus::ImageBus;
    use crate::hex::{EOF_LINE, HexCase, HexFormat, LineEnding, RecordKind};
    use crate::line::{LineId, SimLines, Wiring};
    use crate::rom::{ROM_SIZE, Upd2764};
    use proptest::prelude::*;

    fn image_bus(image: Vec<u8>) -> ImageBus {
        ImageBus::new(image.into_boxed_slice())
    }

    fn blank_image() -> Vec<u8> {
        vec![0xff; usize::from(ROM_SIZE)]
    }

    #[test]
    fn blank_device_returns_sentinel() {
        let mut bus = image_bus(blank_image());
        assert_eq!(first_nonempty(&mut bus), 8192);
        assert!(is_blank(&mut bus));
    }

    #[test]
    fn first_nonempty_finds_earliest() {
        let mut image = blank_image();
        image[0x0123] = 0x00;
        image[0x1000] = 0x42;
        let mut bus = image_bus(image);
        assert_eq!(first_nonempty(&mut bus), 0x0123);
        assert!(!is_blank(&mut bus));
    }

    #[test]
    fn last_byte_nonempty() {
        let mut image = blank_image();
        image[0x1fff] = 0xfe;
        let mut bus = image_bus(image);
        assert_eq!(first_nonempty(&mut bus), 0x1fff);
    }

    #[test]
    fn scan_short_circuits_in_ascending_order() {
        let mut image = vec![0xffu8; 0x1000];
        image[5] = 0x12;
        let lines = SimLines::new(Wiring::default(), image.into_boxed_slice());
        let mut rom = Upd2764::open(lines, Wiring::default()).unwrap();
        assert_eq!(first_nonempty(&mut rom), 5);
        assert_eq!(rom.lines().accesses(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn dump_has_513_records_in_order() {
        let mut bus = image_bus(blank_image());
        let records: Vec<_> = dump(&mut bus).collect();
        assert_eq!(records.len(), 513);
        for (index, record) in records[..512].iter().enumerate() {
            assert_eq!(record.kind(), RecordKind::Data);
            assert_eq!(usize::from(record.addr()), index * 16);
            assert_eq!(record.bytes().len(), 16);
        }
        assert_eq!(records[512].to_string(), EOF_LINE);
    }

    #[test]
    fn dump_size_hint() {
        let mut bus = image_bus(blank_image());
        let mut records = dump(&mut bus);
        assert_eq!(records.len(), 513);
        records.next();
        assert_eq!(records.len(), 512);
        let mut records = records.skip(511);
        assert!(records.next().is_some());
        assert!(records.next().is_none());
    }

    #[test]
    fn dump_reads_each_address_once_in_order() {
        let lines = SimLines::blank(Wiring::default(), 0x1000);
        let mut rom = Upd2764::open(lines, Wiring::default()).unwrap();
        assert_eq!(dump(&mut rom).count(), 513);
        let expected: Vec<u16> = (0..0x1000).chain(0..0x1000).collect();
        assert_eq!(rom.lines().accesses(), &expected[..]);
    }

    #[test]
    fn first_record_of_mostly_blank_device() {
        let mut image = blank_image();
        image[0] = 0x00;
        let mut bus = image_bus(image);
        let first = dump(&mut bus).next().unwrap();
        let expected = format!(":1000000000{}", "FF".repeat(16));
        assert_eq!(first.to_string(), expected);
    }

    #[test]
    fn write_dump_output() {
        let image: Vec<u8> = (0..ROM_SIZE).map(|addr| addr as u8).collect();
        let mut bus = image_bus(image);
        let mut output = Vec::new();
        let count =
            write_dump(&mut bus, &mut output, HexFormat::default()).unwrap();
        assert_eq!(count, 513);
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.split_terminator("\r\n").collect();
        assert_eq!(lines.len(), 513);
        assert_eq!(lines[0], ":10000000000102030405060708090A0B0C0D0E0F78");
        assert_eq!(lines[512], ":00000001FF");
        assert!(text.ends_with(":00000001FF\r\n"));
    }

    #[test]
    fn write_dump_lowercase_lf() {
        let mut bus = image_bus(vec![0xab; 16]);
        let mut output = Vec::new();
        let format =
            HexFormat { case: HexCase::Lower, line_ending: LineEnding::Lf };
        write_dump(&mut bus, &mut output, format).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with(&format!(":10000000{}", "ab".repeat(16))));
        assert!(!text.contains('\r'));
        assert!(text.ends_with("\n:00000001FF\n"));
    }

    #[test]
    fn dump_is_deterministic() {
        let image: Vec<u8> = (0..0x1000u32).map(|n| (n * 7) as u8).collect();
        let lines = SimLines::new(Wiring::default(), image.into_boxed_slice());
        let mut rom = Upd2764::open(lines, Wiring::default()).unwrap();
        let mut first = Vec::new();
        write_dump(&mut rom, &mut first, HexFormat::default()).unwrap();
        let mut second = Vec::new();
        write_dump(&mut rom, &mut second, HexFormat::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn skip_blank_policy() {
        let mut bus = image_bus(blank_image());
        let mut output = Vec::new();
        let outcome = write_dump_with_policy(
            &mut bus,
            &mut output,
            HexFormat::default(),
            DumpPolicy::SkipBlank,
        )
        .unwrap();
        assert_eq!(outcome, DumpOutcome::SkippedBlank);
        assert!(output.is_empty());

        let outcome = write_dump_with_policy(
            &mut bus,
            &mut output,
            HexFormat::default(),
            DumpPolicy::Always,
        )
        .unwrap();
        assert_eq!(outcome, DumpOutcome::Written(513));

        let mut image = blank_image();
        image[0x1ffe] = 0x00;
        let mut bus = image_bus(image);
        let mut output = Vec::new();
        let outcome = write_dump_with_policy(
            &mut bus,
            &mut output,
            HexFormat::default(),
            DumpPolicy::SkipBlank,
        )
        .unwrap();
        assert_eq!(outcome, DumpOutcome::Written(513));
    }

    fn thirteen_line_wiring() -> Wiring {
        let mut wiring = Wiring::default();
        wiring.address.push(LineId(60));
        wiring
    }

    proptest! {
        #[test]
        fn scan_stops_at_first_nonblank_byte(
            addr in 0..ROM_SIZE,
            value in 0u8..0xff,
        ) {
            let mut image = blank_image();
            image[usize::from(addr)] = value;
            let wiring = thirteen_line_wiring();
            let lines =
                SimLines::new(wiring.clone(), image.into_boxed_slice());
            let mut rom = Upd2764::open(lines, wiring).unwrap();
            prop_assert_eq!(first_nonempty(&mut rom), addr);
            let expected: Vec<u16> = (0..=addr).collect();
            prop_assert_eq!(rom.lines().accesses(), &expected[..]);
        }

        #[test]
        fn every_dumped_record_sums_to_zero(
            image in proptest::collection::vec(any::<u8>(), 8192),
        ) {
            let mut bus = image_bus(image.clone());
            for record in dump(&mut bus) {
                let bytes = record.to_bytes();
                let sum = bytes.iter().fold(0u8, |s, &b| s.wrapping_add(b));
                prop_assert_eq!(sum, 0);
                if record.kind() == RecordKind::Data {
                    let start = usize::from(record.addr());
                    prop_assert_eq!(record.bytes(), &image[start..start + 16]);
                }
            }
        }
    }
}

//===========================================================================//
