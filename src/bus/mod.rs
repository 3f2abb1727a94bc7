//! Facilities for reading bytes out of a ROM address space.

use crate::rom::ROM_SIZE;
use std::io::{self, Read};

mod image;

pub use image::ImageBus;

//===========================================================================//

/// A read-only memory bus covering the device's address space.
///
/// Implementations should ignore address bits higher than the width of their
/// address bus, as though those physical address lines weren't connected,
/// effectively mirroring memory across the larger range.  Implementations
/// should *not* panic when given an address that is out of range.
pub trait ReadBus {
    /// Returns a human-readable description of this memory bus.
    fn description(&self) -> String;

    /// Reads a single byte from memory.
    ///
    /// Note that this is a `&mut self` method, since reading real hardware
    /// means driving its lines.
    fn read_byte(&mut self, addr: u16) -> u8;
}

//===========================================================================//

/// Adapts a [`ReadBus`] into an [`io::Read`] that yields each byte of the
/// device's address space in order, and then reaches end-of-file.
pub struct BusReader<'a, B: ?Sized> {
    bus: &'a mut B,
    addr: u32,
}

impl<'a, B: ReadBus + ?Sized> BusReader<'a, B> {
    /// Returns a reader that starts at the given address.
    pub fn new(bus: &'a mut B, start_addr: u16) -> BusReader<'a, B> {
        BusReader { bus, addr: u32::from(start_addr) }
    }
}

impl<B: ReadBus + ?Sized> Read for BusReader<'_, B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut count = 0;
        for byte in buf.iter_mut() {
            if self.addr >= u32::from(ROM_SIZE) {
                break;
            }
            *byte = self.bus.read_byte(self.addr as u16);
            self.addr += 1;
            count += 1;
        }
        Ok(count)
    }
}

/// Reads the device's entire address space into memory.
pub fn read_image<B: ReadBus + ?Sized>(bus: &mut B) -> io::Result<Vec<u8>> {
    let mut image = Vec::with_capacity(usize::from(ROM_SIZE));
    BusReader::new(bus, 0).read_to_end(&mut image)?;
    Ok(image)
}

//===========================================================================//


//===========================================================================//
