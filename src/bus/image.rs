use super::ReadBus;

//===========================================================================//

/// An in-memory ROM image.  Reads beyond the image size will be mirrored.
pub struct ImageBus {
    image: Box<[u8]>,
}

impl ImageBus {
    /// Returns a new bus using the given byte array as the contents of ROM.
    /// Panics if the length of the byte array is not a power of 2.
    pub fn new(image: Box<[u8]>) -> ImageBus {
        assert!(image.len().is_power_of_two());
        ImageBus { image }
    }

    /// Returns the size of the image in bytes.
    pub fn size(&self) -> usize {
        self.image.len()
    }
}

impl ReadBus for ImageBus {
    fn description(&self) -> String {
        let size = self.image.len();
        if size < 1024 {
            format!("{size}B image")
        } else {
            format!("{}kB image", size >> 10)
        }
    }

    fn read_byte(&mut self, addr: u16) -> u8 {
        self.image[(addr as usize) & (self.image.len() - 1)]
    }
}

//===========================================================================//


//===========================================================================//
