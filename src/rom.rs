//! Facilities for reading a parallel EPROM by driving its pins directly.

use crate::bus::ReadBus;
use crate::line::{Direction, Level, LineDriver, LineError, Wiring};
use serde::{Deserialize, Serialize};

//===========================================================================//

/// The number of bytes in the device (a 2764 holds 64 kbit).
pub const ROM_SIZE: u16 = 0x2000;

/// The value of every byte in an erased device.
pub const BLANK_BYTE: u8 = 0xff;

//===========================================================================//

/// An error describing unusable read timing.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TimingError {
    /// The device would be sampled before its outputs are valid.
    #[error(
        "output enable to data delay of {actual}us is shorter than the \
         required {minimum}us"
    )]
    DataNotValid {
        /// The configured delay.
        actual: u32,
        /// The shortest delay the device tolerates.
        minimum: u32,
    },
}

//===========================================================================//

/// The delays (in microseconds) that make up a single read cycle.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timing {
    /// From presenting the address to asserting chip enable.
    pub address_setup_us: u32,
    /// From asserting chip enable to asserting output enable.
    pub chip_enable_to_output_enable_us: u32,
    /// From asserting output enable to sampling the data lines.
    pub output_enable_to_data_us: u32,
    /// From sampling the data lines to releasing output enable.
    pub data_hold_us: u32,
    /// From releasing chip enable to the end of the cycle.
    pub chip_disable_us: u32,
}

impl Timing {
    /// The shortest output enable to data delay for which the sampled value
    /// is electrically valid.
    pub const MIN_OUTPUT_ENABLE_TO_DATA_US: u32 = 100;

    /// Returns the total duration of one read cycle.
    pub fn cycle_us(&self) -> u64 {
        [
            self.address_setup_us,
            self.chip_enable_to_output_enable_us,
            self.output_enable_to_data_us,
            self.data_hold_us,
            self.chip_disable_us,
        ]
        .into_iter()
        .map(u64::from)
        .sum()
    }

    /// Checks that these delays produce valid reads.
    pub fn check(&self) -> Result<(), TimingError> {
        let minimum = Timing::MIN_OUTPUT_ENABLE_TO_DATA_US;
        if self.output_enable_to_data_us < minimum {
            return Err(TimingError::DataNotValid {
                actual: self.output_enable_to_data_us,
                minimum,
            });
        }
        Ok(())
    }
}

impl Default for Timing {
    fn default() -> Timing {
        Timing {
            address_setup_us: 10,
            chip_enable_to_output_enable_us: 10,
            output_enable_to_data_us: 100,
            data_hold_us: 10,
            chip_disable_us: 10,
        }
    }
}

//===========================================================================//

/// A uPD2764-compatible EPROM attached to a set of I/O lines.
///
/// This owns the line driver for the whole session; nothing else may touch
/// the lines while a read is in progress.
pub struct Upd2764<D> {
    lines: D,
    wiring: Wiring,
    timing: Timing,
}

impl<D: LineDriver> Upd2764<D> {
    /// Returns a device on the given lines, with the default timing.  The
    /// lines are not touched until [`Upd2764::initialize`] is called.
    pub fn new(lines: D, wiring: Wiring) -> Upd2764<D> {
        Upd2764 { lines, wiring, timing: Timing::default() }
    }

    /// Like [`Upd2764::new`], but also initializes the lines.
    pub fn open(lines: D, wiring: Wiring) -> Result<Upd2764<D>, LineError> {
        let mut rom = Upd2764::new(lines, wiring);
        rom.initialize()?;
        Ok(rom)
    }

    /// Replaces the read cycle timing.
    pub fn with_timing(mut self, timing: Timing) -> Upd2764<D> {
        self.timing = timing;
        self
    }

    /// Returns the read cycle timing.
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Returns the lines this device is attached to.
    pub fn wiring(&self) -> &Wiring {
        &self.wiring
    }

    /// Returns the underlying line driver.
    pub fn lines(&self) -> &D {
        &self.lines
    }

    /// Releases the underlying line driver.
    pub fn into_lines(self) -> D {
        self.lines
    }

    /// Configures the direction and idle level of every line.
    ///
    /// The control lines are set to their inactive (high) level before they
    /// become outputs, so the device never sees a spurious enable pulse.
    /// Calling this again on an undisturbed device has no further effect.
    pub fn initialize(&mut self) -> Result<(), LineError> {
        tracing::debug!("initializing {}", self.lines.description());
        for &line in self.wiring.address.iter() {
            self.lines.set_direction(line, Direction::Output)?;
        }
        for &line in self.wiring.data.iter() {
            self.lines.set_direction(line, Direction::Input)?;
        }
        let controls: Vec<_> = self.wiring.control_lines().collect();
        for &line in controls.iter() {
            self.lines.set_level(line, Level::High);
        }
        for &line in controls.iter() {
            self.lines.set_direction(line, Direction::Output)?;
        }
        Ok(())
    }

    /// Performs one complete read cycle at the given address.
    ///
    /// Address bits beyond the wired address lines are not driven.  This
    /// always returns some value; it is only meaningful if the device is
    /// present and the timing suits it.
    pub fn read_byte(&mut self, addr: u16) -> u8 {
        for (bit, &line) in self.wiring.address.iter().enumerate() {
            let level = Level::from_bit((u32::from(addr) >> bit) & 1 != 0);
            self.lines.set_level(line, level);
        }
        self.lines.delay_us(self.timing.address_setup_us);
        self.lines.set_level(self.wiring.chip_enable, Level::Low);
        self.lines.delay_us(self.timing.chip_enable_to_output_enable_us);
        self.lines.set_level(self.wiring.output_enable, Level::Low);
        self.lines.delay_us(self.timing.output_enable_to_data_us);
        let mut data = 0u8;
        for (bit, &line) in self.wiring.data.iter().enumerate() {
            if self.lines.get_level(line).is_high() {
                data |= 1 << bit;
            }
        }
        self.lines.delay_us(self.timing.data_hold_us);
        self.lines.set_level(self.wiring.output_enable, Level::High);
        self.lines.set_level(self.wiring.chip_enable, Level::High);
        self.lines.delay_us(self.timing.chip_disable_us);
        tracing::trace!("read ${:04x} -> ${:02x}", addr, data);
        data
    }
}

impl<D: LineDriver> ReadBus for Upd2764<D> {
    fn description(&self) -> String {
        format!("uPD2764 via {}", self.lines.description())
    }

    fn read_byte(&mut self, addr: u16) -> u8 {
        Upd2764::read_byte(self, addr)
    }
}

//===========================================================================//


//===========================================================================//
