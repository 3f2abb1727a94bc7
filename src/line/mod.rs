//! Facilities for driving the electrical lines that connect to a ROM chip.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

mod sim;
mod sysfs;
mod wiring;

pub use sim::{LineEvent, SimLines};
pub use sysfs::SysfsLines;
pub use wiring::{Wiring, WiringError};

//===========================================================================//

/// Identifies a single general-purpose I/O line (e.g. a GPIO number).
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
#[serde(transparent)]
pub struct LineId(pub u32);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "line {}", self.0)
    }
}

//===========================================================================//

/// The logic level of a line.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Level {
    /// Logic low (0).
    Low,
    /// Logic high (1).
    High,
}

impl Level {
    /// Returns the level for a single bit: `Low` for 0, `High` for 1.
    pub fn from_bit(bit: bool) -> Level {
        if bit { Level::High } else { Level::Low }
    }

    /// Returns true if this is `Level::High`.
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

/// The electrical direction of a line.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Direction {
    /// The line is sampled by us.
    Input,
    /// The line is driven by us.
    Output,
}

//===========================================================================//

/// An error reported by a [`LineDriver`] while configuring its lines.
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    /// The backend could not take control of a line.
    #[error("{line} is unavailable: {source}")]
    Unavailable {
        /// The line that could not be configured.
        line: LineId,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

//===========================================================================//

/// A backend capable of driving and sampling individual I/O lines.
///
/// Only changing a line's direction can fail; this happens while a session is
/// being set up.  Once a line is configured, setting and sampling its level
/// always succeeds from the caller's point of view, even if the backend has
/// to paper over a failure (reads from a broken line report `Level::High`,
/// the same as a floating, pulled-up data line).
pub trait LineDriver {
    /// Returns a human-readable description of this line driver.
    fn description(&self) -> String;

    /// Changes the direction of the given line.
    fn set_direction(
        &mut self,
        line: LineId,
        direction: Direction,
    ) -> Result<(), LineError>;

    /// Sets the output level of the given line.  If the line is currently an
    /// input, the level takes effect when it becomes an output.
    fn set_level(&mut self, line: LineId, level: Level);

    /// Samples the current level of the given line.
    fn get_level(&mut self, line: LineId) -> Level;

    /// Blocks for (at least) the given number of microseconds.
    fn delay_us(&mut self, micros: u32);
}

impl<D: LineDriver + ?Sized> LineDriver for Box<D> {
    fn description(&self) -> String {
        (**self).description()
    }

    fn set_direction(
        &mut self,
        line: LineId,
        direction: Direction,
    ) -> Result<(), LineError> {
        (**self).set_direction(line, direction)
    }

    fn set_level(&mut self, line: LineId, level: Level) {
        (**self).set_level(line, level)
    }

    fn get_level(&mut self, line: LineId) -> Level {
        (**self).get_level(line)
    }

    fn delay_us(&mut self, micros: u32) {
        (**self).delay_us(micros)
    }
}

//===========================================================================//


//===========================================================================//
