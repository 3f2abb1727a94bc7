use super::LineId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

//===========================================================================//

/// The maximum number of address lines a [`Wiring`] may declare.
const MAX_ADDRESS_LINES: usize = 16;

//===========================================================================//

/// An error describing an inconsistent [`Wiring`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum WiringError {
    /// No address lines were declared.
    #[error("at least one address line is required")]
    NoAddressLines,
    /// More address lines were declared than an address can use.
    #[error("{0} address lines declared, but at most 16 are supported")]
    TooManyAddressLines(usize),
    /// The same line was assigned to more than one signal.
    #[error("{0} is assigned to more than one signal")]
    DuplicateLine(LineId),
}

//===========================================================================//

/// Describes which I/O line is connected to each pin of the ROM chip.
///
/// Address line `i` in `address` carries bit `i` of the address, and data line
/// `i` in `data` carries bit `i` of the byte.  The chip's control pins are all
/// active-low.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Wiring {
    /// The lines connected to the chip's address pins, starting with A0.
    pub address: Vec<LineId>,
    /// The lines connected to the chip's data pins, starting with D0.
    pub data: [LineId; 8],
    /// The line connected to the chip enable (`/CE`) pin.
    pub chip_enable: LineId,
    /// The line connected to the output enable (`/OE`) pin.
    pub output_enable: LineId,
    /// The line connected to the program/write enable pin, if it is wired at
    /// all.  It is held inactive for the whole session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_enable: Option<LineId>,
}

impl Wiring {
    /// Returns an iterator over the lines that are driven as outputs.
    pub fn output_lines(&self) -> impl Iterator<Item = LineId> + '_ {
        self.address.iter().copied().chain(self.control_lines())
    }

    /// Returns an iterator over the active-low control lines.
    pub fn control_lines(&self) -> impl Iterator<Item = LineId> + '_ {
        [self.chip_enable, self.output_enable]
            .into_iter()
            .chain(self.write_enable)
    }

    /// Returns the largest address (exclusive) that can be fully presented on
    /// the address lines.  Address bits beyond the wired lines are not driven.
    pub fn addressable_size(&self) -> usize {
        1 << self.address.len().min(MAX_ADDRESS_LINES)
    }

    /// Checks that this wiring is self-consistent.
    pub fn validate(&self) -> Result<(), WiringError> {
        if self.address.is_empty() {
            return Err(WiringError::NoAddressLines);
        }
        if self.address.len() > MAX_ADDRESS_LINES {
            return Err(WiringError::TooManyAddressLines(self.address.len()));
        }
        let mut seen = HashSet::<LineId>::new();
        let all = self.output_lines().chain(self.data.iter().copied());
        for line in all {
            if !seen.insert(line) {
                return Err(WiringError::DuplicateLine(line));
            }
        }
        Ok(())
    }
}

impl Default for Wiring {
    /// The pin assignments of the reference reader board (an Arduino Mega
    /// driving a uPD2764D).  Only A0 through A11 are wired.
    fn default() -> Wiring {
        Wiring {
            address: [37, 36, 35, 34, 33, 32, 69, 68, 67, 66, 65, 64]
                .into_iter()
                .map(LineId)
                .collect(),
            data: [22, 23, 24, 25, 26, 27, 28, 29].map(LineId),
            chip_enable: LineId(63),
            output_enable: LineId(62),
            write_enable: Some(LineId(61)),
        }
    }
}

//===========================================================================//


//===========================================================================//
