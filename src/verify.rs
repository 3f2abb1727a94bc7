//! Facilities for comparing a device's contents against an expected image.

use crate::rom::BLANK_BYTE;
use std::fmt;

//===========================================================================//

/// The most differing addresses listed when a [`Verification`] is displayed.
const MAX_LISTED: usize = 10;

//===========================================================================//

/// Returns the addresses at which two images differ, in ascending order.
/// The shorter image is treated as though it were padded with blank (0xff)
/// bytes.
pub fn differences(actual: &[u8], expected: &[u8]) -> Vec<usize> {
    let len = actual.len().max(expected.len());
    let byte_at = |image: &[u8], addr: usize| {
        image.get(addr).copied().unwrap_or(BLANK_BYTE)
    };
    (0..len)
        .filter(|&addr| byte_at(actual, addr) != byte_at(expected, addr))
        .collect()
}

//===========================================================================//

/// The result of comparing a device against an expected image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Verification {
    compared: usize,
    mismatches: Vec<usize>,
}

impl Verification {
    /// Compares the two images.
    pub fn new(actual: &[u8], expected: &[u8]) -> Verification {
        Verification {
            compared: actual.len().max(expected.len()),
            mismatches: differences(actual, expected),
        }
    }

    /// Returns the number of bytes compared.
    pub fn compared(&self) -> usize {
        self.compared
    }

    /// Returns the addresses that differ.
    pub fn mismatches(&self) -> &[usize] {
        &self.mismatches
    }

    /// Returns true if the images are identical.
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        if self.is_match() {
            return write!(f, "all {} bytes match", self.compared);
        }
        write!(
            f,
            "{} of {} bytes differ:",
            self.mismatches.len(),
            self.compared
        )?;
        for addr in self.mismatches.iter().take(MAX_LISTED) {
            write!(f, " ${addr:04x}")?;
        }
        if self.mismatches.len() > MAX_LISTED {
            f.write_str(" ...")?;
        }
        Ok(())
    }
}

//===========================================================================//


//===========================================================================//
