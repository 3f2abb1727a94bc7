use std::fmt;

//===========================================================================//

/// A location within a HEX file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SrcLoc {
    /// The one-based line number.
    pub line: u32,
    /// The zero-based byte offset within the line.
    pub column: usize,
}

impl fmt::Display for SrcLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "line {}, column {}", self.line, self.column + 1)
    }
}

//===========================================================================//

/// An error encountered while parsing a HEX file.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{location}: {message}")]
pub struct ParseError {
    /// The location in the file where the error occurred.
    pub location: SrcLoc,
    /// The error message to report to the user.
    pub message: String,
}

impl ParseError {
    /// Constructs a parse error at the given location.
    pub fn new<S: Into<String>>(location: SrcLoc, message: S) -> ParseError {
        ParseError { location, message: message.into() }
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{ParseError, SrcLoc};

    #[test]
    fn display() {
        let error =
            ParseError::new(SrcLoc { line: 3, column: 0 }, "bad checksum");
        assert_eq!(error.to_string(), "line 3, column 1: bad checksum");
    }
}

//===========================================================================//
