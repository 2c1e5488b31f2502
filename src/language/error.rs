use serde::Serialize;
use std::{fmt, path::Path};

/// A problem found somewhere in a ChalkTalk document. Row and column are
/// zero-origin; a value of -1 means the position is unknown (typically
/// "end of input").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub message: String,
    pub row: i32,
    pub column: i32,
}

impl ParseError {
    pub fn new(message: impl Into<String>, row: i32, column: i32) -> ParseError {
        ParseError {
            message: message.into(),
            row,
            column,
        }
    }

    /// An error whose position we cannot pin down, usually because the
    /// input ended before we got what we were looking for.
    pub fn at_end(message: impl Into<String>) -> ParseError {
        ParseError::new(message, -1, -1)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.row < 0 {
            write!(f, "error: {}", self.message)
        } else {
            write!(
                f,
                "error: {}:{} {}",
                self.row + 1,
                self.column + 1,
                self.message
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingError<'i> {
    pub problem: String,
    pub details: String,
    pub filename: &'i Path,
}

impl<'i> fmt::Display for LoadingError<'i> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.problem, self.details)
    }
}

#[cfg(test)]
mod check {
    use super::*;

    #[test]
    fn display_forms() {
        let e = ParseError::new("Unrecognized character '∆'", 3, 7);
        assert_eq!(e.to_string(), "error: 4:8 Unrecognized character '∆'");

        let e = ParseError::at_end("Expected a means: section");
        assert_eq!(e.row, -1);
        assert_eq!(e.column, -1);
        assert_eq!(e.to_string(), "error: Expected a means: section");
    }
}
