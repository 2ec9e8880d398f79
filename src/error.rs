//! Error types for the demex library.

use std::io;
use thiserror::Error;

/// Result type alias for demex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during statement extraction.
///
/// Note that a document whose title matches no known layout is *not* an
/// `Err` at the public boundary: the dispatcher reports it as a
/// [`DocumentResult::Failed`](crate::model::DocumentResult) value so callers
/// always receive a well-formed result object.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading a page dump.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a valid page dump (malformed JSON, wrong shape).
    #[error("Invalid page dump: {0}")]
    InvalidInput(String),

    /// The document title could not be read at all.
    #[error("Could not extract document title")]
    TitleMissing,

    /// A fault inside a layout pipeline (bad geometry, out-of-range line).
    ///
    /// Caught at the dispatcher boundary and converted into a failure
    /// result; it never crosses the public API as a panic.
    #[error("Extraction error: {0}")]
    Extraction(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TitleMissing;
        assert_eq!(err.to_string(), "Could not extract document title");

        let err = Error::Extraction("line 7 out of range".into());
        assert_eq!(err.to_string(), "Extraction error: line 7 out of range");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<Vec<u8>>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
