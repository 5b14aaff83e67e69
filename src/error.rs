//! Error types for the swift_mt library.
//!
//! Every parse-time failure carries the 1-based source line where the
//! offending field starts. Value-level decoders (IBAN, BIC, bare notation
//! matching) have no line of their own and leave it empty; the field
//! decoders fill it in through [`Error::at_line`].

use std::io;
use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while tokenizing, assembling and decoding messages.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred during read or write operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error writing CSV output.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// A notation string could not be compiled.
    #[error("Invalid notation '{notation}': {message}")]
    InvalidNotation { notation: String, message: String },

    /// Field content does not match its notation.
    #[error("Notation mismatch{} for '{notation}': {message}", location(.line))]
    NotationMismatch {
        line: Option<usize>,
        notation: String,
        message: String,
    },

    /// IBAN check digits disagree with the recomputed value.
    #[error("Checksum mismatch{}: expected check digits {expected}, found {actual}", location(.line))]
    ChecksumMismatch {
        line: Option<usize>,
        expected: String,
        actual: String,
    },

    /// A field appeared where the message grammar does not allow it.
    #[error("Unexpected field :{actual}: at line {line}, expected one of {}", tag_list(.expected))]
    UnexpectedField {
        line: usize,
        expected: Vec<String>,
        actual: String,
    },

    /// The message or the input ended before the grammar was complete.
    #[error("Unexpected end of message at line {line}, expected one of {}", tag_list(.expected))]
    UnexpectedEndOfMessage { line: usize, expected: Vec<String> },

    /// A mandatory field is absent from a page.
    #[error("Missing field :{tag}: in message starting at line {line}")]
    MissingField { line: usize, tag: String },

    /// Content was found before the first `:<tag>:` marker.
    #[error("Missing field tag at line {line}")]
    MissingFieldTag { line: usize },

    /// A narrative field id occurs more than once.
    #[error("Duplicate field id '{id}'{}", location(.line))]
    DuplicateField { line: Option<usize>, id: String },

    /// Trailing text that no decoding rule accounts for.
    #[error("Unparsed remainder{}: '{remainder}'", location(.line))]
    UnparsedRemainder {
        line: Option<usize>,
        remainder: String,
    },

    /// Transaction type identification code outside the known table.
    #[error("Unknown transaction code '{code}'{}", location(.line))]
    UnknownTransactionCode { line: Option<usize>, code: String },

    /// Invalid date format.
    #[error("Invalid date '{value}'{}", location(.line))]
    InvalidDate { line: Option<usize>, value: String },

    /// Invalid amount format.
    #[error("Invalid amount '{value}'{}", location(.line))]
    InvalidAmount { line: Option<usize>, value: String },

    /// No candidate year yields a valid date for a month-day entry date.
    #[error("Cannot resolve entry date {month_day} against {reference}")]
    UnresolvableEntryDate { month_day: String, reference: String },

    /// Invalid message type specified.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl Error {
    /// Attach a source line to a line-less decoding error.
    ///
    /// Errors that already know their line keep it.
    pub fn at_line(mut self, at: usize) -> Self {
        match &mut self {
            Error::NotationMismatch { line, .. }
            | Error::ChecksumMismatch { line, .. }
            | Error::DuplicateField { line, .. }
            | Error::UnparsedRemainder { line, .. }
            | Error::UnknownTransactionCode { line, .. }
            | Error::InvalidDate { line, .. }
            | Error::InvalidAmount { line, .. } => {
                line.get_or_insert(at);
            }
            _ => {}
        }
        self
    }

    /// The 1-based source line, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::NotationMismatch { line, .. }
            | Error::ChecksumMismatch { line, .. }
            | Error::DuplicateField { line, .. }
            | Error::UnparsedRemainder { line, .. }
            | Error::UnknownTransactionCode { line, .. }
            | Error::InvalidDate { line, .. }
            | Error::InvalidAmount { line, .. } => *line,
            Error::UnexpectedField { line, .. }
            | Error::UnexpectedEndOfMessage { line, .. }
            | Error::MissingField { line, .. }
            | Error::MissingFieldTag { line } => Some(*line),
            _ => None,
        }
    }
}

fn location(line: &Option<usize>) -> String {
    line.map(|l| format!(" at line {}", l)).unwrap_or_default()
}

fn tag_list(tags: &[String]) -> String {
    if tags.is_empty() {
        return "(none)".to_string();
    }
    tags.iter()
        .map(|t| format!(":{}:", t))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_at_line_fills_missing_line() {
        let err = Error::DuplicateField {
            line: None,
            id: "20".into(),
        }
        .at_line(7);
        assert_eq!(err.line(), Some(7));
        assert_eq!(err.to_string(), "Duplicate field id '20' at line 7");
    }

    #[test]
    fn test_at_line_keeps_known_line() {
        let err = Error::InvalidDate {
            line: Some(3),
            value: "991332".into(),
        }
        .at_line(9);
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_unexpected_field_message() {
        let err = Error::UnexpectedField {
            line: 4,
            expected: vec!["21".into(), "25".into()],
            actual: "61".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unexpected field :61: at line 4, expected one of :21:, :25:"
        );
    }
}
