//! Error types for exposition decoding.

use thiserror::Error;

/// A payload that is not valid Prometheus text exposition format.
/// Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line {line}: malformed sample: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("line {line}: invalid value {value:?}")]
    InvalidValue { line: usize, value: String },

    #[error("line {line}: unterminated label set")]
    UnterminatedLabels { line: usize },

    #[error("line {line}: unknown metric type {kind:?}")]
    InvalidKind { line: usize, kind: String },

    #[error("line {line}: label {label:?} appears more than once")]
    DuplicateLabel { line: usize, label: String },
}

pub type ParseResult<T> = Result<T, ParseError>;
