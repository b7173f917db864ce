//! Record and stage parse errors

use thiserror::Error;

/// A record (or a derived stage of it) that cannot be trusted.
///
/// Every variant is fatal for the record it came from. Callers skip the
/// record; they never patch it up with default values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Empty record")]
    Empty,

    #[error("Malformed line {line:?}: {reason}")]
    MalformedLine { line: String, reason: &'static str },

    #[error("Invalid integer {value:?} for {field}")]
    InvalidInteger { field: &'static str, value: String },

    #[error("Unknown header key: {0}")]
    UnknownHeader(String),

    #[error("Duplicate header key: {0}")]
    DuplicateHeader(String),

    #[error("Missing header key: {0}")]
    MissingHeader(&'static str),

    #[error("Invalid result: {0}")]
    InvalidResult(String),

    #[error("Invalid move notation: {0}")]
    InvalidMove(String),

    #[error("Move {index} has no black half but is not the last move")]
    MissingBlackMove { index: usize },

    #[error("Move number {found} out of sequence, expected {expected}")]
    MoveNumber { expected: usize, found: usize },

    #[error("PlyCount {ply_count} does not match {moves} parsed moves")]
    PlyCountMismatch { ply_count: u32, moves: usize },

    #[error("Missing section marker: {0}")]
    MissingSection(&'static str),

    #[error("Sampled index {index} out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Sampled index {0} listed twice")]
    DuplicateIndex(usize),

    #[error("Sampled move mismatch at {index}: record has {expected}, found {found}")]
    MoveMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Section {section} inconsistent: {reason}")]
    Inconsistent {
        section: &'static str,
        reason: String,
    },

    #[error("Game {0} has no winner")]
    NoWinner(u32),

    #[error("Game {id} has no winner move at move {index}")]
    MissingWinnerMove { id: u32, index: usize },
}

impl RecordError {
    pub(crate) fn malformed(line: &str, reason: &'static str) -> Self {
        RecordError::MalformedLine {
            line: line.to_string(),
            reason,
        }
    }

    pub(crate) fn inconsistent(section: &'static str, reason: impl Into<String>) -> Self {
        RecordError::Inconsistent {
            section,
            reason: reason.into(),
        }
    }
}
