//! Error types for slot-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid interval: start {start} is not before end {end}")]
    InvalidInterval { start: String, end: String },

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Preference state error: {0}")]
    State(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure reported by a calendar collaborator.
///
/// The engine never propagates these: a failed read degrades to "no
/// information" and a failed write skips the affected chunk.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Calendar unavailable: {0}")]
    Unavailable(String),

    #[error("Calendar rejected request: {0}")]
    Rejected(String),
}
