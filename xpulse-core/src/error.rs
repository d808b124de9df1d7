//! Error taxonomy for the tracker core.

use thiserror::Error;

/// Persistence failures, surfaced to callers unmodified.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read/write task sheet: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode/decode task sheet: {0}")]
    Csv(#[from] csv::Error),

    #[error("task sheet is corrupt: {0}")]
    Corrupt(String),
}

/// Errors returned by the lifecycle controller and calendar.
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("task '{0}' not found")]
    NotFound(String),

    #[error("task '{0}' is already completed")]
    AlreadyCompleted(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
