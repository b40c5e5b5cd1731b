use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the host-side layers (input, settings, player runtime).
///
/// The engine itself never fails: redundant commands are no-ops and the end
/// of a sequence is an ordinary state transition.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid JSON at line {line}: {source}")]
    JsonLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not find column with names: {0:?}")]
    MissingColumn(Vec<String>),

    #[error("Invalid frame time at record {record}: {reason}")]
    InvalidTime { record: usize, reason: String },

    #[error("Unknown input format: {0}")]
    UnknownFormat(PathBuf),

    #[error("Player is no longer running")]
    PlayerClosed,
}

pub type Result<T> = std::result::Result<T, ReplayError>;
