use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Whole-statement failures. Per-row problems never surface here; they end up
/// in the quality report instead.
#[derive(Debug, Error)]
pub enum StatementError {
    #[error("statement text is empty")]
    Empty,

    #[error("reading statement {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("statement parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("transfer direction could not be determined for message {message_id}")]
    DirectionUndetectable { message_id: String },

    #[error("writing failure log {path}: {source}")]
    FailureLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("serializing failure entry: {0}")]
    Serialize(#[from] serde_json::Error),
}
