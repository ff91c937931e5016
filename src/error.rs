//! Error type shared by every module of the crate.

use thiserror::Error;

/// Errors raised while loading instances, building distance tables or
/// running a single comparison method.
#[derive(Debug, Error)]
pub enum Error {
    /// A distance lookup referenced a point id that is not part of the matrix.
    #[error("point id {0} is not part of the distance matrix")]
    KeyNotFound(usize),
    /// Inputs violate a precondition (duplicate ids, `p` out of range, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Malformed instance file.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid<S: Into<String>>(message: S) -> Self {
        Error::InvalidInput(message.into())
    }
}
