//! Error types for forecast-ledger

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Unique-constraint violation on insert. Recoverable: callers treat it
    /// as "already exists" and implement insert-or-ignore semantics.
    #[error("Duplicate identity: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
