//! Error types for the boundary store.
//! Defines specific errors that can occur while reading from or writing to
//! the remote store.
use thiserror::Error;

/// Represents errors raised by boundary store operations.
///
/// Write failures carry the store's status and response body so callers can
/// log the full detail before deciding to skip or abort.
#[derive(Debug, Error)]
pub enum RemoteWriteError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store returned {status}: {message}")]
    Store { status: u16, message: String },

    #[error("invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("payload for table {table} must be a JSON object")]
    InvalidPayload { table: String },

    #[error("payload for table {table} is missing unique key field {field}")]
    MissingKeyField { table: String, field: String },

    #[error("store response for table {table} carries no id")]
    MissingId { table: String },
}
