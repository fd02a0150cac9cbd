//! Error types for the coordinate export.
use thiserror::Error;

/// Represents errors raised while writing the coordinate export file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize export records: {0}")]
    Serialize(#[from] serde_json::Error),
}
