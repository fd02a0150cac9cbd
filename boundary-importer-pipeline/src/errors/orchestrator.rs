//! Error types for the orchestrator module of the boundary importer
//! pipeline. Defines specific errors that can occur while driving the
//! per-layer import.
use thiserror::Error;

use boundary_importer_repository::RemoteWriteError;

/// Represents errors that abort the import run.
///
/// Per-feature store failures are logged and counted instead; only the
/// preloading reads that a layer pass depends on surface here.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("boundary store error: {0}")]
    Store(#[from] RemoteWriteError),
}
