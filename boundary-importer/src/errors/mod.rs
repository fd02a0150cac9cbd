//! Error types for the boundary importer application.
//! Defines a comprehensive set of errors that can occur during a run,
//! consolidating errors from the pipeline and the repository.
use boundary_importer_pipeline::errors::{ExportError, ImportError, SourceReadError};
use boundary_importer_repository::RemoteWriteError;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Source error: {0}")]
    Source(#[from] SourceReadError),
    #[error("Import error: {0}")]
    Import(#[from] ImportError),
    #[error("Store error: {0}")]
    Store(#[from] RemoteWriteError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}
