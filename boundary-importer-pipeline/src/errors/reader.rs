//! Error types for the reader module of the boundary importer pipeline.
//! Defines specific errors that can occur while loading a boundary layer.
use std::path::PathBuf;

use thiserror::Error;

/// Represents fatal errors raised while reading a boundary layer.
///
/// Any of these aborts the run: a layer that cannot be opened, parsed, or
/// brought into WGS84 leaves nothing sensible to import. Per-feature
/// geometry problems are not in this enum; those are skipped and reported
/// through the collection's skip list.
#[derive(Debug, Error)]
pub enum SourceReadError {
    #[error("failed to open boundary layer {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: shapefile::Error,
    },

    #[error("malformed feature in boundary layer {path:?}: {source}")]
    Malformed {
        path: PathBuf,
        source: shapefile::Error,
    },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no projection available for EPSG {epsg}")]
    UnknownCrs { epsg: u32 },

    #[error("reprojection to WGS84 failed: {0}")]
    Projection(String),
}
