//! Error types for the resolver module of the boundary importer pipeline.
//! Defines the ways a feature can fail to resolve to a parent entity.
use thiserror::Error;

use boundary_importer_shared::types::Level;

/// Represents a feature whose parent could not be determined.
///
/// Resolution failures are never fatal: the feature is excluded from all
/// writes, recorded on the layer report, and the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionFailure {
    #[error("{level} {feature} is missing key field {field}")]
    MissingKeyField {
        level: Level,
        feature: String,
        field: String,
    },

    #[error("{level} {feature}: no parent found for key {key}")]
    ParentNotFound {
        level: Level,
        feature: String,
        key: String,
    },

    #[error("{level} {feature} has an empty geometry")]
    EmptyGeometry { level: Level, feature: String },

    #[error("{level} {feature}: no parent polygon contains its centroid")]
    Orphaned { level: Level, feature: String },
}
