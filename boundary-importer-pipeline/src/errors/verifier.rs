//! Violation types reported by the integrity verifier.
use thiserror::Error;

use boundary_importer_shared::types::EntityId;

/// One integrity violation found during a verification pass.
///
/// Violations are accumulated per table and reported together; the
/// verifier never stops at the first finding and never raises these
/// mid-import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationFailure {
    #[error("duplicate natural key {key}")]
    DuplicateKey { key: String },

    #[error("source feature {key} has no stored record")]
    MissingRecord { key: String },

    #[error("record {key} has no {column} reference")]
    MissingParent { key: String, column: String },

    #[error("record {key} references {column}={parent_id} which does not exist")]
    DanglingParent {
        key: String,
        column: String,
        parent_id: EntityId,
    },

    #[error("beat {key} division reference does not match its range's division")]
    InconsistentDivision { key: String },

    #[error("{owner_column}={owner_id} owns {count} polygons")]
    DuplicatePolygon {
        owner_column: String,
        owner_id: EntityId,
        count: usize,
    },

    #[error("polygon references {owner_column}={owner_id} which does not exist")]
    OrphanPolygon {
        owner_column: String,
        owner_id: EntityId,
    },
}
