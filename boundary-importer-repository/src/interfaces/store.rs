//! This module defines the `BoundaryStore` trait, which provides an
//! interface for interacting with the remote store holding divisions,
//! ranges, beats, and their polygons. It abstracts the store so the
//! pipeline can run against the live REST backend or an in-memory mock.
use serde_json::Value;

use crate::errors::RemoteWriteError;
use boundary_importer_shared::types::EntityId;

/// The result of an upsert: the row's identifier and whether the call
/// created it or updated an existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: EntityId,
    pub created: bool,
}

/// A trait that defines the interface for the remote boundary store.
///
/// Implementors provide insert-or-update semantics keyed on a table's
/// unique columns, plus a plain read used for code preloading and
/// post-import verification.
#[async_trait::async_trait]
pub trait BoundaryStore: Send + Sync {
    /// Inserts or updates one row.
    ///
    /// Null-valued fields are stripped from `payload` before transmission
    /// (the store treats omission differently from explicit null). The
    /// operation performs exactly one lookup on the `unique_key` columns
    /// followed by exactly one write, with no retries.
    ///
    /// # Arguments
    ///
    /// * `table` - Collection name, e.g. `"divisions"`.
    /// * `unique_key` - Column names forming the table's natural key.
    /// * `payload` - Row content as a JSON object.
    ///
    /// # Returns
    ///
    /// The stored row's id and whether it was created, or a
    /// [`RemoteWriteError`] on any non-success response.
    async fn upsert(
        &self,
        table: &str,
        unique_key: &[&str],
        payload: Value,
    ) -> Result<UpsertOutcome, RemoteWriteError>;

    /// Reads all rows of a table, optionally projected to a comma-separated
    /// column list.
    async fn fetch_rows(
        &self,
        table: &str,
        select: Option<&str>,
    ) -> Result<Vec<Value>, RemoteWriteError>;
}
