//! Mock boundary store for testing and local development.
//!
//! The `MockBoundaryStore` keeps per-table rows in memory and mirrors the
//! REST store's upsert semantics (null stripping, unique-key matching,
//! sequential ids), allowing pipeline tests to run without network access.
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::{Map, Value, json};

use crate::errors::RemoteWriteError;
use crate::interfaces::{BoundaryStore, UpsertOutcome};
use crate::rest::store::{filter_text, key_filters, strip_nulls};
use boundary_importer_shared::types::EntityId;

/// In-memory boundary store with the same observable behavior as the
/// REST-backed implementation.
pub struct MockBoundaryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    next_id: AtomicI64,
}

impl MockBoundaryStore {
    /// Create a new empty mock store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Seeds a table with pre-existing rows, as stored.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables
            .write()
            .unwrap()
            .insert(table.to_string(), rows);
    }

    /// All rows of a table, cloned for assertions.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of rows currently stored in a table.
    pub fn table_len(&self, table: &str) -> usize {
        self.tables
            .read()
            .unwrap()
            .get(table)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for MockBoundaryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BoundaryStore for MockBoundaryStore {
    async fn upsert(
        &self,
        table: &str,
        unique_key: &[&str],
        payload: Value,
    ) -> Result<UpsertOutcome, RemoteWriteError> {
        let payload = strip_nulls(payload);
        let filters = key_filters(table, unique_key, &payload)?;
        let fields = match payload {
            Value::Object(map) => map,
            _ => {
                return Err(RemoteWriteError::InvalidPayload {
                    table: table.to_string(),
                });
            }
        };

        let mut tables = self.tables.write().unwrap();
        let rows = tables.entry(table.to_string()).or_default();

        if let Some(row) = rows.iter_mut().find(|row| matches_filters(row, &filters)) {
            let id = row
                .get("id")
                .and_then(Value::as_i64)
                .ok_or_else(|| RemoteWriteError::MissingId {
                    table: table.to_string(),
                })?;
            if let Some(stored) = row.as_object_mut() {
                for (field, value) in fields {
                    stored.insert(field, value);
                }
            }
            Ok(UpsertOutcome { id, created: false })
        } else {
            let id: EntityId = self.next_id.fetch_add(1, Ordering::SeqCst);
            let mut stored = fields;
            stored.insert("id".to_string(), json!(id));
            rows.push(Value::Object(stored));
            Ok(UpsertOutcome { id, created: true })
        }
    }

    async fn fetch_rows(
        &self,
        table: &str,
        select: Option<&str>,
    ) -> Result<Vec<Value>, RemoteWriteError> {
        let rows = self.rows(table);
        match select {
            None => Ok(rows),
            Some(columns) => {
                let wanted: Vec<&str> = columns.split(',').map(str::trim).collect();
                Ok(rows
                    .into_iter()
                    .map(|row| {
                        let mut projected = Map::new();
                        if let Some(object) = row.as_object() {
                            for column in &wanted {
                                if let Some(value) = object.get(*column) {
                                    projected.insert((*column).to_string(), value.clone());
                                }
                            }
                        }
                        Value::Object(projected)
                    })
                    .collect())
            }
        }
    }
}

fn matches_filters(row: &Value, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(field, filter)| {
        let expected = filter.trim_start_matches("eq.");
        row.get(field)
            .map(|value| filter_text(value) == expected)
            .unwrap_or(false)
    })
}
