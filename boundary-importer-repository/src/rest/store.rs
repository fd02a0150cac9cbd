//! PostgREST implementation of the boundary store.
//!
//! Rows live in per-table collection endpoints under `/rest/v1/`. Lookups
//! are `GET` requests with `column=eq.value` filters; writes are `POST`
//! (create) or `PATCH` on the same filters (update). Authentication uses
//! the service key both as `apikey` header and bearer token, and every
//! request asks for `Prefer: return=representation` so writes echo the
//! stored row back, including its generated id.
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::errors::RemoteWriteError;
use crate::interfaces::{BoundaryStore, UpsertOutcome};
use boundary_importer_shared::types::EntityId;

/// Boundary store backed by a PostgREST-style HTTP interface.
pub struct RestBoundaryStore {
    base_url: String,
    service_key: String,
    client: Client,
}

impl RestBoundaryStore {
    /// Creates a store client for the given base URL and service key.
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        RestBoundaryStore {
            base_url,
            service_key: service_key.into(),
            client: Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=representation")
    }

    /// Sends a request and decodes the JSON body, mapping non-2xx
    /// responses to [`RemoteWriteError::Store`] with the full body text.
    async fn send(&self, builder: RequestBuilder) -> Result<Value, RemoteWriteError> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RemoteWriteError::Store {
                status: status.as_u16(),
                message: body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_rows(
        &self,
        table: &str,
        query: &[(String, String)],
    ) -> Result<Vec<Value>, RemoteWriteError> {
        let builder = self.client.get(self.table_url(table)).query(query);
        match self.send(builder).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }
}

#[async_trait::async_trait]
impl BoundaryStore for RestBoundaryStore {
    async fn upsert(
        &self,
        table: &str,
        unique_key: &[&str],
        payload: Value,
    ) -> Result<UpsertOutcome, RemoteWriteError> {
        let payload = strip_nulls(payload);
        let filters = key_filters(table, unique_key, &payload)?;

        let existing = self.get_rows(table, &filters).await?;
        match existing.first() {
            Some(row) => {
                let id = row_id(table, row)?;
                let builder = self
                    .client
                    .patch(self.table_url(table))
                    .query(&filters)
                    .json(&payload);
                self.send(builder).await?;
                Ok(UpsertOutcome { id, created: false })
            }
            None => {
                let builder = self.client.post(self.table_url(table)).json(&payload);
                let body = self.send(builder).await?;
                let row = match &body {
                    Value::Array(rows) => rows.first().cloned(),
                    Value::Object(_) => Some(body.clone()),
                    _ => None,
                };
                let row = row.ok_or_else(|| RemoteWriteError::MissingId {
                    table: table.to_string(),
                })?;
                let id = row_id(table, &row)?;
                Ok(UpsertOutcome { id, created: true })
            }
        }
    }

    async fn fetch_rows(
        &self,
        table: &str,
        select: Option<&str>,
    ) -> Result<Vec<Value>, RemoteWriteError> {
        let query = match select {
            Some(columns) => vec![("select".to_string(), columns.to_string())],
            None => Vec::new(),
        };
        self.get_rows(table, &query).await
    }
}

/// Drops null-valued fields from an object payload; other values pass
/// through untouched.
pub(crate) fn strip_nulls(payload: Value) -> Value {
    match payload {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, value)| !value.is_null())
                .collect(),
        ),
        other => other,
    }
}

/// Builds `column=eq.value` filters for the unique-key columns, erroring
/// when the payload lacks one of them.
pub(crate) fn key_filters(
    table: &str,
    unique_key: &[&str],
    payload: &Value,
) -> Result<Vec<(String, String)>, RemoteWriteError> {
    let object = payload
        .as_object()
        .ok_or_else(|| RemoteWriteError::InvalidPayload {
            table: table.to_string(),
        })?;

    let mut filters = Vec::with_capacity(unique_key.len());
    for field in unique_key {
        let value = object
            .get(*field)
            .filter(|value| !value.is_null())
            .ok_or_else(|| RemoteWriteError::MissingKeyField {
                table: table.to_string(),
                field: (*field).to_string(),
            })?;
        filters.push(((*field).to_string(), format!("eq.{}", filter_text(value))));
    }
    Ok(filters)
}

/// Renders a JSON value the way PostgREST expects it in an `eq.` filter.
pub(crate) fn filter_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn row_id(table: &str, row: &Value) -> Result<EntityId, RemoteWriteError> {
    row.get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| RemoteWriteError::MissingId {
            table: table.to_string(),
        })
}
