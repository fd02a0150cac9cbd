//! Behavioral tests for the boundary store upsert contract, run against the
//! in-memory implementation (the REST implementation shares the same key
//! filtering and null stripping).
//!
//! Run with: `cargo test --test upsert_semantics`

use boundary_importer_repository::{BoundaryStore, MockBoundaryStore};
use serde_json::json;

fn division_payload(did: &str, name: &str) -> serde_json::Value {
    json!({
        "did": did,
        "name": name,
        "state": "Madhya Pradesh",
        "code": "DIV001",
    })
}

#[tokio::test]
async fn test_repeated_upsert_is_idempotent() {
    let store = MockBoundaryStore::new();

    let first = store
        .upsert("divisions", &["did"], division_payload("1", "Sidhi"))
        .await
        .unwrap();
    let state_after_first = store.rows("divisions");

    let second = store
        .upsert("divisions", &["did"], division_payload("1", "Sidhi"))
        .await
        .unwrap();
    let state_after_second = store.rows("divisions");

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.id, second.id);
    // Same input twice yields the same stored state, not a duplicate.
    assert_eq!(state_after_first, state_after_second);
    assert_eq!(state_after_second.len(), 1);
}

#[tokio::test]
async fn test_upsert_updates_changed_fields_in_place() {
    let store = MockBoundaryStore::new();

    store
        .upsert("divisions", &["did"], division_payload("1", "Sidhi"))
        .await
        .unwrap();
    let outcome = store
        .upsert("divisions", &["did"], division_payload("1", "Sidhi West"))
        .await
        .unwrap();

    assert!(!outcome.created);
    let rows = store.rows("divisions");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], json!("Sidhi West"));
}

#[tokio::test]
async fn test_upsert_through_trait_object() {
    let store: Box<dyn BoundaryStore> = Box::new(MockBoundaryStore::new());

    let outcome = store
        .upsert(
            "beat_polygons",
            &["beat_id"],
            json!({
                "beat_id": 7,
                "polygon": "SRID=4326;MULTIPOLYGON(((0 0,1 0,1 1,0 0)))",
                "area": 0.5,
                "perimeter": null,
            }),
        )
        .await
        .unwrap();

    assert!(outcome.created);
    let rows = store.fetch_rows("beat_polygons", None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["beat_id"], json!(7));
    // Null perimeter was stripped before the write.
    assert!(rows[0].get("perimeter").is_none());
}

#[tokio::test]
async fn test_missing_key_field_is_rejected() {
    let store = MockBoundaryStore::new();

    let err = store
        .upsert("ranges", &["did", "rid"], json!({ "did": "1", "name": "North" }))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("rid"));
    assert_eq!(store.table_len("ranges"), 0);
}
