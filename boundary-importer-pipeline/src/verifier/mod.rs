//! This module defines the post-import integrity verifier. It is a
//! stateless batch check: given the source feature collections and the
//! current remote tables, it reports duplicated natural keys, source
//! features without a stored record, dangling parent references,
//! denormalization mismatches on beats, and polygon ownership problems.
//!
//! Every violation found in a pass is accumulated and reported together;
//! the verifier never halts at the first finding.
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::errors::VerificationFailure;
use crate::orchestrator::{ImportPlan, LayerPlan};
use crate::reader::LayerCollections;
use boundary_importer_repository::{BoundaryStore, RemoteWriteError};
use boundary_importer_shared::types::{Beat, Division, EntityId, FeatureCollection, Range};

/// All violations found in one table.
#[derive(Debug, Clone)]
pub struct TableReport {
    pub table: String,
    pub violations: Vec<VerificationFailure>,
}

impl TableReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// The aggregate result of one verification pass.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub tables: Vec<TableReport>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.tables.iter().all(TableReport::passed)
    }

    pub fn violation_count(&self) -> usize {
        self.tables.iter().map(|table| table.violations.len()).sum()
    }
}

/// `Verifier` cross-checks the remote tables against the source layers.
pub struct Verifier {
    store: Arc<dyn BoundaryStore>,
}

impl Verifier {
    /// Creates a new `Verifier` instance over the given store.
    pub fn new(store: Arc<dyn BoundaryStore>) -> Self {
        Self { store }
    }

    /// Runs the full verification pass.
    ///
    /// # Returns
    ///
    /// A [`VerificationReport`] with one [`TableReport`] per entity and
    /// polygon table, or a [`RemoteWriteError`] if the remote tables
    /// cannot be read.
    pub async fn verify(
        &self,
        plan: &ImportPlan,
        layers: &LayerCollections,
    ) -> Result<VerificationReport, RemoteWriteError> {
        let divisions: Vec<Division> = self.fetch_table(&plan.division.table).await?;
        let ranges: Vec<Range> = self.fetch_table(&plan.range.table).await?;
        let beats: Vec<Beat> = self.fetch_table(&plan.beat.table).await?;

        let mut tables = Vec::new();
        tables.push(TableReport {
            table: plan.division.table.clone(),
            violations: check_divisions(&plan.division, &layers.divisions, &divisions),
        });
        tables.push(TableReport {
            table: plan.range.table.clone(),
            violations: check_ranges(&plan.range, &layers.ranges, &ranges, &divisions),
        });
        tables.push(TableReport {
            table: plan.beat.table.clone(),
            violations: check_beats(&plan.beat, &layers.beats, &beats, &ranges, &divisions),
        });

        let owners: [(&LayerPlan, HashSet<EntityId>); 3] = [
            (&plan.division, divisions.iter().map(|row| row.id).collect()),
            (&plan.range, ranges.iter().map(|row| row.id).collect()),
            (&plan.beat, beats.iter().map(|row| row.id).collect()),
        ];
        for (layer, owner_ids) in owners {
            let rows = self.store.fetch_rows(&layer.polygon_table, None).await?;
            tables.push(TableReport {
                table: layer.polygon_table.clone(),
                violations: check_polygons(&layer.polygon_owner_column, &owner_ids, &rows),
            });
        }

        let report = VerificationReport { tables };
        info!(
            passed = report.passed(),
            violations = report.violation_count(),
            "verification pass finished"
        );
        Ok(report)
    }

    async fn fetch_table<T: DeserializeOwned>(
        &self,
        table: &str,
    ) -> Result<Vec<T>, RemoteWriteError> {
        self.store
            .fetch_rows(table, None)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(RemoteWriteError::from))
            .collect()
    }
}

/// The composite business keys present in a source layer, joined with `/`.
fn source_keys(plan: &LayerPlan, collection: &FeatureCollection) -> BTreeSet<String> {
    collection
        .features
        .iter()
        .filter_map(|feature| {
            plan.key_fields
                .iter()
                .map(|field| feature.attr_str(&field.attribute))
                .collect::<Option<Vec<_>>>()
                .map(|parts| parts.join("/"))
        })
        .collect()
}

/// Duplicate-key and missing-record checks shared by every entity table.
fn key_violations(
    source_keys: &BTreeSet<String>,
    stored_keys: &[String],
) -> Vec<VerificationFailure> {
    let mut violations = Vec::new();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for key in stored_keys {
        *counts.entry(key.as_str()).or_default() += 1;
    }
    for (key, count) in &counts {
        if *count > 1 {
            violations.push(VerificationFailure::DuplicateKey {
                key: (*key).to_string(),
            });
        }
    }
    for key in source_keys {
        if !counts.contains_key(key.as_str()) {
            violations.push(VerificationFailure::MissingRecord { key: key.clone() });
        }
    }
    violations
}

/// Dangling-reference check for one parent column.
fn parent_violations(
    children: impl Iterator<Item = (String, Option<EntityId>)>,
    column: &str,
    parents: &HashSet<EntityId>,
) -> Vec<VerificationFailure> {
    let mut violations = Vec::new();
    for (key, parent_id) in children {
        match parent_id {
            None => violations.push(VerificationFailure::MissingParent {
                key,
                column: column.to_string(),
            }),
            Some(parent_id) if !parents.contains(&parent_id) => {
                violations.push(VerificationFailure::DanglingParent {
                    key,
                    column: column.to_string(),
                    parent_id,
                });
            }
            Some(_) => {}
        }
    }
    violations
}

fn check_divisions(
    plan: &LayerPlan,
    source: &FeatureCollection,
    stored: &[Division],
) -> Vec<VerificationFailure> {
    let stored_keys: Vec<String> = stored.iter().map(|row| row.did.clone()).collect();
    key_violations(&source_keys(plan, source), &stored_keys)
}

fn check_ranges(
    plan: &LayerPlan,
    source: &FeatureCollection,
    stored: &[Range],
    divisions: &[Division],
) -> Vec<VerificationFailure> {
    let stored_keys: Vec<String> = stored
        .iter()
        .map(|row| format!("{}/{}", row.did, row.rid))
        .collect();
    let mut violations = key_violations(&source_keys(plan, source), &stored_keys);

    let division_ids: HashSet<EntityId> = divisions.iter().map(|row| row.id).collect();
    violations.extend(parent_violations(
        stored
            .iter()
            .map(|row| (format!("{}/{}", row.did, row.rid), row.division_id)),
        "division_id",
        &division_ids,
    ));
    violations
}

fn check_beats(
    plan: &LayerPlan,
    source: &FeatureCollection,
    stored: &[Beat],
    ranges: &[Range],
    divisions: &[Division],
) -> Vec<VerificationFailure> {
    let beat_key = |row: &Beat| format!("{}/{}/{}", row.did, row.rid, row.bid);

    let stored_keys: Vec<String> = stored.iter().map(beat_key).collect();
    let mut violations = key_violations(&source_keys(plan, source), &stored_keys);

    let range_ids: HashSet<EntityId> = ranges.iter().map(|row| row.id).collect();
    let division_ids: HashSet<EntityId> = divisions.iter().map(|row| row.id).collect();
    violations.extend(parent_violations(
        stored.iter().map(|row| (beat_key(row), row.range_id)),
        "range_id",
        &range_ids,
    ));
    violations.extend(parent_violations(
        stored.iter().map(|row| (beat_key(row), row.division_id)),
        "division_id",
        &division_ids,
    ));

    // The denormalized division must agree with the range's own division.
    let range_divisions: HashMap<EntityId, Option<EntityId>> = ranges
        .iter()
        .map(|row| (row.id, row.division_id))
        .collect();
    for beat in stored {
        let Some(range_id) = beat.range_id else {
            continue;
        };
        let Some(expected) = range_divisions.get(&range_id) else {
            // Already reported as a dangling range reference.
            continue;
        };
        if beat.division_id != *expected {
            violations.push(VerificationFailure::InconsistentDivision {
                key: beat_key(beat),
            });
        }
    }
    violations
}

fn check_polygons(
    owner_column: &str,
    owners: &HashSet<EntityId>,
    rows: &[Value],
) -> Vec<VerificationFailure> {
    let mut violations = Vec::new();
    let mut counts: BTreeMap<EntityId, usize> = BTreeMap::new();
    for row in rows {
        if let Some(owner_id) = row.get(owner_column).and_then(Value::as_i64) {
            *counts.entry(owner_id).or_default() += 1;
        }
    }
    for (owner_id, count) in &counts {
        if *count > 1 {
            violations.push(VerificationFailure::DuplicatePolygon {
                owner_column: owner_column.to_string(),
                owner_id: *owner_id,
                count: *count,
            });
        }
        if !owners.contains(owner_id) {
            violations.push(VerificationFailure::OrphanPolygon {
                owner_column: owner_column.to_string(),
                owner_id: *owner_id,
            });
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{ImportPlan, ParentLinkMode};
    use boundary_importer_shared::types::{BoundaryFeature, Footprint, Level};
    use geo_types::polygon;
    use serde_json::json;
    use std::collections::BTreeMap as AttrMap;
    use std::path::Path;

    fn plan() -> ImportPlan {
        ImportPlan::standard(Path::new("/data"), ParentLinkMode::BusinessKey)
    }

    fn feature(attributes: &[(&str, &str)]) -> BoundaryFeature {
        BoundaryFeature {
            index: 0,
            attributes: attributes
                .iter()
                .map(|(name, value)| (name.to_string(), json!(value)))
                .collect::<AttrMap<_, _>>(),
            footprint: Footprint::from(polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 0.0, y: 0.0),
            ]),
        }
    }

    fn division(id: EntityId, did: &str) -> Division {
        Division {
            id,
            did: did.to_string(),
            name: Some(format!("Division {did}")),
            state: None,
            code: format!("DIV{id:03}"),
        }
    }

    fn division_collection(dids: &[&str]) -> FeatureCollection {
        let mut collection = FeatureCollection::new(Level::Division);
        for did in dids {
            collection.features.push(feature(&[("DID", did)]));
        }
        collection
    }

    #[test]
    fn test_missing_division_is_reported_exactly_once() {
        let source = division_collection(&["1", "2", "3"]);
        let stored = vec![division(1, "1"), division(2, "2")];

        let violations = check_divisions(&plan().division, &source, &stored);
        assert_eq!(
            violations,
            vec![VerificationFailure::MissingRecord {
                key: "3".to_string()
            }]
        );
    }

    #[test]
    fn test_duplicate_division_keys_are_reported() {
        let source = division_collection(&["1"]);
        let stored = vec![division(1, "1"), division(2, "1")];

        let violations = check_divisions(&plan().division, &source, &stored);
        assert_eq!(
            violations,
            vec![VerificationFailure::DuplicateKey {
                key: "1".to_string()
            }]
        );
    }

    #[test]
    fn test_dangling_range_division_reference() {
        let source = FeatureCollection::new(Level::Range);
        let stored = vec![Range {
            id: 10,
            rid: "1".to_string(),
            did: "1".to_string(),
            division_id: Some(99),
            name: Some("North".to_string()),
            state: None,
            code: "RNG001".to_string(),
        }];
        let divisions = vec![division(1, "1")];

        let violations = check_ranges(&plan().range, &source, &stored, &divisions);
        assert_eq!(
            violations,
            vec![VerificationFailure::DanglingParent {
                key: "1/1".to_string(),
                column: "division_id".to_string(),
                parent_id: 99,
            }]
        );
    }

    #[test]
    fn test_beat_division_must_match_its_range() {
        let source = FeatureCollection::new(Level::Beat);
        let ranges = vec![Range {
            id: 10,
            rid: "1".to_string(),
            did: "1".to_string(),
            division_id: Some(1),
            name: Some("North".to_string()),
            state: None,
            code: "RNG001".to_string(),
        }];
        let divisions = vec![division(1, "1"), division(2, "2")];
        let stored = vec![Beat {
            id: 20,
            bid: "1".to_string(),
            rid: "1".to_string(),
            did: "1".to_string(),
            range_id: Some(10),
            division_id: Some(2),
            name: Some("Barouda".to_string()),
            state: None,
            area: None,
            code: "BEAT001".to_string(),
        }];

        let violations = check_beats(&plan().beat, &source, &stored, &ranges, &divisions);
        assert_eq!(
            violations,
            vec![VerificationFailure::InconsistentDivision {
                key: "1/1/1".to_string()
            }]
        );
    }

    #[test]
    fn test_polygon_ownership_checks() {
        let owners: HashSet<EntityId> = [1, 2].into_iter().collect();
        let rows = vec![
            json!({ "id": 1, "division_id": 1 }),
            json!({ "id": 2, "division_id": 1 }),
            json!({ "id": 3, "division_id": 9 }),
        ];

        let violations = check_polygons("division_id", &owners, &rows);
        assert!(violations.contains(&VerificationFailure::DuplicatePolygon {
            owner_column: "division_id".to_string(),
            owner_id: 1,
            count: 2,
        }));
        assert!(violations.contains(&VerificationFailure::OrphanPolygon {
            owner_column: "division_id".to_string(),
            owner_id: 9,
        }));
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_clean_tables_pass() {
        let source = division_collection(&["1"]);
        let stored = vec![division(1, "1")];
        assert!(check_divisions(&plan().division, &source, &stored).is_empty());
    }
}
