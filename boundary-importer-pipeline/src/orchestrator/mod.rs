//! This module defines the `Orchestrator` responsible for driving the
//! per-layer import. It wires the resolver and the boundary store together
//! and walks the hierarchy strictly top-down: divisions first, then ranges,
//! then beats, because child resolution depends on the completed parent id
//! table.
//!
//! Per-feature problems (unresolved parents, rejected writes) are logged,
//! counted, and skipped so one bad record never aborts the batch; only the
//! preloading reads a layer pass depends on are fatal.
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{error, info, warn};

use crate::errors::{ImportError, ResolutionFailure};
use crate::reader::LayerCollections;
use crate::resolver::{ParentLocator, ParentShape, ResolvedParent};
use boundary_importer_repository::{BoundaryStore, next_code};
use boundary_importer_shared::types::{BoundaryFeature, EntityId, FeatureCollection, Level};

/// How a layer links to its parent level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStrategy {
    /// Top of the hierarchy, nothing to resolve.
    Root,
    /// Match parent business-key attributes against the parent id table.
    BusinessKey,
    /// Centroid containment against the parent polygons.
    Containment,
}

/// Linkage mode for the non-root layers, chosen by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentLinkMode {
    BusinessKey,
    Containment,
}

/// One component of a layer's natural key: the shapefile attribute it is
/// read from and the store column it is written to.
#[derive(Debug, Clone)]
pub struct KeyField {
    pub attribute: String,
    pub column: String,
}

impl KeyField {
    fn new(attribute: &str, column: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            column: column.to_string(),
        }
    }
}

/// Everything the pipeline needs to know about one layer: where it lives,
/// which tables it feeds, its natural key, its code prefix, and how it
/// links to the parent level.
#[derive(Debug, Clone)]
pub struct LayerPlan {
    pub level: Level,
    pub shapefile: PathBuf,
    pub table: String,
    pub polygon_table: String,
    pub polygon_owner_column: String,
    pub key_fields: Vec<KeyField>,
    pub code_prefix: String,
    pub link: LinkStrategy,
}

impl LayerPlan {
    fn unique_key_columns(&self) -> Vec<&str> {
        self.key_fields
            .iter()
            .map(|field| field.column.as_str())
            .collect()
    }

    /// The feature's composite business key, in key-field order.
    fn business_key(&self, feature: &BoundaryFeature) -> Result<Vec<String>, ResolutionFailure> {
        self.key_fields
            .iter()
            .map(|field| {
                feature.attr_str(&field.attribute).ok_or_else(|| {
                    ResolutionFailure::MissingKeyField {
                        level: self.level,
                        feature: feature.label(self.level),
                        field: field.attribute.clone(),
                    }
                })
            })
            .collect()
    }
}

/// The full three-layer plan for one run.
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub division: LayerPlan,
    pub range: LayerPlan,
    pub beat: LayerPlan,
}

impl ImportPlan {
    /// The standard layout: `Division.shp` / `Range.shp` / `Beat.shp` under
    /// one directory, feeding the canonical tables.
    pub fn standard(shapefile_dir: &Path, mode: ParentLinkMode) -> Self {
        let child_link = match mode {
            ParentLinkMode::BusinessKey => LinkStrategy::BusinessKey,
            ParentLinkMode::Containment => LinkStrategy::Containment,
        };
        ImportPlan {
            division: LayerPlan {
                level: Level::Division,
                shapefile: shapefile_dir.join("Division.shp"),
                table: "divisions".to_string(),
                polygon_table: "division_polygons".to_string(),
                polygon_owner_column: "division_id".to_string(),
                key_fields: vec![KeyField::new("DID", "did")],
                code_prefix: "DIV".to_string(),
                link: LinkStrategy::Root,
            },
            range: LayerPlan {
                level: Level::Range,
                shapefile: shapefile_dir.join("Range.shp"),
                table: "ranges".to_string(),
                polygon_table: "range_polygons".to_string(),
                polygon_owner_column: "range_id".to_string(),
                key_fields: vec![KeyField::new("DID", "did"), KeyField::new("RID", "rid")],
                code_prefix: "RNG".to_string(),
                link: child_link,
            },
            beat: LayerPlan {
                level: Level::Beat,
                shapefile: shapefile_dir.join("Beat.shp"),
                table: "beats".to_string(),
                polygon_table: "beat_polygons".to_string(),
                polygon_owner_column: "beat_id".to_string(),
                key_fields: vec![
                    KeyField::new("DID", "did"),
                    KeyField::new("RID", "rid"),
                    KeyField::new("BID", "bid"),
                ],
                code_prefix: "BEAT".to_string(),
                link: child_link,
            },
        }
    }
}

/// Counters and skipped-feature reports for one layer pass.
#[derive(Debug, Clone)]
pub struct LayerReport {
    pub level: Level,
    pub created: usize,
    pub updated: usize,
    pub polygons: usize,
    pub resolution_failures: Vec<ResolutionFailure>,
    pub write_errors: usize,
}

impl LayerReport {
    fn new(level: Level) -> Self {
        Self {
            level,
            created: 0,
            updated: 0,
            polygons: 0,
            resolution_failures: Vec::new(),
            write_errors: 0,
        }
    }
}

/// The outcome of one full import run.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub divisions: LayerReport,
    pub ranges: LayerReport,
    pub beats: LayerReport,
}

impl ImportSummary {
    pub fn reports(&self) -> [&LayerReport; 3] {
        [&self.divisions, &self.ranges, &self.beats]
    }

    /// True when every feature was resolved and written.
    pub fn clean(&self) -> bool {
        self.reports()
            .iter()
            .all(|report| report.resolution_failures.is_empty() && report.write_errors == 0)
    }
}

/// Everything one completed layer pass hands to its child layer.
struct LevelOutcome {
    report: LayerReport,
    lookup: HashMap<Vec<String>, ResolvedParent>,
    shapes: Vec<ParentShape>,
}

/// `Orchestrator` drives the import against a boundary store.
pub struct Orchestrator {
    store: Arc<dyn BoundaryStore>,
}

impl Orchestrator {
    /// Creates a new `Orchestrator` instance over the given store.
    pub fn new(store: Arc<dyn BoundaryStore>) -> Self {
        Self { store }
    }

    /// Runs the import for all three layers, parent before child.
    ///
    /// # Arguments
    ///
    /// * `plan` - The layer plans, division → range → beat.
    /// * `layers` - The feature collections read from the plan's shapefiles.
    ///
    /// # Returns
    ///
    /// An [`ImportSummary`] with per-layer counters and skipped features,
    /// or an [`ImportError`] when a preloading read fails.
    pub async fn run_import(
        &self,
        plan: &ImportPlan,
        layers: &LayerCollections,
    ) -> Result<ImportSummary, ImportError> {
        let divisions = self
            .import_layer(&plan.division, &layers.divisions, ParentLocator::Root)
            .await?;

        let range_locator = build_locator(&plan.range, &plan.division, &divisions);
        let ranges = self
            .import_layer(&plan.range, &layers.ranges, range_locator)
            .await?;

        let beat_locator = build_locator(&plan.beat, &plan.range, &ranges);
        let beats = self
            .import_layer(&plan.beat, &layers.beats, beat_locator)
            .await?;

        Ok(ImportSummary {
            divisions: divisions.report,
            ranges: ranges.report,
            beats: beats.report,
        })
    }

    /// Imports one layer: resolve the parent, reuse or generate the code,
    /// upsert the entity row, then upsert its polygon row.
    async fn import_layer(
        &self,
        plan: &LayerPlan,
        collection: &FeatureCollection,
        locator: ParentLocator,
    ) -> Result<LevelOutcome, ImportError> {
        let preload = self.preload(plan).await?;
        let mut codes = preload.codes;
        let existing_codes = preload.by_key;

        let mut report = LayerReport::new(plan.level);
        let mut lookup: HashMap<Vec<String>, ResolvedParent> = HashMap::new();
        let mut shapes: Vec<ParentShape> = Vec::new();

        for feature in &collection.features {
            let parent = match locator.locate(plan.level, feature) {
                Ok(parent) => parent,
                Err(failure) => {
                    warn!(failure = %failure, "skipping feature without parent");
                    report.resolution_failures.push(failure);
                    continue;
                }
            };
            let key = match plan.business_key(feature) {
                Ok(key) => key,
                Err(failure) => {
                    warn!(failure = %failure, "skipping feature without business key");
                    report.resolution_failures.push(failure);
                    continue;
                }
            };

            // A row imported by an earlier run keeps its code forever.
            let code = existing_codes.get(&key).cloned().unwrap_or_else(|| {
                let code = next_code(&plan.code_prefix, &codes);
                codes.insert(code.clone());
                code
            });

            let payload = entity_payload(plan.level, feature, parent.as_ref(), &code);
            let entity = match self
                .store
                .upsert(&plan.table, &plan.unique_key_columns(), payload)
                .await
            {
                Ok(entity) => entity,
                Err(write_error) => {
                    error!(
                        level = %plan.level,
                        feature = %feature.label(plan.level),
                        error = %write_error,
                        "failed to upsert entity"
                    );
                    report.write_errors += 1;
                    continue;
                }
            };
            if entity.created {
                report.created += 1;
            } else {
                report.updated += 1;
            }

            let polygon = polygon_payload(&plan.polygon_owner_column, entity.id, feature);
            match self
                .store
                .upsert(
                    &plan.polygon_table,
                    &[plan.polygon_owner_column.as_str()],
                    polygon,
                )
                .await
            {
                Ok(_) => report.polygons += 1,
                Err(write_error) => {
                    error!(
                        level = %plan.level,
                        feature = %feature.label(plan.level),
                        error = %write_error,
                        "failed to upsert polygon"
                    );
                    report.write_errors += 1;
                }
            }

            let resolved = ResolvedParent {
                id: entity.id,
                division_id: division_lineage(plan.level, entity.id, parent.as_ref()),
            };
            lookup.insert(key, resolved.clone());
            shapes.push(ParentShape {
                parent: resolved,
                label: feature.label(plan.level),
                footprint: feature.footprint.clone(),
            });

            info!(
                level = %plan.level,
                name = %feature
                    .attr_str(plan.level.name_attribute())
                    .unwrap_or_else(|| feature.label(plan.level)),
                code = %code,
                id = entity.id,
                created = entity.created,
                "imported boundary"
            );
        }

        Ok(LevelOutcome {
            report,
            lookup,
            shapes,
        })
    }

    /// Loads the layer's already-stored keys and codes in one read.
    async fn preload(&self, plan: &LayerPlan) -> Result<Preloaded, ImportError> {
        let columns: Vec<&str> = plan
            .unique_key_columns()
            .into_iter()
            .chain(["code"])
            .collect();
        let rows = self
            .store
            .fetch_rows(&plan.table, Some(&columns.join(",")))
            .await?;

        let mut codes = HashSet::new();
        let mut by_key = HashMap::new();
        for row in &rows {
            let code = row.get("code").and_then(Value::as_str).map(str::to_string);
            if let Some(code) = &code {
                codes.insert(code.clone());
            }
            let key: Option<Vec<String>> = plan
                .key_fields
                .iter()
                .map(|field| row_text(row, &field.column))
                .collect();
            if let (Some(key), Some(code)) = (key, code) {
                by_key.insert(key, code);
            }
        }
        Ok(Preloaded { codes, by_key })
    }
}

struct Preloaded {
    codes: HashSet<String>,
    by_key: HashMap<Vec<String>, String>,
}

/// Builds the child layer's locator from the completed parent level.
fn build_locator(
    plan: &LayerPlan,
    parent_plan: &LayerPlan,
    parent: &LevelOutcome,
) -> ParentLocator {
    match plan.link {
        LinkStrategy::Root => ParentLocator::Root,
        LinkStrategy::BusinessKey => ParentLocator::ByKey {
            fields: parent_plan
                .key_fields
                .iter()
                .map(|field| field.attribute.clone())
                .collect(),
            parents: parent.lookup.clone(),
        },
        LinkStrategy::Containment => ParentLocator::Spatial {
            parents: parent.shapes.clone(),
        },
    }
}

/// The division id an entity belongs to: a division is its own, a range's
/// is its parent, a beat's is carried through its range.
fn division_lineage(
    level: Level,
    own_id: EntityId,
    parent: Option<&ResolvedParent>,
) -> Option<EntityId> {
    match level {
        Level::Division => Some(own_id),
        Level::Range => parent.map(|parent| parent.id),
        Level::Beat => parent.and_then(|parent| parent.division_id),
    }
}

/// Builds the entity row for one feature. Optional fields serialize as
/// null and are stripped by the store client before transmission.
fn entity_payload(
    level: Level,
    feature: &BoundaryFeature,
    parent: Option<&ResolvedParent>,
    code: &str,
) -> Value {
    let name = feature.attr_str(level.name_attribute());
    let state = feature.attr_str("State");
    match level {
        Level::Division => json!({
            "did": feature.attr_str("DID"),
            "name": name,
            "state": state,
            "code": code,
        }),
        Level::Range => json!({
            "rid": feature.attr_str("RID"),
            "did": feature.attr_str("DID"),
            "division_id": parent.map(|parent| parent.id),
            "name": name,
            "state": state,
            "code": code,
        }),
        Level::Beat => json!({
            "bid": feature.attr_str("BID"),
            "rid": feature.attr_str("RID"),
            "did": feature.attr_str("DID"),
            "range_id": parent.map(|parent| parent.id),
            "division_id": parent.and_then(|parent| parent.division_id),
            "name": name,
            "state": state,
            "area": feature.attr_f64("Beat_Ar"),
            "code": code,
        }),
    }
}

/// Builds the polygon row owned by an entity.
fn polygon_payload(owner_column: &str, owner_id: EntityId, feature: &BoundaryFeature) -> Value {
    let footprint = &feature.footprint;
    let mut row = Map::new();
    row.insert(owner_column.to_string(), json!(owner_id));
    row.insert("polygon".to_string(), json!(footprint.to_ewkt()));
    row.insert("area".to_string(), json!(footprint.area()));
    row.insert("perimeter".to_string(), json!(footprint.perimeter()));
    Value::Object(row)
}

/// Renders a stored cell the way business keys compare: strings as-is,
/// numbers without decoration.
fn row_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
