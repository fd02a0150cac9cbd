//! This module writes the flat coordinate export: one JSON record per
//! beat, carrying a generated identifier, the business keys of its
//! lineage, and the centroid of every level it belongs to. The file is a
//! secondary output consumed by tooling that cannot read the store
//! directly.
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::ExportError;
use crate::reader::LayerCollections;
use boundary_importer_shared::types::{BoundaryFeature, CoordinateRecord, Level};

/// Builds and writes the coordinate export for all beats.
///
/// Beats without a complete business key or with an empty geometry are
/// skipped with a warning; a missing range or division lineage leaves the
/// corresponding fields out rather than dropping the record.
///
/// # Returns
///
/// The number of records written, or an [`ExportError`] on I/O or
/// serialization failure.
pub fn export_coordinates(layers: &LayerCollections, path: &Path) -> Result<usize, ExportError> {
    let records = build_records(layers);
    let json = serde_json::to_string_pretty(&records)?;
    fs::write(path, json)?;
    info!(
        records = records.len(),
        path = %path.display(),
        "wrote coordinate export"
    );
    Ok(records.len())
}

/// Assembles the export rows without touching the filesystem.
pub fn build_records(layers: &LayerCollections) -> Vec<CoordinateRecord> {
    let divisions: HashMap<String, &BoundaryFeature> = layers
        .divisions
        .features
        .iter()
        .filter_map(|feature| feature.attr_str("DID").map(|did| (did, feature)))
        .collect();
    let ranges: HashMap<(String, String), &BoundaryFeature> = layers
        .ranges
        .features
        .iter()
        .filter_map(|feature| {
            let did = feature.attr_str("DID")?;
            let rid = feature.attr_str("RID")?;
            Some(((did, rid), feature))
        })
        .collect();

    let mut records = Vec::with_capacity(layers.beats.len());
    for beat in &layers.beats.features {
        let (Some(bid), Some(rid), Some(did)) = (
            beat.attr_str("BID"),
            beat.attr_str("RID"),
            beat.attr_str("DID"),
        ) else {
            warn!(feature = %beat.label(Level::Beat), "skipping beat without a full business key");
            continue;
        };
        let Some(centroid) = beat.footprint.centroid() else {
            warn!(feature = %beat.label(Level::Beat), "skipping beat with empty geometry");
            continue;
        };

        let range = ranges.get(&(did.clone(), rid.clone()));
        let division = divisions.get(&did);
        let range_centroid = range.and_then(|feature| feature.footprint.centroid());
        let division_centroid = division.and_then(|feature| feature.footprint.centroid());

        records.push(CoordinateRecord {
            id: Uuid::new_v4(),
            bid,
            rid,
            did,
            beat_name: beat
                .attr_str("Beat")
                .unwrap_or_else(|| beat.label(Level::Beat)),
            range_name: range.and_then(|feature| feature.attr_str("Range")),
            division_name: division.and_then(|feature| feature.attr_str("Division")),
            state: beat.attr_str("State"),
            beat_area: beat.attr_f64("Beat_Ar"),
            location: format!("POINT({} {})", centroid.x(), centroid.y()),
            beat_lat: centroid.y(),
            beat_lon: centroid.x(),
            range_lat: range_centroid.map(|point| point.y()),
            range_lon: range_centroid.map(|point| point.x()),
            division_lat: division_centroid.map(|point| point.y()),
            division_lon: division_centroid.map(|point| point.x()),
            created_at: Utc::now(),
        });
    }
    records
}
