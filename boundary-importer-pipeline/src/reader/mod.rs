//! This module reads boundary layers from shapefiles into
//! [`FeatureCollection`]s, normalizing every geometry to a WGS84
//! multi-polygon footprint on the way in.
//!
//! Opening or parsing failures are fatal (`SourceReadError`); a feature
//! whose geometry is not areal is skipped, recorded on the collection, and
//! reported, so one bad record never aborts a layer.
mod crs;

use std::collections::BTreeMap;
use std::path::Path;

use geo_types::MultiPolygon;
use serde_json::{Value, json};
use shapefile::Shape;
use shapefile::dbase::FieldValue;
use tracing::{info, warn};

use crate::errors::SourceReadError;
use crate::orchestrator::ImportPlan;
use boundary_importer_shared::types::{
    BoundaryFeature, FeatureCollection, Footprint, Level, SkippedFeature, UnsupportedGeometryError,
};

pub use crs::{LayerProjection, WGS84_EPSG, detect_epsg};

/// The three layers of one import run, read in hierarchy order.
#[derive(Debug, Clone)]
pub struct LayerCollections {
    pub divisions: FeatureCollection,
    pub ranges: FeatureCollection,
    pub beats: FeatureCollection,
}

impl LayerCollections {
    /// Reads every layer named by the plan.
    ///
    /// # Errors
    ///
    /// Fails with the first [`SourceReadError`] encountered; a missing or
    /// unreadable layer aborts the run before anything is written.
    pub fn read(plan: &ImportPlan) -> Result<Self, SourceReadError> {
        Ok(Self {
            divisions: read_layer(Level::Division, &plan.division.shapefile)?,
            ranges: read_layer(Level::Range, &plan.range.shapefile)?,
            beats: read_layer(Level::Beat, &plan.beat.shapefile)?,
        })
    }
}

/// Reads one boundary layer from a shapefile.
///
/// The `.dbf` sibling supplies the attributes and the `.prj` sibling the
/// CRS; sources not already in WGS84 are reprojected feature by feature.
pub fn read_layer(level: Level, path: &Path) -> Result<FeatureCollection, SourceReadError> {
    let mut reader =
        shapefile::Reader::from_path(path).map_err(|source| SourceReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let epsg = detect_epsg(path)?.unwrap_or(WGS84_EPSG);
    let projection = if epsg == WGS84_EPSG {
        None
    } else {
        info!(%level, epsg, "reprojecting layer to WGS84");
        Some(LayerProjection::to_wgs84(epsg)?)
    };

    let mut collection = FeatureCollection::new(level);
    collection.source_epsg = epsg;
    for (index, shape_record) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = shape_record.map_err(|source| SourceReadError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        let multi: MultiPolygon<f64> = match shape {
            Shape::Polygon(polygon) => polygon.into(),
            other => {
                let error = UnsupportedGeometryError {
                    geometry_type: format!("{:?}", other.shapetype()),
                };
                warn!(
                    %level,
                    index,
                    geometry_type = %error.geometry_type,
                    "skipping feature with unsupported geometry"
                );
                collection.skipped.push(SkippedFeature { index, error });
                continue;
            }
        };
        let multi = match &projection {
            Some(projection) => crs::reproject_multi_polygon(&multi, projection)?,
            None => multi,
        };

        let attributes: BTreeMap<String, Value> = record
            .into_iter()
            .map(|(name, value)| (name, attribute_value(value)))
            .collect();

        collection.features.push(BoundaryFeature {
            index,
            attributes,
            footprint: Footprint::from(multi),
        });
    }

    info!(
        %level,
        path = %path.display(),
        features = collection.len(),
        skipped = collection.skipped.len(),
        "read boundary layer"
    );
    Ok(collection)
}

/// Maps a DBF attribute onto a JSON value.
fn attribute_value(value: FieldValue) -> Value {
    match value {
        FieldValue::Character(Some(text)) => Value::String(text),
        FieldValue::Character(None) => Value::Null,
        FieldValue::Numeric(Some(number)) => json!(number),
        FieldValue::Numeric(None) => Value::Null,
        FieldValue::Float(Some(number)) => json!(number as f64),
        FieldValue::Float(None) => Value::Null,
        FieldValue::Integer(number) => json!(number),
        FieldValue::Double(number) => json!(number),
        FieldValue::Logical(Some(flag)) => json!(flag),
        FieldValue::Logical(None) => Value::Null,
        FieldValue::Date(Some(date)) => Value::String(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        FieldValue::Date(None) => Value::Null,
        _ => Value::Null,
    }
}
