use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the flat coordinate export.
///
/// Each beat in the source layers yields one record with a freshly
/// generated identifier, the business keys of its lineage, and the
/// centroid of every level it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinateRecord {
    pub id: Uuid,
    pub bid: String,
    pub rid: String,
    pub did: String,
    pub beat_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beat_area: Option<f64>,
    /// Beat centroid as a WKT point, e.g. `POINT(77.1 23.4)`.
    pub location: String,
    pub beat_lat: f64,
    pub beat_lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division_lon: Option<f64>,
    pub created_at: DateTime<Utc>,
}
