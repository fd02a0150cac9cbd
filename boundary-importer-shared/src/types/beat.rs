use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// A stored beat row, as returned by the boundary store.
///
/// `(did, rid, bid)` is the natural key. `range_id` points at the stored
/// parent range; `division_id` is denormalized for query convenience and
/// must always equal that range's own `division_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Beat {
    pub id: EntityId,
    pub bid: String,
    pub rid: String,
    pub did: String,
    #[serde(default)]
    pub range_id: Option<EntityId>,
    #[serde(default)]
    pub division_id: Option<EntityId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub area: Option<f64>,
    pub code: String,
}
