use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// A stored range row, as returned by the boundary store.
///
/// `(did, rid)` is the natural key; `rid` alone repeats across divisions.
/// `division_id` points at the stored parent division.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Range {
    pub id: EntityId,
    pub rid: String,
    pub did: String,
    #[serde(default)]
    pub division_id: Option<EntityId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    pub code: String,
}
