use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// A stored division row, as returned by the boundary store.
///
/// `did` is the business id carried by the source layer; `id` and `code`
/// are assigned on first import and never change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Division {
    pub id: EntityId,
    pub did: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    pub code: String,
}
