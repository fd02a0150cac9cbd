//! This module resolves each feature to its parent entity's stored
//! identifier. Two linkage modes exist: business-key lookup against the
//! parent level's completed id table, and spatial containment of the
//! feature's centroid in a parent polygon. The mode is chosen per layer by
//! configuration; divisions are roots and resolve to nothing.
use std::collections::HashMap;

use crate::errors::ResolutionFailure;
use boundary_importer_shared::types::{BoundaryFeature, EntityId, Footprint, Level};

/// A successfully resolved parent: its stored id plus the id of the
/// division it belongs to, so denormalized references on grandchildren
/// always come from the resolved lineage rather than raw attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParent {
    pub id: EntityId,
    pub division_id: Option<EntityId>,
}

/// One imported parent entity kept for containment lookups.
#[derive(Debug, Clone)]
pub struct ParentShape {
    pub parent: ResolvedParent,
    pub label: String,
    pub footprint: Footprint,
}

/// Parent resolution capability for one layer.
///
/// Built by the orchestrator from the previous level's outcome, which is
/// why levels must run strictly top-down.
pub enum ParentLocator {
    /// The layer has no parent level.
    Root,
    /// Match the feature's parent key attributes against the parent
    /// level's business-key table.
    ByKey {
        fields: Vec<String>,
        parents: HashMap<Vec<String>, ResolvedParent>,
    },
    /// Assign the first parent polygon containing the feature's centroid.
    Spatial { parents: Vec<ParentShape> },
}

impl ParentLocator {
    /// Determines the parent for one feature.
    ///
    /// # Returns
    ///
    /// `Ok(None)` for root layers, `Ok(Some(parent))` on success, and a
    /// [`ResolutionFailure`] when the parent cannot be determined — the
    /// caller reports the failure and excludes the feature from writes.
    pub fn locate(
        &self,
        level: Level,
        feature: &BoundaryFeature,
    ) -> Result<Option<ResolvedParent>, ResolutionFailure> {
        match self {
            ParentLocator::Root => Ok(None),

            ParentLocator::ByKey { fields, parents } => {
                let mut key = Vec::with_capacity(fields.len());
                for field in fields {
                    let value = feature.attr_str(field).ok_or_else(|| {
                        ResolutionFailure::MissingKeyField {
                            level,
                            feature: feature.label(level),
                            field: field.clone(),
                        }
                    })?;
                    key.push(value);
                }
                parents
                    .get(&key)
                    .cloned()
                    .map(Some)
                    .ok_or_else(|| ResolutionFailure::ParentNotFound {
                        level,
                        feature: feature.label(level),
                        key: key.join("/"),
                    })
            }

            ParentLocator::Spatial { parents } => {
                let centroid =
                    feature
                        .footprint
                        .centroid()
                        .ok_or_else(|| ResolutionFailure::EmptyGeometry {
                            level,
                            feature: feature.label(level),
                        })?;
                parents
                    .iter()
                    .find(|candidate| candidate.footprint.contains(&centroid))
                    .map(|candidate| Some(candidate.parent.clone()))
                    .ok_or_else(|| ResolutionFailure::Orphaned {
                        level,
                        feature: feature.label(level),
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn square(origin: f64, size: f64) -> Footprint {
        Footprint::from(polygon![
            (x: origin, y: origin),
            (x: origin + size, y: origin),
            (x: origin + size, y: origin + size),
            (x: origin, y: origin + size),
            (x: origin, y: origin),
        ])
    }

    fn feature(attributes: &[(&str, &str)], footprint: Footprint) -> BoundaryFeature {
        BoundaryFeature {
            index: 0,
            attributes: attributes
                .iter()
                .map(|(name, value)| (name.to_string(), json!(value)))
                .collect::<BTreeMap<_, _>>(),
            footprint,
        }
    }

    #[test]
    fn test_root_layers_have_no_parent() {
        let locator = ParentLocator::Root;
        let division = feature(&[("DID", "1")], square(0.0, 10.0));
        assert_eq!(locator.locate(Level::Division, &division).unwrap(), None);
    }

    #[test]
    fn test_by_key_resolves_composite_parent() {
        let mut parents = HashMap::new();
        parents.insert(
            vec!["1".to_string(), "2".to_string()],
            ResolvedParent {
                id: 42,
                division_id: Some(7),
            },
        );
        let locator = ParentLocator::ByKey {
            fields: vec!["DID".to_string(), "RID".to_string()],
            parents,
        };

        let beat = feature(&[("DID", "1"), ("RID", "2"), ("BID", "3")], square(0.0, 1.0));
        let resolved = locator.locate(Level::Beat, &beat).unwrap().unwrap();
        assert_eq!(resolved.id, 42);
        assert_eq!(resolved.division_id, Some(7));
    }

    #[test]
    fn test_by_key_reports_unknown_parent() {
        let locator = ParentLocator::ByKey {
            fields: vec!["DID".to_string()],
            parents: HashMap::new(),
        };
        let range = feature(&[("DID", "9"), ("RID", "1")], square(0.0, 1.0));

        let failure = locator.locate(Level::Range, &range).unwrap_err();
        assert_eq!(
            failure,
            ResolutionFailure::ParentNotFound {
                level: Level::Range,
                feature: "1".to_string(),
                key: "9".to_string(),
            }
        );
    }

    #[test]
    fn test_by_key_reports_missing_key_attribute() {
        let locator = ParentLocator::ByKey {
            fields: vec!["DID".to_string()],
            parents: HashMap::new(),
        };
        let range = feature(&[("RID", "1")], square(0.0, 1.0));

        let failure = locator.locate(Level::Range, &range).unwrap_err();
        assert!(matches!(
            failure,
            ResolutionFailure::MissingKeyField { ref field, .. } if field == "DID"
        ));
    }

    #[test]
    fn test_spatial_assigns_first_containing_parent() {
        let locator = ParentLocator::Spatial {
            parents: vec![
                ParentShape {
                    parent: ResolvedParent {
                        id: 1,
                        division_id: Some(1),
                    },
                    label: "west".to_string(),
                    footprint: square(0.0, 10.0),
                },
                ParentShape {
                    parent: ResolvedParent {
                        id: 2,
                        division_id: Some(1),
                    },
                    label: "east".to_string(),
                    footprint: square(20.0, 10.0),
                },
            ],
        };

        let inside_east = feature(&[("RID", "5")], square(24.0, 2.0));
        let resolved = locator.locate(Level::Range, &inside_east).unwrap().unwrap();
        assert_eq!(resolved.id, 2);
    }

    #[test]
    fn test_spatial_reports_orphaned_centroid() {
        let locator = ParentLocator::Spatial {
            parents: vec![ParentShape {
                parent: ResolvedParent {
                    id: 1,
                    division_id: None,
                },
                label: "only".to_string(),
                footprint: square(0.0, 10.0),
            }],
        };

        let far_away = feature(&[("RID", "5")], square(100.0, 2.0));
        let failure = locator.locate(Level::Range, &far_away).unwrap_err();
        assert!(matches!(failure, ResolutionFailure::Orphaned { .. }));
    }
}
