use std::collections::BTreeMap;

use serde_json::Value;

use crate::types::{Footprint, Level, UnsupportedGeometryError};

/// One feature read from a boundary layer: tabular attributes plus the
/// normalized footprint, already reprojected to WGS84.
#[derive(Debug, Clone)]
pub struct BoundaryFeature {
    /// Zero-based position in the source layer, used in log and failure
    /// messages since business keys are not guaranteed present.
    pub index: usize,
    pub attributes: BTreeMap<String, Value>,
    pub footprint: Footprint,
}

impl BoundaryFeature {
    /// Attribute as a trimmed string.
    ///
    /// Numeric attribute values with no fractional part are rendered as
    /// integers, so a DBF numeric `1.0` matches the business key `"1"`.
    pub fn attr_str(&self, field: &str) -> Option<String> {
        match self.attributes.get(field)? {
            Value::String(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(number) => {
                if let Some(integer) = number.as_i64() {
                    Some(integer.to_string())
                } else {
                    number.as_f64().map(|float| {
                        if float.fract() == 0.0 {
                            format!("{}", float as i64)
                        } else {
                            float.to_string()
                        }
                    })
                }
            }
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    /// Attribute as a float, accepting numeric strings.
    pub fn attr_f64(&self, field: &str) -> Option<f64> {
        match self.attributes.get(field)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// A stable label for reports: the business key when present, the
    /// source index otherwise.
    pub fn label(&self, level: Level) -> String {
        self.attr_str(level.key_attribute())
            .unwrap_or_else(|| format!("#{}", self.index))
    }
}

/// A feature whose geometry could not be used, kept for reporting.
#[derive(Debug, Clone)]
pub struct SkippedFeature {
    pub index: usize,
    pub error: UnsupportedGeometryError,
}

/// All usable features of one layer, plus the ones the reader skipped.
#[derive(Debug, Clone)]
pub struct FeatureCollection {
    pub level: Level,
    pub features: Vec<BoundaryFeature>,
    pub skipped: Vec<SkippedFeature>,
    /// EPSG code the layer was read in, before normalization to WGS84.
    pub source_epsg: u32,
}

impl FeatureCollection {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            features: Vec::new(),
            skipped: Vec::new(),
            source_epsg: 4326,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;
    use serde_json::json;

    fn feature_with(attributes: BTreeMap<String, Value>) -> BoundaryFeature {
        BoundaryFeature {
            index: 3,
            attributes,
            footprint: Footprint::from(polygon![
                (x: 0.0, y: 0.0),
                (x: 1.0, y: 0.0),
                (x: 1.0, y: 1.0),
                (x: 0.0, y: 0.0),
            ]),
        }
    }

    #[test]
    fn test_attr_str_normalizes_numbers_and_whitespace() {
        let mut attributes = BTreeMap::new();
        attributes.insert("DID".to_string(), json!(1.0));
        attributes.insert("RID".to_string(), json!(" 031 "));
        attributes.insert("Beat_Ar".to_string(), json!(12.5));
        attributes.insert("Blank".to_string(), json!("   "));
        let feature = feature_with(attributes);

        assert_eq!(feature.attr_str("DID"), Some("1".to_string()));
        assert_eq!(feature.attr_str("RID"), Some("031".to_string()));
        assert_eq!(feature.attr_str("Beat_Ar"), Some("12.5".to_string()));
        assert_eq!(feature.attr_str("Blank"), None);
        assert_eq!(feature.attr_str("Missing"), None);
    }

    #[test]
    fn test_attr_f64_accepts_numeric_strings() {
        let mut attributes = BTreeMap::new();
        attributes.insert("Beat_Ar".to_string(), json!("42.25"));
        let feature = feature_with(attributes);

        assert_eq!(feature.attr_f64("Beat_Ar"), Some(42.25));
        assert_eq!(feature.attr_f64("Missing"), None);
    }

    #[test]
    fn test_label_falls_back_to_index() {
        let feature = feature_with(BTreeMap::new());
        assert_eq!(feature.label(Level::Beat), "#3");
    }
}
