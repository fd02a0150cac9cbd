use geo::{Area, Centroid, Contains, EuclideanLength};
use geo_types::{Geometry, MultiPolygon, Point, Polygon};
use thiserror::Error;
use wkt::ToWkt;

/// Raised when a source feature carries a geometry that is not areal.
///
/// Only polygons and multi-polygons can describe an administrative
/// boundary; anything else is skipped by the reader, never imported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported geometry type: {geometry_type}")]
pub struct UnsupportedGeometryError {
    pub geometry_type: String,
}

/// The normalized geometry owned by a division, range, or beat.
///
/// Single polygons are stored as one-element multi-polygons so that every
/// footprint serializes to the same `MULTIPOLYGON` shape downstream,
/// regardless of how the source layer encoded it.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint(MultiPolygon<f64>);

impl Footprint {
    /// Builds a footprint from any geometry, normalizing single polygons.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedGeometryError`] for every geometry type other
    /// than `Polygon` and `MultiPolygon`.
    pub fn new(geometry: Geometry<f64>) -> Result<Self, UnsupportedGeometryError> {
        match geometry {
            Geometry::Polygon(polygon) => Ok(Self::from(polygon)),
            Geometry::MultiPolygon(multi) => Ok(Self::from(multi)),
            other => Err(UnsupportedGeometryError {
                geometry_type: geometry_type_name(&other).to_string(),
            }),
        }
    }

    /// The normalized multi-polygon.
    pub fn as_multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.0
    }

    /// Planar centroid, `None` only for empty geometries.
    pub fn centroid(&self) -> Option<Point<f64>> {
        self.0.centroid()
    }

    /// Whether the footprint contains the given point.
    pub fn contains(&self, point: &Point<f64>) -> bool {
        self.0.contains(point)
    }

    /// Unsigned planar area in squared coordinate units.
    pub fn area(&self) -> f64 {
        self.0.unsigned_area()
    }

    /// Total ring length (exterior plus holes) in coordinate units.
    pub fn perimeter(&self) -> f64 {
        self.0
            .iter()
            .map(|polygon| {
                polygon.exterior().euclidean_length()
                    + polygon
                        .interiors()
                        .iter()
                        .map(|ring| ring.euclidean_length())
                        .sum::<f64>()
            })
            .sum()
    }

    /// EWKT encoding used by the polygon tables, e.g.
    /// `SRID=4326;MULTIPOLYGON(((0 0,1 0,1 1,0 0)))`.
    pub fn to_ewkt(&self) -> String {
        format!("SRID=4326;{}", self.0.wkt_string())
    }
}

impl From<Polygon<f64>> for Footprint {
    fn from(polygon: Polygon<f64>) -> Self {
        Footprint(MultiPolygon(vec![polygon]))
    }
}

impl From<MultiPolygon<f64>> for Footprint {
    fn from(multi: MultiPolygon<f64>) -> Self {
        Footprint(multi)
    }
}

fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
