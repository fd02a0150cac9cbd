//! Coordinate reference system handling for boundary layers.
//!
//! The CRS comes from the sibling `.prj` file, which holds the projection
//! in WKT form. The EPSG code is taken from the last `AUTHORITY` entry
//! (the one describing the CRS as a whole). Layers without a `.prj` are
//! treated as already being in WGS84.
use std::fs;
use std::path::Path;

use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use proj4rs::Proj;

use crate::errors::SourceReadError;

/// The canonical reference system every layer is normalized to.
pub const WGS84_EPSG: u32 = 4326;

/// Reads the layer's `.prj` sibling and extracts the EPSG code, if any.
pub fn detect_epsg(shapefile_path: &Path) -> Result<Option<u32>, SourceReadError> {
    let prj_path = shapefile_path.with_extension("prj");
    if !prj_path.exists() {
        return Ok(None);
    }
    let wkt = fs::read_to_string(&prj_path).map_err(|source| SourceReadError::Io {
        path: prj_path.clone(),
        source,
    })?;
    Ok(parse_authority_epsg(&wkt))
}

/// Extracts the EPSG code from a projection WKT string.
///
/// Nested coordinate systems carry several `AUTHORITY["EPSG","…"]`
/// entries (datum, spheroid, axes); the last one identifies the CRS
/// itself.
pub(crate) fn parse_authority_epsg(wkt: &str) -> Option<u32> {
    let mut result = None;
    let mut rest = wkt;
    while let Some(position) = rest.find("AUTHORITY[") {
        let tail = &rest[position + "AUTHORITY[".len()..];
        if let Some(code) = authority_code(tail) {
            result = Some(code);
        }
        rest = tail;
    }
    result
}

fn authority_code(tail: &str) -> Option<u32> {
    let end = tail.find(']')?;
    let mut parts = tail[..end].split(',');
    let agency = parts.next()?.trim().trim_matches('"');
    if !agency.eq_ignore_ascii_case("EPSG") {
        return None;
    }
    parts.next()?.trim().trim_matches('"').parse().ok()
}

/// A source-to-WGS84 transformation for one layer.
pub struct LayerProjection {
    source: Proj,
    target: Proj,
    source_is_latlong: bool,
}

impl std::fmt::Debug for LayerProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerProjection")
            .field("source_is_latlong", &self.source_is_latlong)
            .finish_non_exhaustive()
    }
}

impl LayerProjection {
    /// Builds the transformation from a source EPSG code to WGS84.
    ///
    /// # Errors
    ///
    /// [`SourceReadError::UnknownCrs`] when no definition exists for the
    /// code.
    pub fn to_wgs84(epsg: u32) -> Result<Self, SourceReadError> {
        let definition = u16::try_from(epsg)
            .ok()
            .and_then(crs_definitions::from_code)
            .ok_or(SourceReadError::UnknownCrs { epsg })?;
        let source = Proj::from_proj_string(definition.proj4)
            .map_err(|error| SourceReadError::Projection(error.to_string()))?;
        let target = Proj::from_proj_string("+proj=longlat +datum=WGS84 +no_defs")
            .map_err(|error| SourceReadError::Projection(error.to_string()))?;
        let source_is_latlong = source.is_latlong();
        Ok(Self {
            source,
            target,
            source_is_latlong,
        })
    }

    /// Transforms one coordinate pair into WGS84 degrees.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), SourceReadError> {
        // proj4rs works in radians for geographic systems.
        let mut point = if self.source_is_latlong {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };
        proj4rs::transform::transform(&self.source, &self.target, &mut point)
            .map_err(|error| SourceReadError::Projection(error.to_string()))?;
        Ok((point.0.to_degrees(), point.1.to_degrees()))
    }
}

/// Reprojects every coordinate of a multi-polygon.
pub(crate) fn reproject_multi_polygon(
    multi: &MultiPolygon<f64>,
    projection: &LayerProjection,
) -> Result<MultiPolygon<f64>, SourceReadError> {
    let mut polygons = Vec::with_capacity(multi.0.len());
    for polygon in multi.iter() {
        let exterior = reproject_ring(polygon.exterior(), projection)?;
        let interiors = polygon
            .interiors()
            .iter()
            .map(|ring| reproject_ring(ring, projection))
            .collect::<Result<Vec<_>, _>>()?;
        polygons.push(Polygon::new(exterior, interiors));
    }
    Ok(MultiPolygon(polygons))
}

fn reproject_ring(
    ring: &LineString<f64>,
    projection: &LayerProjection,
) -> Result<LineString<f64>, SourceReadError> {
    let coords = ring
        .coords()
        .map(|coord| {
            projection
                .transform(coord.x, coord.y)
                .map(|(x, y)| Coord { x, y })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LineString::from(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#;

    const UTM_43N_PRJ: &str = r#"PROJCS["WGS_1984_UTM_Zone_43N",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433],AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],UNIT["Meter",1.0],AUTHORITY["EPSG","32643"]]"#;

    #[test]
    fn test_parse_authority_takes_last_entry() {
        assert_eq!(parse_authority_epsg(WGS84_PRJ), Some(4326));
        assert_eq!(parse_authority_epsg(UTM_43N_PRJ), Some(32643));
    }

    #[test]
    fn test_parse_authority_handles_absent_entries() {
        assert_eq!(parse_authority_epsg("GEOGCS[\"GCS_WGS_1984\"]"), None);
        assert_eq!(parse_authority_epsg(""), None);
    }

    #[test]
    fn test_detect_epsg_without_prj_file() {
        let dir = tempfile::tempdir().unwrap();
        let shp = dir.path().join("Division.shp");
        assert_eq!(detect_epsg(&shp).unwrap(), None);
    }

    #[test]
    fn test_detect_epsg_from_prj_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let shp = dir.path().join("Range.shp");
        let mut prj = std::fs::File::create(dir.path().join("Range.prj")).unwrap();
        prj.write_all(UTM_43N_PRJ.as_bytes()).unwrap();

        assert_eq!(detect_epsg(&shp).unwrap(), Some(32643));
    }

    #[test]
    fn test_utm_transform_lands_in_zone_43() {
        let projection = LayerProjection::to_wgs84(32643).unwrap();
        // 500km easting is the UTM zone's central meridian, 75°E.
        let (lon, lat) = projection.transform(500_000.0, 2_500_000.0).unwrap();
        assert!((lon - 75.0).abs() < 1e-6, "lon was {lon}");
        assert!(lat > 22.0 && lat < 23.0, "lat was {lat}");
    }

    #[test]
    fn test_unknown_epsg_is_rejected() {
        let error = LayerProjection::to_wgs84(999_999).unwrap_err();
        assert!(matches!(error, SourceReadError::UnknownCrs { epsg: 999_999 }));
    }
}
