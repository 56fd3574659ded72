//! The area of interest that constrains every feature request.

use geo::{BoundingRect, Coord, LineString, MultiPolygon, Polygon};
use geojson::{GeoJson, Position};

use crate::{BoundingBox, WfsError, WfsResult};

/// A polygon or multi-polygon in EPSG:4326 (lon/lat degrees).
///
/// Always stored as a multi-polygon; a single polygon is a multi-polygon
/// with one member.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOfInterest {
    polygons: MultiPolygon<f64>,
}

impl AreaOfInterest {
    pub fn from_polygon(polygon: Polygon<f64>) -> WfsResult<Self> {
        Self::from_multi_polygon(MultiPolygon::new(vec![polygon]))
    }

    pub fn from_multi_polygon(polygons: MultiPolygon<f64>) -> WfsResult<Self> {
        let aoi = Self { polygons };
        if aoi.ring_count() == 0 {
            return Err(WfsError::InvalidInput("AOI has no rings".to_string()));
        }
        Ok(aoi)
    }

    /// Rectangle AOI, ring ordered counter-clockwise from the south-west corner.
    pub fn from_bbox(bbox: &BoundingBox) -> WfsResult<Self> {
        if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
            return Err(WfsError::InvalidInput(format!(
                "AOI rectangle has no area: {:?}",
                bbox
            )));
        }
        let ring = LineString::from(vec![
            (bbox.min_x, bbox.min_y),
            (bbox.max_x, bbox.min_y),
            (bbox.max_x, bbox.max_y),
            (bbox.min_x, bbox.max_y),
            (bbox.min_x, bbox.min_y),
        ]);
        Self::from_polygon(Polygon::new(ring, vec![]))
    }

    /// Build an AOI from GeoJSON.
    ///
    /// Accepts a bare geometry, a Feature, or a FeatureCollection whose first
    /// feature is the AOI (the shape a drawing control hands out).
    pub fn from_geojson(geojson: &GeoJson) -> WfsResult<Self> {
        let geometry = match geojson {
            GeoJson::Geometry(g) => Some(g),
            GeoJson::Feature(f) => f.geometry.as_ref(),
            GeoJson::FeatureCollection(fc) => {
                fc.features.first().and_then(|f| f.geometry.as_ref())
            }
        }
        .ok_or_else(|| WfsError::InvalidInput("AOI has no geometry".to_string()))?;

        match &geometry.value {
            geojson::Value::Polygon(rings) => Self::from_polygon(polygon_from_rings(rings)?),
            geojson::Value::MultiPolygon(polys) => {
                let polygons = polys
                    .iter()
                    .map(|rings| polygon_from_rings(rings))
                    .collect::<WfsResult<Vec<_>>>()?;
                Self::from_multi_polygon(MultiPolygon::new(polygons))
            }
            other => Err(WfsError::InvalidInput(format!(
                "AOI must be a Polygon or MultiPolygon, got {}",
                value_type_name(other)
            ))),
        }
    }

    /// Parse an AOI from GeoJSON text.
    pub fn from_geojson_str(s: &str) -> WfsResult<Self> {
        let geojson: GeoJson = s
            .parse()
            .map_err(|e| WfsError::InvalidInput(format!("AOI is not valid GeoJSON: {}", e)))?;
        Self::from_geojson(&geojson)
    }

    /// Number of non-empty rings across all polygons.
    pub fn ring_count(&self) -> usize {
        self.polygons
            .iter()
            .map(|p| {
                let exterior = usize::from(!p.exterior().0.is_empty());
                exterior + p.interiors().iter().filter(|r| !r.0.is_empty()).count()
            })
            .sum()
    }

    /// Geographic bounding box [minLon, minLat, maxLon, maxLat].
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.polygons.bounding_rect().map(BoundingBox::from)
    }

    pub fn multi_polygon(&self) -> &MultiPolygon<f64> {
        &self.polygons
    }

    /// The AOI as a GeoJSON geometry (Polygon when it has a single member).
    pub fn to_geojson(&self) -> geojson::Geometry {
        let value = if self.polygons.0.len() == 1 {
            geojson::Value::from(&self.polygons.0[0])
        } else {
            geojson::Value::from(&self.polygons)
        };
        geojson::Geometry::new(value)
    }
}

fn value_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn polygon_from_rings(rings: &[Vec<Position>]) -> WfsResult<Polygon<f64>> {
    let mut rings = rings.iter().map(|r| ring_from_positions(r));
    let exterior = rings
        .next()
        .ok_or_else(|| WfsError::InvalidInput("AOI has no rings".to_string()))??;
    let interiors = rings.collect::<WfsResult<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn ring_from_positions(positions: &[Position]) -> WfsResult<LineString<f64>> {
    if positions.len() < 4 {
        return Err(WfsError::InvalidInput(format!(
            "AOI ring needs at least 4 positions, got {}",
            positions.len()
        )));
    }
    if positions.first() != positions.last() {
        return Err(WfsError::InvalidInput("AOI ring is not closed".to_string()));
    }
    let coords = positions
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(WfsError::InvalidInput(
                "AOI position needs two ordinates".to_string(),
            )),
        })
        .collect::<WfsResult<Vec<_>>>()?;
    Ok(LineString::new(coords))
}
