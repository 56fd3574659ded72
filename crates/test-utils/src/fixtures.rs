//! Common test fixtures: areas of interest, features and service bodies.

use std::io::Write;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use tempfile::NamedTempFile;
use wfs_common::{AreaOfInterest, BoundingBox};
use wfs_protocol::RawResponse;

/// Common bounding boxes, geographic (lon/lat).
pub mod bbox {
    /// Central Seoul
    pub const SEOUL: (f64, f64, f64, f64) = (126.9, 37.5, 127.1, 37.6);

    /// Map center used by the smoke test
    pub const KOREA_CENTER: (f64, f64) = (127.5, 36.3);

    /// Unit square at the origin, handy for clipping arithmetic
    pub const UNIT: (f64, f64, f64, f64) = (0.0, 0.0, 1.0, 1.0);
}

/// Rectangular AOI from `(min_x, min_y, max_x, max_y)`.
pub fn rect_aoi(b: (f64, f64, f64, f64)) -> AreaOfInterest {
    AreaOfInterest::from_bbox(&BoundingBox::new(b.0, b.1, b.2, b.3))
        .expect("fixture bbox must have area")
}

pub fn seoul_aoi() -> AreaOfInterest {
    rect_aoi(bbox::SEOUL)
}

pub fn unit_aoi() -> AreaOfInterest {
    rect_aoi(bbox::UNIT)
}

/// Closed rectangular ring.
pub fn rect_ring(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<Vec<f64>> {
    vec![
        vec![min_x, min_y],
        vec![max_x, min_y],
        vec![max_x, max_y],
        vec![min_x, max_y],
        vec![min_x, min_y],
    ]
}

fn feature(id: &str, value: Value) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), serde_json::Value::from(id));
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: Some(geojson::feature::Id::String(id.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn rect_feature(id: &str, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Feature {
    feature(id, Value::Polygon(vec![rect_ring(min_x, min_y, max_x, max_y)]))
}

pub fn point_feature(id: &str, x: f64, y: f64) -> Feature {
    feature(id, Value::Point(vec![x, y]))
}

pub fn multi_point_feature(id: &str, points: &[(f64, f64)]) -> Feature {
    feature(
        id,
        Value::MultiPoint(points.iter().map(|&(x, y)| vec![x, y]).collect()),
    )
}

pub fn line_feature(id: &str, points: &[(f64, f64)]) -> Feature {
    feature(
        id,
        Value::LineString(points.iter().map(|&(x, y)| vec![x, y]).collect()),
    )
}

/// A feature without geometry.
pub fn bare_feature(id: &str) -> Feature {
    Feature {
        geometry: None,
        ..feature(id, Value::Point(vec![0.0, 0.0]))
    }
}

pub fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn empty_collection() -> FeatureCollection {
    collection(Vec::new())
}

/// A 200 JSON response carrying `fc`.
pub fn json_response(fc: &FeatureCollection) -> RawResponse {
    let body = serde_json::to_string(fc).expect("feature collection serializes");
    RawResponse::new(200, "application/json;charset=UTF-8", body)
}

/// A 200 XML exception report, as the service sends for a bad key.
pub fn exception_response(message: &str) -> RawResponse {
    RawResponse::new(
        200,
        "text/xml",
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <ServiceExceptionReport><ServiceException>{}</ServiceException>\
             </ServiceExceptionReport>",
            message
        ),
    )
}

pub fn status_response(status: u16, body: &str) -> RawResponse {
    RawResponse::new(status, "text/html", body)
}

/// Capabilities document advertising the given feature types.
pub fn capabilities_response(type_names: &[&str]) -> RawResponse {
    let types: String = type_names
        .iter()
        .map(|n| format!("<FeatureType><Name>{}</Name></FeatureType>", n))
        .collect();
    RawResponse::new(
        200,
        "text/xml",
        format!(
            "<wfs:WFS_Capabilities xmlns:wfs=\"http://www.opengis.net/wfs\">\
             <FeatureTypeList>{}</FeatureTypeList></wfs:WFS_Capabilities>",
            types
        ),
    )
}

/// Write `contents` to a temporary file that lives as long as the handle.
pub fn temp_file_with(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_feature_shape() {
        let f = rect_feature("a", 0.0, 0.0, 2.0, 1.0);
        match f.geometry.unwrap().value {
            Value::Polygon(rings) => {
                assert_eq!(rings.len(), 1);
                assert_eq!(rings[0].first(), rings[0].last());
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_json_response_round_trips() {
        let fc = collection(vec![point_feature("p", 1.0, 2.0)]);
        let resp = json_response(&fc);
        assert!(resp.declares_json());
        let parsed: FeatureCollection = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(parsed.features.len(), 1);
    }

    #[test]
    fn test_unit_aoi() {
        let aoi = unit_aoi();
        assert_eq!(aoi.ring_count(), 1);
        let bbox = aoi.bounding_box().unwrap();
        assert_eq!((bbox.min_x, bbox.max_x), (0.0, 1.0));
    }
}
