//! Clipping behavior per geometry type.

use clipper::{clip_collection, ClipOutcome, Clipper, SkipReason};
use geo::{Area, BoundingRect};
use geojson::{Feature, Value};
use test_utils::{
    assert_approx_eq, assert_within_bbox, bare_feature, collection, line_feature,
    multi_point_feature, point_feature, rect_aoi, rect_feature, unit_aoi,
};

fn geo_geometry(feature: &Feature) -> geo_types::Geometry<f64> {
    let value = feature.geometry.as_ref().unwrap().value.clone();
    geo_types::Geometry::try_from(value).unwrap()
}

fn all_positions(value: &Value) -> Vec<(f64, f64)> {
    match value {
        Value::Point(p) => vec![(p[0], p[1])],
        Value::MultiPoint(ps) | Value::LineString(ps) => ps.iter().map(|p| (p[0], p[1])).collect(),
        Value::Polygon(rings) | Value::MultiLineString(rings) => rings
            .iter()
            .flat_map(|r| r.iter().map(|p| (p[0], p[1])))
            .collect(),
        Value::MultiPolygon(polys) => polys
            .iter()
            .flat_map(|rings| rings.iter().flat_map(|r| r.iter().map(|p| (p[0], p[1]))))
            .collect(),
        Value::GeometryCollection(gs) => gs.iter().flat_map(|g| all_positions(&g.value)).collect(),
    }
}

#[test]
fn test_polygon_fully_inside_is_unchanged() {
    let aoi = unit_aoi();
    let input = rect_feature("inside", 0.2, 0.3, 0.6, 0.7);
    let before = geo_geometry(&input);

    let (out, report) = clip_collection(collection(vec![input]), &aoi);

    assert_eq!(out.features.len(), 1);
    assert_eq!(report.kept, 1);
    let after = geo_geometry(&out.features[0]);
    assert!(matches!(after, geo_types::Geometry::Polygon(_)));
    assert_approx_eq!(after.unsigned_area(), before.unsigned_area(), 1e-12);

    let (a, b) = (
        after.bounding_rect().unwrap(),
        before.bounding_rect().unwrap(),
    );
    assert_approx_eq!(a.min().x, b.min().x, 1e-12);
    assert_approx_eq!(a.min().y, b.min().y, 1e-12);
    assert_approx_eq!(a.max().x, b.max().x, 1e-12);
    assert_approx_eq!(a.max().y, b.max().y, 1e-12);
}

#[test]
fn test_partial_overlap_is_trimmed_to_aoi() {
    let aoi = unit_aoi();
    let input = rect_feature("overlap", 0.5, -0.5, 1.5, 0.5);

    let (out, report) = clip_collection(collection(vec![input]), &aoi);

    assert_eq!(out.features.len(), 1);
    assert_eq!(report.modified, 1);
    let clipped = &out.features[0];
    assert_eq!(clipped.properties.as_ref().unwrap()["name"], "overlap");

    let geometry = clipped.geometry.as_ref().unwrap();
    let positions = all_positions(&geometry.value);
    assert!(!positions.is_empty());
    for (x, y) in positions {
        assert_within_bbox!((x, y), (0.0, 0.0, 1.0, 1.0), 1e-9);
    }
    assert_approx_eq!(geo_geometry(clipped).unsigned_area(), 0.25, 1e-9);
}

#[test]
fn test_disjoint_polygon_dropped() {
    let (out, report) = clip_collection(
        collection(vec![rect_feature("far", 10.0, 10.0, 11.0, 11.0)]),
        &unit_aoi(),
    );
    assert!(out.features.is_empty());
    assert_eq!(report.outside, 1);
}

#[test]
fn test_edge_touching_polygon_dropped() {
    let (out, report) = clip_collection(
        collection(vec![rect_feature("touch", 1.0, 0.0, 2.0, 1.0)]),
        &unit_aoi(),
    );
    assert!(out.features.is_empty());
    assert_eq!(report.empty_intersection + report.outside, 1);
}

#[test]
fn test_polygon_split_into_multipolygon() {
    // A U-shaped AOI cut by a horizontal bar yields two parts
    let aoi = wfs_common::AreaOfInterest::from_geojson_str(
        r#"{"type":"Polygon","coordinates":[[[0,0],[3,0],[3,3],[2,3],[2,1],[1,1],[1,3],[0,3],[0,0]]]}"#,
    )
    .unwrap();
    let bar = rect_feature("bar", -1.0, 2.0, 4.0, 2.5);

    let (out, _) = clip_collection(collection(vec![bar]), &aoi);

    assert_eq!(out.features.len(), 1);
    match &out.features[0].geometry.as_ref().unwrap().value {
        Value::MultiPolygon(parts) => assert_eq!(parts.len(), 2),
        other => panic!("expected MultiPolygon, got {:?}", other),
    }
}

#[test]
fn test_multipoint_keeps_inside_subset() {
    let input = multi_point_feature("pts", &[(0.5, 0.5), (2.0, 2.0), (-1.0, 0.5)]);

    let (out, _) = clip_collection(collection(vec![input]), &unit_aoi());

    assert_eq!(out.features.len(), 1);
    match &out.features[0].geometry.as_ref().unwrap().value {
        Value::MultiPoint(points) => {
            assert_eq!(points.len(), 1);
            assert_eq!(points[0], vec![0.5, 0.5]);
        }
        other => panic!("expected MultiPoint, got {:?}", other),
    }
}

#[test]
fn test_multipoint_all_outside_dropped() {
    let input = multi_point_feature("pts", &[(2.0, 2.0), (3.0, 3.0)]);
    let (out, _) = clip_collection(collection(vec![input]), &unit_aoi());
    assert!(out.features.is_empty());
}

#[test]
fn test_points_inside_and_on_boundary_kept() {
    let fc = collection(vec![
        point_feature("inside", 0.5, 0.5),
        point_feature("edge", 1.0, 0.5),
        point_feature("corner", 0.0, 0.0),
        point_feature("outside", 1.5, 0.5),
    ]);

    let (out, _) = clip_collection(fc, &unit_aoi());

    let names: Vec<String> = out
        .features
        .iter()
        .map(|f| f.properties.as_ref().unwrap()["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["inside", "edge", "corner"]);
}

#[test]
fn test_crossing_line_kept_unclipped() {
    let input = line_feature("road", &[(-1.0, 0.5), (2.0, 0.5)]);

    let (out, report) = clip_collection(collection(vec![input.clone()]), &unit_aoi());

    assert_eq!(out.features.len(), 1);
    assert_eq!(report.modified, 0);
    assert_eq!(out.features[0].geometry, input.geometry);
}

#[test]
fn test_disjoint_line_dropped() {
    let input = line_feature("road", &[(5.0, 5.0), (6.0, 6.0)]);
    let (out, _) = clip_collection(collection(vec![input]), &unit_aoi());
    assert!(out.features.is_empty());
}

#[test]
fn test_missing_geometry_skipped_without_aborting() {
    let fc = collection(vec![
        bare_feature("nothing"),
        point_feature("inside", 0.5, 0.5),
    ]);

    let (out, report) = clip_collection(fc, &unit_aoi());

    assert_eq!(out.features.len(), 1);
    assert_eq!(report.no_geometry, 1);
}

#[test]
fn test_clip_feature_outcome() {
    let clipper = Clipper::new(&rect_aoi((126.9, 37.5, 127.1, 37.6)));
    assert!(matches!(
        clipper.clip_feature(point_feature("seoul", 127.0, 37.55)),
        ClipOutcome::Keep(_)
    ));
    assert!(matches!(
        clipper.clip_feature(point_feature("busan", 129.07, 35.18)),
        ClipOutcome::Skip(SkipReason::Outside)
    ));
}

#[test]
fn test_order_preserved() {
    let fc = collection(vec![
        point_feature("a", 0.1, 0.1),
        point_feature("x", 9.0, 9.0),
        rect_feature("b", 0.5, 0.5, 2.0, 2.0),
        point_feature("c", 0.9, 0.9),
    ]);
    let (out, _) = clip_collection(fc, &unit_aoi());
    let names: Vec<&str> = out
        .features
        .iter()
        .map(|f| f.properties.as_ref().unwrap()["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}
