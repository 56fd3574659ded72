//! AOI inputs, output files and summaries.

use feature_store::LayerStatus;
use layer_fetch::{
    format_smoke, format_statuses, load_aoi_file, mercator_bbox, smoke_aoi, write_collection,
    SmokeResult,
};
use test_utils::{assert_within_bbox, bbox, collection, rect_feature, seoul_aoi, temp_file_with};
use wfs_common::LayerKey;

#[test]
fn test_write_collection_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("layers");
    let fc = collection(vec![rect_feature("zone", 0.0, 0.0, 1.0, 1.0)]);

    let path = write_collection(&out, &LayerKey::new("urban"), &fc).unwrap();

    assert_eq!(path, out.join("urban.geojson"));
    let written: geojson::FeatureCollection =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written.features.len(), 1);
}

#[test]
fn test_load_aoi_file() {
    let file = temp_file_with(
        r#"{"type":"Polygon","coordinates":[[[126.9,37.5],[127.1,37.5],[127.1,37.6],[126.9,37.6],[126.9,37.5]]]}"#,
    );

    let aoi = load_aoi_file(file.path()).unwrap();

    assert_eq!(aoi, seoul_aoi());
}

#[test]
fn test_load_aoi_file_rejects_point() {
    let file = temp_file_with(r#"{"type":"Point","coordinates":[127.0,37.5]}"#);
    assert!(load_aoi_file(file.path()).is_err());
}

#[test]
fn test_mercator_bbox_is_rounded_meters() {
    let bbox = mercator_bbox(&seoul_aoi()).unwrap();

    assert_eq!(bbox.min_x, bbox.min_x.round());
    assert!(bbox.min_x > 14_000_000.0 && bbox.max_x < 14_200_000.0);
    assert!(bbox.min_y > 4_500_000.0 && bbox.max_y < 4_530_000.0);
}

#[test]
fn test_format_smoke() {
    let results = vec![
        SmokeResult {
            key: LayerKey::new("admin"),
            outcome: Ok(3),
        },
        SmokeResult {
            key: LayerKey::new("urban"),
            outcome: Err("Transport failure: timeout".to_string()),
        },
    ];

    let text = format_smoke(&results);

    assert_eq!(
        text,
        "✔ admin (3 features)\n✖ urban: Transport failure: timeout\n"
    );
}

#[test]
fn test_format_statuses() {
    let statuses = vec![
        LayerStatus {
            key: LayerKey::new("urban"),
            label: "Urban".to_string(),
            color: "#3b82f6".to_string(),
            fetched: true,
            count: Some(12),
            visible: true,
        },
        LayerStatus {
            key: LayerKey::new("roads"),
            label: "Roads".to_string(),
            color: "#93c5fd".to_string(),
            fetched: false,
            count: None,
            visible: false,
        },
    ];

    let text = format_statuses(&statuses);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("urban") && lines[1].contains("shown") && lines[1].contains("12"));
    assert!(lines[2].starts_with("roads") && lines[2].ends_with("Roads"));
}

#[test]
fn test_smoke_aoi_covers_map_center() {
    let (lon, lat) = bbox::KOREA_CENTER;
    let extent = smoke_aoi(lon, lat).unwrap().bounding_box().unwrap();

    assert_within_bbox!(
        (lon, lat),
        (extent.min_x, extent.min_y, extent.max_x, extent.max_y),
        0.0
    );
    assert!((extent.width() - 0.04).abs() < 1e-9);
}
