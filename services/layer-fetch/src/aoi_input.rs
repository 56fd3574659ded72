//! Turning command-line arguments into an area of interest.

use std::path::Path;

use anyhow::{bail, Context, Result};
use projection::Mercator;
use wfs_common::{AreaOfInterest, BoundingBox};

/// Half-size in degrees of the smoke-test box.
pub const SMOKE_HALF_SIZE: f64 = 0.02;

/// Read a GeoJSON polygon, feature or collection from disk.
pub fn load_aoi_file(path: &Path) -> Result<AreaOfInterest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read AOI file {}", path.display()))?;
    AreaOfInterest::from_geojson_str(&content)
        .with_context(|| format!("Invalid AOI in {}", path.display()))
}

/// AOI rectangle from "minLon,minLat,maxLon,maxLat".
pub fn parse_bbox_aoi(s: &str) -> Result<AreaOfInterest> {
    let bbox = BoundingBox::from_param(s)?;
    Ok(AreaOfInterest::from_bbox(&bbox)?)
}

/// "lon,lat" pair.
pub fn parse_center(s: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        bail!("expected 'lon,lat', got '{}'", s);
    }
    let lon: f64 = parts[0]
        .parse()
        .with_context(|| format!("invalid longitude '{}'", parts[0]))?;
    let lat: f64 = parts[1]
        .parse()
        .with_context(|| format!("invalid latitude '{}'", parts[1]))?;
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        bail!("center out of range: {},{}", lon, lat);
    }
    Ok((lon, lat))
}

/// Small square AOI around a point.
pub fn smoke_aoi(lon: f64, lat: f64) -> Result<AreaOfInterest> {
    let bbox = BoundingBox::around(lon, lat, SMOKE_HALF_SIZE, SMOKE_HALF_SIZE);
    Ok(AreaOfInterest::from_bbox(&bbox)?)
}

/// The AOI's bounding box in Web Mercator meters, rounded.
pub fn mercator_bbox(aoi: &AreaOfInterest) -> Option<BoundingBox> {
    let proj = Mercator::default();
    aoi.bounding_box()
        .map(|bbox| proj.project_bbox(&bbox).rounded())
}
