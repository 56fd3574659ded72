//! Apply a Mercator transform to every coordinate of a GeoJSON structure.
//!
//! Geometry type and nesting are preserved. Only the first two ordinates of a
//! position are touched; any further ordinates (elevation) pass through.

use geojson::{Feature, FeatureCollection, Geometry, Position, Value};

use crate::Mercator;

/// Which way to transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Geographic degrees to projected meters
    Forward,
    /// Projected meters to geographic degrees
    Inverse,
}

impl Direction {
    fn apply(self, proj: &Mercator, x: f64, y: f64) -> (f64, f64) {
        match self {
            Direction::Forward => proj.forward(x, y),
            Direction::Inverse => proj.inverse(x, y),
        }
    }
}

/// Reproject every feature of a collection in place and return it.
pub fn reproject_collection(
    mut collection: FeatureCollection,
    proj: &Mercator,
    direction: Direction,
) -> FeatureCollection {
    for feature in &mut collection.features {
        reproject_feature(feature, proj, direction);
    }
    if let Some(bbox) = collection.bbox.as_mut() {
        reproject_bbox(bbox, proj, direction);
    }
    collection
}

/// Reproject one feature's geometry and bbox. Properties and id are untouched.
pub fn reproject_feature(feature: &mut Feature, proj: &Mercator, direction: Direction) {
    if let Some(geometry) = feature.geometry.as_mut() {
        reproject_geometry(geometry, proj, direction);
    }
    if let Some(bbox) = feature.bbox.as_mut() {
        reproject_bbox(bbox, proj, direction);
    }
}

pub fn reproject_geometry(geometry: &mut Geometry, proj: &Mercator, direction: Direction) {
    if let Some(bbox) = geometry.bbox.as_mut() {
        reproject_bbox(bbox, proj, direction);
    }

    match &mut geometry.value {
        Value::Point(p) => reproject_position(p, proj, direction),
        Value::MultiPoint(points) | Value::LineString(points) => {
            reproject_positions(points, proj, direction)
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            for line in lines {
                reproject_positions(line, proj, direction);
            }
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                for ring in rings {
                    reproject_positions(ring, proj, direction);
                }
            }
        }
        Value::GeometryCollection(members) => {
            for member in members {
                reproject_geometry(member, proj, direction);
            }
        }
    }
}

fn reproject_positions(positions: &mut [Position], proj: &Mercator, direction: Direction) {
    for p in positions {
        reproject_position(p, proj, direction);
    }
}

fn reproject_position(position: &mut Position, proj: &Mercator, direction: Direction) {
    if position.len() < 2 {
        return;
    }
    let (x, y) = direction.apply(proj, position[0], position[1]);
    position[0] = x;
    position[1] = y;
}

/// Reproject a 2D bbox [minx, miny, maxx, maxy]. 3D bboxes keep their z range.
fn reproject_bbox(bbox: &mut [f64], proj: &Mercator, direction: Direction) {
    match bbox.len() {
        4 => {
            let (a, b) = direction.apply(proj, bbox[0], bbox[1]);
            let (c, d) = direction.apply(proj, bbox[2], bbox[3]);
            bbox.copy_from_slice(&[a, b, c, d]);
        }
        6 => {
            let (a, b) = direction.apply(proj, bbox[0], bbox[1]);
            let (c, d) = direction.apply(proj, bbox[3], bbox[4]);
            bbox[0] = a;
            bbox[1] = b;
            bbox[3] = c;
            bbox[4] = d;
        }
        _ => {}
    }
}
