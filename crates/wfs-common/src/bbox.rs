//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic or projected bounding box.
///
/// For geographic CRS (EPSG:4326), coordinates are lon/lat degrees.
/// For projected CRS (EPSG:900913), coordinates are in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a comma separated "minx,miny,maxx,maxy" string.
    ///
    /// A trailing CRS token (e.g. "...,EPSG:900913") is accepted and ignored.
    pub fn from_param(s: &str) -> Result<Self, BboxParseError> {
        let mut parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() == 5 && parts[4].contains(':') {
            parts.pop();
        }
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let parse = |v: &str| {
            v.parse::<f64>()
                .map_err(|_| BboxParseError::InvalidNumber(v.to_string()))
        };

        let bbox = Self {
            min_x: parse(parts[0])?,
            min_y: parse(parts[1])?,
            max_x: parse(parts[2])?,
            max_y: parse(parts[3])?,
        };

        if bbox.min_x > bbox.max_x || bbox.min_y > bbox.max_y {
            return Err(BboxParseError::Inverted(s.to_string()));
        }

        Ok(bbox)
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Copy of this bbox with every corner rounded to the nearest integer.
    pub fn rounded(&self) -> Self {
        Self {
            min_x: self.min_x.round(),
            min_y: self.min_y.round(),
            max_x: self.max_x.round(),
            max_y: self.max_y.round(),
        }
    }

    /// Box of half-size (dx, dy) centered on (x, y).
    pub fn around(x: f64, y: f64, dx: f64, dy: f64) -> Self {
        Self::new(x - dx, y - dy, x + dx, y + dy)
    }
}

impl From<geo::Rect<f64>> for BoundingBox {
    fn from(rect: geo::Rect<f64>) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid BBOX format: {0}. Expected 'minx,miny,maxx,maxy'")]
    InvalidFormat(String),

    #[error("Invalid number in BBOX: {0}")]
    InvalidNumber(String),

    #[error("BBOX minimum exceeds maximum: {0}")]
    Inverted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox_param() {
        let bbox = BoundingBox::from_param("126.9,37.5,127.1,37.6").unwrap();
        assert_eq!(bbox.min_x, 126.9);
        assert_eq!(bbox.min_y, 37.5);
        assert_eq!(bbox.max_x, 127.1);
        assert_eq!(bbox.max_y, 37.6);
    }

    #[test]
    fn test_parse_with_crs_suffix() {
        let bbox = BoundingBox::from_param("13987670,3912271,14359383,4642932,EPSG:900913").unwrap();
        assert_eq!(bbox.min_x, 13987670.0);
        assert_eq!(bbox.max_y, 4642932.0);
    }

    #[test]
    fn test_rounded() {
        let bbox = BoundingBox::new(1.4, 1.5, -2.5, 2.6).rounded();
        assert_eq!(bbox, BoundingBox::new(1.0, 2.0, -3.0, 3.0));
    }
}
