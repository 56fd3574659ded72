//! Spherical ("web") Mercator projection.
//!
//! The feature service answers in EPSG:900913, which is the spherical form of
//! Mercator on the WGS84 semi-major axis. Latitudes are clamped to the square
//! world extent (±85.05112878°) before projecting.

use std::f64::consts::PI;

use wfs_common::BoundingBox;

/// Sphere radius used by spherical Mercator (WGS84 semi-major axis, meters).
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude at which the projected world becomes square (degrees).
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Spherical Mercator projection parameters.
#[derive(Debug, Clone, Copy)]
pub struct Mercator {
    /// Sphere radius (meters)
    pub radius: f64,
    /// Latitude clamp (degrees)
    pub max_latitude: f64,
}

impl Default for Mercator {
    fn default() -> Self {
        Self {
            radius: EARTH_RADIUS,
            max_latitude: MAX_LATITUDE,
        }
    }
}

impl Mercator {
    /// Clamp a latitude to the projectable range.
    pub fn clamp_latitude(&self, lat: f64) -> f64 {
        lat.clamp(-self.max_latitude, self.max_latitude)
    }

    /// Geographic (lon, lat degrees) to projected (x, y meters).
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lat = self.clamp_latitude(lat);
        let x = lon * PI / 180.0 * self.radius;
        let y = (PI / 4.0 + lat * PI / 360.0).tan().ln() * self.radius;
        (x, y)
    }

    /// Projected (x, y meters) to geographic (lon, lat degrees).
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / self.radius) * 180.0 / PI;
        let lat = (2.0 * (y / self.radius).exp().atan() - PI / 2.0) * 180.0 / PI;
        (lon, lat)
    }

    /// Project a geographic bbox corner-wise.
    ///
    /// Mercator is monotonic in both axes, so the projected corners bound
    /// the projected box.
    pub fn project_bbox(&self, bbox: &BoundingBox) -> BoundingBox {
        let (min_x, min_y) = self.forward(bbox.min_x, bbox.min_y);
        let (max_x, max_y) = self.forward(bbox.max_x, bbox.max_y);
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }

    /// Inverse of [`Mercator::project_bbox`].
    pub fn unproject_bbox(&self, bbox: &BoundingBox) -> BoundingBox {
        let (min_x, min_y) = self.inverse(bbox.min_x, bbox.min_y);
        let (max_x, max_y) = self.inverse(bbox.max_x, bbox.max_y);
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }

    /// Half the width of the projected world (meters).
    pub fn world_extent(&self) -> f64 {
        PI * self.radius
    }
}
