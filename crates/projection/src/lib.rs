//! Coordinate reference system transformations.
//!
//! Spherical Mercator math implemented directly, plus recursive application
//! of a coordinate transform over GeoJSON geometries.

pub mod mercator;
pub mod transform;

pub use mercator::{Mercator, EARTH_RADIUS, MAX_LATITUDE};
pub use transform::{reproject_collection, reproject_geometry, Direction};
