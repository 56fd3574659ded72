//! Common types and utilities shared across the AOI feature fetcher crates.

pub mod aoi;
pub mod bbox;
pub mod crs;
pub mod error;
pub mod layer;

pub use aoi::AreaOfInterest;
pub use bbox::BoundingBox;
pub use crs::CrsCode;
pub use error::{WfsError, WfsResult};
pub use layer::{LayerCatalog, LayerDescriptor, LayerKey};
