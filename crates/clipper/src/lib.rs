//! Spatial clipping of fetched features to the area of interest.

pub mod clip;

pub use clip::{clip_collection, ClipOutcome, ClipReport, Clipper, SkipReason};
