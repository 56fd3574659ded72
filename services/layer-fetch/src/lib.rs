//! Support code for the `layer-fetch` command-line tool.

pub mod aoi_input;
pub mod output;

pub use aoi_input::{load_aoi_file, mercator_bbox, parse_bbox_aoi, parse_center, smoke_aoi};
pub use output::{fetch_to_dir, format_smoke, format_statuses, write_collection, SmokeResult};

/// Layers exercised by the smoke test.
pub const SMOKE_LAYERS: [&str; 3] = ["admin", "urban", "greenbelt"];
