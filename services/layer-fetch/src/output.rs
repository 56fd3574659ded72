//! Writing results and rendering summaries.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use feature_store::{LayerStatus, Session};
use geojson::FeatureCollection;
use tracing::info;
use wfs_common::LayerKey;

/// Outcome of one smoke-test layer.
#[derive(Debug, Clone)]
pub struct SmokeResult {
    pub key: LayerKey,
    /// Feature count, or the error message.
    pub outcome: Result<usize, String>,
}

/// Write a layer's features to `<dir>/<key>.geojson`, creating `dir`.
pub fn write_collection(dir: &Path, key: &LayerKey, fc: &FeatureCollection) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = dir.join(format!("{}.geojson", key));
    let json = serde_json::to_string_pretty(fc).context("Failed to serialize features")?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Fetch and show layers one after another over the session's AOI, writing
/// each to `dir` as soon as it completes. Stops at the first failure; files
/// of layers fetched before it are kept.
pub async fn fetch_to_dir(
    session: &Session,
    keys: &[LayerKey],
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(keys.len());
    for key in keys {
        let fc = session
            .fetch_and_show(key)
            .await
            .with_context(|| format!("Failed to fetch layer {}", key))?;
        let path = write_collection(dir, key, &fc)?;
        info!(layer = %key, count = fc.features.len(), path = %path.display(), "Wrote layer");
        written.push(path);
    }
    Ok(written)
}

pub fn format_smoke(results: &[SmokeResult]) -> String {
    let mut out = String::new();
    for result in results {
        let _ = match &result.outcome {
            Ok(count) => writeln!(out, "✔ {} ({} features)", result.key, count),
            Err(message) => writeln!(out, "✖ {}: {}", result.key, message),
        };
    }
    out
}

/// One line per layer: key, state, count, label.
pub fn format_statuses(statuses: &[LayerStatus]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<12} {:<8} {:>7}  {}", "LAYER", "STATE", "COUNT", "LABEL");
    for status in statuses {
        let state = match (status.fetched, status.visible) {
            (false, _) => "-",
            (true, true) => "shown",
            (true, false) => "hidden",
        };
        let count = status
            .count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<12} {:<8} {:>7}  {}",
            status.key, state, count, status.label
        );
    }
    out
}
