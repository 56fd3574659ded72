//! Per-layer fetch records.

use geojson::FeatureCollection;
use serde::Serialize;
use wfs_common::LayerKey;

/// Last completed retrieval of a layer.
#[derive(Debug, Clone, Default)]
pub struct FetchedLayerRecord {
    pub fetched: bool,
    pub data: Option<FeatureCollection>,
}

impl FetchedLayerRecord {
    pub fn completed(data: FeatureCollection) -> Self {
        Self {
            fetched: true,
            data: Some(data),
        }
    }

    /// Number of features, once fetched.
    pub fn count(&self) -> Option<usize> {
        if self.fetched {
            Some(self.data.as_ref().map_or(0, |fc| fc.features.len()))
        } else {
            None
        }
    }
}

/// What a renderer needs to know about one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerStatus {
    pub key: LayerKey,
    pub label: String,
    pub color: String,
    pub fetched: bool,
    pub count: Option<usize>,
    pub visible: bool,
}
