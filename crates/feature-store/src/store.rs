//! Per-layer feature store.
//!
//! Every fetch is a live retrieval. A completed fetch replaces the layer's
//! record wholesale (even with an empty result); a failed fetch leaves it as
//! it was. Visibility is tracked separately from data.

use std::collections::HashMap;

use geojson::FeatureCollection;
use metrics::counter;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use wfs_common::{AreaOfInterest, LayerCatalog, LayerDescriptor, LayerKey, WfsError, WfsResult};

use crate::pipeline::{Credentials, FeaturePipeline};
use crate::preflight::CapabilityPreflight;
use crate::record::{FetchedLayerRecord, LayerStatus};

pub struct LayerFeatureStore {
    catalog: LayerCatalog,
    pipeline: FeaturePipeline,
    preflight: CapabilityPreflight,
    records: RwLock<HashMap<LayerKey, FetchedLayerRecord>>,
    visibility: RwLock<HashMap<LayerKey, bool>>,
}

impl LayerFeatureStore {
    pub fn new(catalog: LayerCatalog, pipeline: FeaturePipeline) -> Self {
        Self {
            catalog,
            pipeline,
            preflight: CapabilityPreflight::new(false),
            records: RwLock::new(HashMap::new()),
            visibility: RwLock::new(HashMap::new()),
        }
    }

    /// Enable or disable type-name validation before fetches.
    pub fn with_preflight(mut self, enabled: bool) -> Self {
        self.preflight = CapabilityPreflight::new(enabled);
        self
    }

    pub fn catalog(&self) -> &LayerCatalog {
        &self.catalog
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub fn preflight(&self) -> &CapabilityPreflight {
        &self.preflight
    }

    fn layer(&self, key: &LayerKey) -> WfsResult<&LayerDescriptor> {
        self.catalog
            .get(key)
            .ok_or_else(|| WfsError::InvalidInput(format!("unknown layer: {}", key)))
    }

    /// Fetch a layer through the whole pipeline and record the result.
    #[instrument(skip(self, aoi, credentials), fields(layer = %key))]
    pub async fn fetch(
        &self,
        key: &LayerKey,
        aoi: Option<&AreaOfInterest>,
        credentials: &Credentials,
    ) -> WfsResult<FeatureCollection> {
        let layer = self.layer(key)?;
        counter!("wfs_layer_fetches_total").increment(1);

        let result = async {
            // Input errors surface before any request, including the preflight
            let (request, aoi) = self.pipeline.prepare(aoi, layer, credentials)?;
            self.preflight
                .check(&self.pipeline, layer, credentials)
                .await?;
            self.pipeline.execute(&request, aoi, layer).await
        }
        .await;

        match result {
            Ok(collection) => {
                let count = collection.features.len();
                self.records.write().await.insert(
                    key.clone(),
                    FetchedLayerRecord::completed(collection.clone()),
                );
                info!(count, "Layer record updated");
                Ok(collection)
            }
            Err(e) => {
                counter!("wfs_layer_fetch_errors_total", "kind" => e.kind()).increment(1);
                warn!(error = %e, kind = e.kind(), "Layer fetch failed");
                Err(e)
            }
        }
    }

    /// Forget a layer's data.
    pub async fn reset(&self, key: &LayerKey) -> WfsResult<()> {
        self.layer(key)?;
        self.records.write().await.remove(key);
        Ok(())
    }

    pub async fn reset_all(&self) {
        self.records.write().await.clear();
    }

    pub async fn record(&self, key: &LayerKey) -> WfsResult<FetchedLayerRecord> {
        self.layer(key)?;
        Ok(self
            .records
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    pub async fn is_fetched(&self, key: &LayerKey) -> WfsResult<bool> {
        Ok(self.record(key).await?.fetched)
    }

    /// Feature count, `None` until the layer has been fetched.
    pub async fn count(&self, key: &LayerKey) -> WfsResult<Option<usize>> {
        Ok(self.record(key).await?.count())
    }

    pub async fn data(&self, key: &LayerKey) -> WfsResult<Option<FeatureCollection>> {
        Ok(self.record(key).await?.data)
    }

    pub async fn set_visible(&self, key: &LayerKey, visible: bool) -> WfsResult<()> {
        self.layer(key)?;
        self.visibility.write().await.insert(key.clone(), visible);
        Ok(())
    }

    pub async fn is_visible(&self, key: &LayerKey) -> WfsResult<bool> {
        self.layer(key)?;
        Ok(self
            .visibility
            .read()
            .await
            .get(key)
            .copied()
            .unwrap_or(false))
    }

    pub async fn hide_all(&self) {
        self.visibility.write().await.clear();
    }

    /// Status of every catalog layer, in catalog order.
    pub async fn statuses(&self) -> Vec<LayerStatus> {
        let records = self.records.read().await;
        let visibility = self.visibility.read().await;
        self.catalog
            .iter()
            .map(|layer| {
                let record = records.get(&layer.key).cloned().unwrap_or_default();
                LayerStatus {
                    key: layer.key.clone(),
                    label: layer.label.clone(),
                    color: layer.color.clone(),
                    fetched: record.fetched,
                    count: record.count(),
                    visible: visibility.get(&layer.key).copied().unwrap_or(false),
                }
            })
            .collect()
    }
}
