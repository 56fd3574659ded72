//! The viewer session: credentials, the active AOI and the layer store.

use geojson::FeatureCollection;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use transport::TransportClient;
use wfs_common::{AreaOfInterest, LayerCatalog, LayerKey, WfsError, WfsResult};
use wfs_protocol::QueryBuilder;

use crate::config::ClientConfig;
use crate::pipeline::{Credentials, FeaturePipeline};
use crate::store::LayerFeatureStore;

pub struct Session {
    credentials: Credentials,
    aoi: RwLock<Option<AreaOfInterest>>,
    store: LayerFeatureStore,
}

impl Session {
    pub fn new(store: LayerFeatureStore, credentials: Credentials) -> Self {
        Self {
            credentials,
            aoi: RwLock::new(None),
            store,
        }
    }

    /// Session backed by the real HTTP transport.
    pub fn from_config(config: &ClientConfig, catalog: LayerCatalog) -> WfsResult<Self> {
        let transport = TransportClient::from_config(config.transport_config())?;
        let pipeline =
            FeaturePipeline::new(QueryBuilder::new(config.get_feature_config()), transport);
        let store =
            LayerFeatureStore::new(catalog, pipeline).with_preflight(config.validate_type_names);
        Ok(Self::new(
            store,
            Credentials::new(config.api_key.clone(), config.domain.clone()),
        ))
    }

    pub fn store(&self) -> &LayerFeatureStore {
        &self.store
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Replace the active AOI. Existing layer data is kept.
    pub async fn set_aoi(&self, aoi: AreaOfInterest) {
        *self.aoi.write().await = Some(aoi);
    }

    pub async fn clear_aoi(&self) {
        *self.aoi.write().await = None;
    }

    pub async fn aoi(&self) -> Option<AreaOfInterest> {
        self.aoi.read().await.clone()
    }

    /// Fetch one layer over the active AOI.
    pub async fn fetch_layer(&self, key: &LayerKey) -> WfsResult<FeatureCollection> {
        let aoi = self
            .aoi()
            .await
            .ok_or_else(|| WfsError::InvalidInput("no area of interest selected".to_string()))?;
        self.store.fetch(key, Some(&aoi), &self.credentials).await
    }

    /// Fetch a layer and make it visible.
    pub async fn fetch_and_show(&self, key: &LayerKey) -> WfsResult<FeatureCollection> {
        let collection = self.fetch_layer(key).await?;
        self.store.set_visible(key, true).await?;
        Ok(collection)
    }

    /// Fetch layers one after another, stopping at the first failure.
    /// Returns the feature count of each completed layer.
    #[instrument(skip(self, keys), fields(layers = keys.len()))]
    pub async fn fetch_selected(&self, keys: &[LayerKey]) -> WfsResult<Vec<(LayerKey, usize)>> {
        let mut counts = Vec::with_capacity(keys.len());
        for key in keys {
            let collection = self.fetch_and_show(key).await?;
            counts.push((key.clone(), collection.features.len()));
        }
        info!(completed = counts.len(), "Selected layers fetched");
        Ok(counts)
    }

    /// Drop every layer's data and hide all layers. The AOI is kept.
    pub async fn clear(&self) {
        self.store.reset_all().await;
        self.store.hide_all().await;
    }
}
