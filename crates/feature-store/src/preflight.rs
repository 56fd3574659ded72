//! Optional type-name validation against the service's capabilities.

use std::collections::HashSet;

use tokio::sync::RwLock;
use tracing::{debug, warn};
use wfs_common::{LayerDescriptor, WfsError, WfsResult};

use crate::pipeline::{Credentials, FeaturePipeline};

/// Caches the advertised type names after the first successful lookup.
/// Lookup failures leave the cache empty and skip validation.
#[derive(Debug, Default)]
pub struct CapabilityPreflight {
    enabled: bool,
    cache: RwLock<Option<HashSet<String>>>,
}

impl CapabilityPreflight {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            cache: RwLock::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cached type names, if a lookup has succeeded.
    pub async fn cached(&self) -> Option<HashSet<String>> {
        self.cache.read().await.clone()
    }

    /// Reject a layer whose type name the service does not advertise.
    pub async fn check(
        &self,
        pipeline: &FeaturePipeline,
        layer: &LayerDescriptor,
        credentials: &Credentials,
    ) -> WfsResult<()> {
        if !self.enabled {
            return Ok(());
        }

        let names = match self.cached().await {
            Some(names) => names,
            None => match pipeline.type_names(credentials).await {
                Ok(Some(names)) => {
                    debug!(count = names.len(), "Cached advertised type names");
                    *self.cache.write().await = Some(names.clone());
                    names
                }
                Ok(None) => {
                    debug!("No type names advertised, skipping validation");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "Capabilities lookup failed, skipping validation");
                    return Ok(());
                }
            },
        };

        if names.contains(&layer.type_name) {
            Ok(())
        } else {
            Err(WfsError::InvalidInput(format!(
                "type name {} is not advertised by the service",
                layer.type_name
            )))
        }
    }
}
