//! The fetch pipeline: build, deliver, interpret, reproject, clip.

use std::collections::HashSet;

use geojson::FeatureCollection;
use projection::{reproject_collection, Direction, Mercator};
use tracing::{debug, info, instrument};
use transport::TransportClient;
use wfs_common::{AreaOfInterest, LayerDescriptor, WfsError, WfsResult};
use wfs_protocol::{interpret, parse_type_names, QueryBuilder, RequestDescriptor};

/// Service key and the domain it is registered for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub domain: String,
}

impl Credentials {
    pub fn new(key: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            domain: domain.into(),
        }
    }
}

/// One live retrieval per call; holds no per-layer state.
pub struct FeaturePipeline {
    builder: QueryBuilder,
    transport: TransportClient,
    proj: Mercator,
}

impl FeaturePipeline {
    pub fn new(builder: QueryBuilder, transport: TransportClient) -> Self {
        Self {
            builder,
            transport,
            proj: Mercator::default(),
        }
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub fn transport(&self) -> &TransportClient {
        &self.transport
    }

    /// Validate the inputs and build the GetFeature request. No network I/O.
    pub fn prepare<'a>(
        &self,
        aoi: Option<&'a AreaOfInterest>,
        layer: &LayerDescriptor,
        credentials: &Credentials,
    ) -> WfsResult<(RequestDescriptor, &'a AreaOfInterest)> {
        let aoi =
            aoi.ok_or_else(|| WfsError::InvalidInput("no area of interest".to_string()))?;
        let request = self
            .builder
            .build(Some(aoi), layer, &credentials.key, &credentials.domain)?;
        Ok((request, aoi))
    }

    /// Deliver a prepared request, then interpret, reproject and clip.
    /// The result is in EPSG:4326.
    #[instrument(
        skip(self, request, aoi, layer),
        fields(layer = %layer.key, type_name = %layer.type_name)
    )]
    pub async fn execute(
        &self,
        request: &RequestDescriptor,
        aoi: &AreaOfInterest,
        layer: &LayerDescriptor,
    ) -> WfsResult<FeatureCollection> {
        let raw = self.transport.deliver(request).await?;
        let interpreted = interpret(&raw, self.builder.crs())?;
        let received = interpreted.collection.features.len();

        let geographic = if interpreted.crs.is_geographic() {
            interpreted.collection
        } else {
            reproject_collection(interpreted.collection, &self.proj, Direction::Inverse)
        };

        let (clipped, report) = clipper::clip_collection(geographic, aoi);
        debug!(?report, "Clipped features");
        info!(received, kept = clipped.features.len(), "Fetched layer");

        Ok(clipped)
    }

    /// Feature type names advertised by the service, or `None` when the
    /// document could not be obtained or advertised nothing.
    #[instrument(skip(self, credentials))]
    pub async fn type_names(
        &self,
        credentials: &Credentials,
    ) -> WfsResult<Option<HashSet<String>>> {
        let request = self
            .builder
            .capabilities_request(&credentials.key, &credentials.domain);
        let raw = self.transport.deliver(&request).await?;
        if !raw.is_success() {
            debug!(status = raw.status, "Capabilities request returned error status");
            return Ok(None);
        }
        Ok(parse_type_names(&raw.body).filter(|names| !names.is_empty()))
    }
}
