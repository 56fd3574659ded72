//! GetFeature request construction.
//!
//! Turns an area of interest and a layer descriptor into a single GET
//! request. The bbox is derived from the AOI's geographic extent; for
//! EPSG:900913 requests it is projected and rounded to whole meters, which is
//! the form the service is known to accept.

use projection::Mercator;
use wfs_common::{AreaOfInterest, BoundingBox, CrsCode, LayerDescriptor, WfsError, WfsResult};

use crate::request::{Endpoint, RequestDescriptor};

/// VWorld WFS endpoint.
pub const DEFAULT_SERVICE_URL: &str = "https://api.vworld.kr/req/wfs";

/// Settings that shape every GetFeature request.
#[derive(Debug, Clone)]
pub struct GetFeatureConfig {
    /// Remote service URL
    pub service_url: String,
    /// Local proxy path; when set, requests go through the proxy
    pub proxy_path: Option<String>,
    /// CRS the service is asked to answer in
    pub crs: CrsCode,
    /// Append ",EPSG:900913" to projected BBOX values
    pub append_crs_to_bbox: bool,
    /// MAXFEATURES cap
    pub max_features: u32,
    /// WFS version
    pub version: String,
}

impl Default for GetFeatureConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            proxy_path: None,
            crs: CrsCode::Epsg900913,
            append_crs_to_bbox: true,
            max_features: 500,
            version: "1.1.0".to_string(),
        }
    }
}

/// Builds GetFeature and GetCapabilities descriptors. Performs no I/O.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    config: GetFeatureConfig,
    proj: Mercator,
}

impl QueryBuilder {
    pub fn new(config: GetFeatureConfig) -> Self {
        Self {
            config,
            proj: Mercator::default(),
        }
    }

    pub fn config(&self) -> &GetFeatureConfig {
        &self.config
    }

    /// CRS the responses will be expressed in.
    pub fn crs(&self) -> CrsCode {
        self.config.crs
    }

    fn endpoint(&self) -> Endpoint {
        match &self.config.proxy_path {
            Some(path) => Endpoint::Proxy(path.clone()),
            None => Endpoint::Remote(self.config.service_url.clone()),
        }
    }

    /// Build the GetFeature request for one layer over the AOI.
    ///
    /// Fails with `InvalidInput` when the AOI is absent or has no rings, and
    /// with `MissingCredential` when the credential is blank.
    pub fn build(
        &self,
        aoi: Option<&AreaOfInterest>,
        layer: &LayerDescriptor,
        credential: &str,
        domain: &str,
    ) -> WfsResult<RequestDescriptor> {
        let aoi = aoi.ok_or_else(|| WfsError::InvalidInput("no area of interest".to_string()))?;
        if aoi.ring_count() == 0 {
            return Err(WfsError::InvalidInput("AOI has no rings".to_string()));
        }
        let bbox = aoi
            .bounding_box()
            .ok_or_else(|| WfsError::InvalidInput("AOI has no extent".to_string()))?;

        let credential = credential.trim();
        if credential.is_empty() {
            return Err(WfsError::MissingCredential);
        }

        let request = RequestDescriptor::get(self.endpoint())
            .with_header("Accept", "application/json")
            .with_param("SERVICE", "WFS")
            .with_param("REQUEST", "GetFeature")
            .with_param("VERSION", self.config.version.as_str())
            .with_param("key", credential)
            .with_param("domain", domain.trim())
            .with_param("OUTPUT", "application/json")
            .with_param("SRSNAME", self.config.crs.srs_name())
            .with_param("TYPENAME", layer.type_name.as_str())
            .with_param("BBOX", self.bbox_param(&bbox))
            .with_param("EXCEPTIONS", "application/json")
            .with_param("MAXFEATURES", self.config.max_features.to_string());

        tracing::debug!(
            layer = %layer.key,
            url = %request.display_url(),
            "Built GetFeature request"
        );

        Ok(request)
    }

    /// Format a geographic bbox as the BBOX value for the configured CRS.
    ///
    /// - EPSG:4326: `minLat,minLon,maxLat,maxLon` (WFS 1.1.0 axis order)
    /// - EPSG:900913: `minX,minY,maxX,maxY` in whole meters, optionally
    ///   followed by `,EPSG:900913`
    pub fn bbox_param(&self, geographic: &BoundingBox) -> String {
        match self.config.crs {
            CrsCode::Epsg4326 => format!(
                "{},{},{},{}",
                geographic.min_y, geographic.min_x, geographic.max_y, geographic.max_x
            ),
            CrsCode::Epsg900913 => {
                let projected = self.projected_bbox(geographic);
                let value = format!(
                    "{},{},{},{}",
                    projected.min_x as i64,
                    projected.min_y as i64,
                    projected.max_x as i64,
                    projected.max_y as i64
                );
                if self.config.append_crs_to_bbox {
                    format!("{},{}", value, CrsCode::Epsg900913)
                } else {
                    value
                }
            }
        }
    }

    /// Latitude-clamped, projected and rounded bbox in meters.
    pub fn projected_bbox(&self, geographic: &BoundingBox) -> BoundingBox {
        let clamped = BoundingBox::new(
            geographic.min_x,
            self.proj.clamp_latitude(geographic.min_y),
            geographic.max_x,
            self.proj.clamp_latitude(geographic.max_y),
        );
        self.proj.project_bbox(&clamped).rounded()
    }

    /// Capability discovery request. Always sent to the remote service.
    pub fn capabilities_request(&self, credential: &str, domain: &str) -> RequestDescriptor {
        RequestDescriptor::get(Endpoint::Remote(self.config.service_url.clone()))
            .with_param("service", "WFS")
            .with_param("request", "GetCapabilities")
            .with_param("version", self.config.version.as_str())
            .with_param("key", credential.trim())
            .with_param("domain", domain.trim())
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(GetFeatureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aoi() -> AreaOfInterest {
        AreaOfInterest::from_bbox(&BoundingBox::new(126.9, 37.5, 127.1, 37.6)).unwrap()
    }

    fn layer() -> LayerDescriptor {
        LayerDescriptor::new("urban", "lt_c_uq121", "#3b82f6", "Urban")
    }

    #[test]
    fn test_build_mercator_request() {
        let builder = QueryBuilder::default();
        let req = builder
            .build(Some(&aoi()), &layer(), "KEY", "example.org")
            .unwrap();

        let names: Vec<&str> = req.params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "SERVICE",
                "REQUEST",
                "VERSION",
                "key",
                "domain",
                "OUTPUT",
                "SRSNAME",
                "TYPENAME",
                "BBOX",
                "EXCEPTIONS",
                "MAXFEATURES"
            ]
        );
        assert_eq!(req.param("SRSNAME"), Some("EPSG:900913"));
        assert_eq!(req.param("TYPENAME"), Some("lt_c_uq121"));
        assert_eq!(req.param("MAXFEATURES"), Some("500"));

        let bbox = req.param("BBOX").unwrap();
        assert!(bbox.ends_with(",EPSG:900913"), "bbox = {}", bbox);
        let parts: Vec<&str> = bbox.split(',').collect();
        assert_eq!(parts.len(), 5);
        for part in &parts[..4] {
            assert!(part.parse::<i64>().is_ok(), "not whole meters: {}", part);
        }
        assert_eq!(req.endpoint, Endpoint::Remote(DEFAULT_SERVICE_URL.to_string()));
    }

    #[test]
    fn test_build_geographic_axis_order() {
        let builder = QueryBuilder::new(GetFeatureConfig {
            crs: CrsCode::Epsg4326,
            ..Default::default()
        });
        let req = builder.build(Some(&aoi()), &layer(), "KEY", "d").unwrap();
        assert_eq!(req.param("BBOX"), Some("37.5,126.9,37.6,127.1"));
        assert_eq!(req.param("SRSNAME"), Some("EPSG:4326"));
    }

    #[test]
    fn test_proxy_endpoint() {
        let builder = QueryBuilder::new(GetFeatureConfig {
            proxy_path: Some("/proxy/wfs".to_string()),
            ..Default::default()
        });
        let req = builder.build(Some(&aoi()), &layer(), "KEY", "d").unwrap();
        assert_eq!(req.endpoint, Endpoint::Proxy("/proxy/wfs".to_string()));
    }

    #[test]
    fn test_missing_aoi() {
        let err = QueryBuilder::default()
            .build(None, &layer(), "KEY", "d")
            .unwrap_err();
        assert!(matches!(err, WfsError::InvalidInput(_)));
    }

    #[test]
    fn test_blank_credential() {
        let err = QueryBuilder::default()
            .build(Some(&aoi()), &layer(), "   ", "d")
            .unwrap_err();
        assert!(matches!(err, WfsError::MissingCredential));
    }

    #[test]
    fn test_latitude_clamped_before_projection() {
        let builder = QueryBuilder::default();
        let polar = BoundingBox::new(0.0, 80.0, 10.0, 89.9);
        let projected = builder.projected_bbox(&polar);
        assert_eq!(projected.max_y, 20037508.0);
    }

    #[test]
    fn test_capabilities_request() {
        let req = QueryBuilder::default().capabilities_request("KEY", "d");
        assert_eq!(req.param("request"), Some("GetCapabilities"));
        assert_eq!(req.param("version"), Some("1.1.0"));
        assert!(req.headers.is_empty());
    }
}
