//! HTTP exchange seam and its reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use wfs_protocol::{Endpoint, RawResponse, RequestDescriptor};

use crate::error::TransportError;

/// Performs one HTTP exchange for a request descriptor.
///
/// Any HTTP response, whatever its status, is `Ok`; `Err` means no response
/// was obtained at all.
#[async_trait]
pub trait HttpExchange: Send + Sync {
    async fn exchange(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed exchange. Proxy endpoints are resolved against
/// `proxy_base_url`.
#[derive(Debug, Clone)]
pub struct ReqwestExchange {
    client: Client,
    proxy_base_url: Option<String>,
}

impl ReqwestExchange {
    pub fn new(timeout: Duration, proxy_base_url: Option<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("wfs-layer-fetch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            proxy_base_url,
        })
    }

    /// Absolute URL for an endpoint.
    pub fn resolve(&self, endpoint: &Endpoint) -> Result<String, TransportError> {
        match endpoint {
            Endpoint::Remote(url) => Ok(url.clone()),
            Endpoint::Proxy(path) => {
                let base = self
                    .proxy_base_url
                    .as_deref()
                    .ok_or_else(|| TransportError::UnresolvedProxy(path.clone()))?;
                Ok(join_url(base, path))
            }
        }
    }
}

#[async_trait]
impl HttpExchange for ReqwestExchange {
    async fn exchange(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        let url = self.resolve(&request.endpoint)?;

        let mut builder = self.client.get(&url).query(&request.params);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Request(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
