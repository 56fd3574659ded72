//! Request delivery: bounded retries, then the script fallback.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde_json::Value as JsonValue;
use tracing::{debug, info, instrument, warn};
use wfs_common::{WfsError, WfsResult};
use wfs_protocol::{RawResponse, RequestDescriptor, DEFAULT_SERVICE_URL};

use crate::error::{FallbackError, TransportError};
use crate::fallback::{new_token, CallbackRegistry, HttpScriptLoader, ScriptLoader};
use crate::http::{HttpExchange, ReqwestExchange};

/// Delivery settings.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Fixed delay between attempts
    pub retry_delay: Duration,
    /// Per-request HTTP timeout on the primary path
    pub request_timeout: Duration,
    /// How long the fallback waits for its callback
    pub fallback_timeout: Duration,
    pub fallback_enabled: bool,
    /// Remote service URL; fallback requests always go here
    pub service_url: String,
    /// Base URL that proxy paths are resolved against
    pub proxy_base_url: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_millis(600),
            request_timeout: Duration::from_secs(30),
            fallback_timeout: Duration::from_millis(8000),
            fallback_enabled: true,
            service_url: DEFAULT_SERVICE_URL.to_string(),
            proxy_base_url: None,
        }
    }
}

/// Delivers request descriptors and returns the raw response.
pub struct TransportClient {
    config: TransportConfig,
    http: Arc<dyn HttpExchange>,
    loader: Arc<dyn ScriptLoader>,
    registry: CallbackRegistry,
}

impl TransportClient {
    pub fn new(
        config: TransportConfig,
        http: Arc<dyn HttpExchange>,
        loader: Arc<dyn ScriptLoader>,
    ) -> Self {
        Self {
            config,
            http,
            loader,
            registry: CallbackRegistry::new(),
        }
    }

    /// Client backed by reqwest for both the primary and the fallback path.
    pub fn from_config(config: TransportConfig) -> Result<Self, TransportError> {
        let http: Arc<dyn HttpExchange> = Arc::new(ReqwestExchange::new(
            config.request_timeout,
            config.proxy_base_url.clone(),
        )?);
        let loader = Arc::new(HttpScriptLoader::new(http.clone()));
        Ok(Self::new(config, http, loader))
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Registry of in-flight fallback callbacks.
    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    /// Deliver a request.
    ///
    /// A success status is returned immediately and never retried. When the
    /// budget runs out and some attempt produced an HTTP response, the last
    /// such response is returned as is. Only when no attempt reached the
    /// service is the fallback channel tried.
    #[instrument(skip(self, request), fields(url = %request.display_url()))]
    pub async fn deliver(&self, request: &RequestDescriptor) -> WfsResult<RawResponse> {
        let attempts = self.config.max_retries.saturating_add(1);
        let mut last_response: Option<RawResponse> = None;
        let mut last_error: Option<TransportError> = None;

        for attempt in 1..=attempts {
            counter!("wfs_transport_attempts_total").increment(1);

            match self.http.exchange(request).await {
                Ok(response) if response.is_success() => {
                    debug!(attempt, status = response.status, "Request succeeded");
                    return Ok(response);
                }
                Ok(response) => {
                    warn!(
                        attempt,
                        max_attempts = attempts,
                        status = response.status,
                        "Service returned error status"
                    );
                    last_response = Some(response);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Request failed"
                    );
                    last_error = Some(e);
                }
            }

            if attempt < attempts {
                counter!("wfs_transport_retries_total").increment(1);
                tokio::time::sleep(self.config.retry_delay).await;
            }
        }

        if let Some(response) = last_response {
            return Ok(response);
        }

        let cause = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempts made".to_string());

        if !self.config.fallback_enabled {
            return Err(WfsError::TransportFailure(format!(
                "all {} attempts failed: {}",
                attempts, cause
            )));
        }

        info!(cause = %cause, "Primary path exhausted, trying script fallback");
        counter!("wfs_transport_fallbacks_total").increment(1);

        match self.fallback(request).await {
            Ok(payload) => {
                counter!("wfs_transport_fallback_outcomes_total", "outcome" => "success")
                    .increment(1);
                Ok(RawResponse::new(200, "application/json", payload.to_string()))
            }
            Err(e) => {
                counter!("wfs_transport_fallback_outcomes_total", "outcome" => "failure")
                    .increment(1);
                warn!(error = %e, "Script fallback failed");
                Err(WfsError::TransportFailure(format!(
                    "all {} attempts failed ({}); {}",
                    attempts, cause, e
                )))
            }
        }
    }

    /// One fallback attempt: register, load, await payload, load failure or
    /// timeout. The registration is released on every exit.
    async fn fallback(&self, request: &RequestDescriptor) -> Result<JsonValue, FallbackError> {
        let token = new_token();
        let script_request = request.to_script_request(&self.config.service_url, &token);
        let (_guard, mut rx) = self.registry.register(&token);

        let wait = async {
            let load = self.loader.load(&script_request, &self.registry);
            tokio::pin!(load);

            let loaded = tokio::select! {
                biased;
                payload = &mut rx => return payload.map_err(|_| FallbackError::Abandoned),
                loaded = &mut load => loaded,
            };
            loaded?;

            // The script ran; the handler may still be pending
            rx.await.map_err(|_| FallbackError::Abandoned)
        };

        tokio::time::timeout(self.config.fallback_timeout, wait)
            .await
            .map_err(|_| FallbackError::Timeout(self.config.fallback_timeout))?
    }
}
