//! HTTP handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use wfs_protocol::preview;

use crate::error::ProxyError;
use crate::state::ProxyState;

/// Characters of a non-JSON upstream body echoed back to the client.
pub const CONTENT_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub configured: bool,
    pub domain: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /proxy/wfs - Forward a WFS query with server-side credentials
pub async fn proxy_wfs_handler(
    Extension(state): Extension<Arc<ProxyState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let request = param(&params, "REQUEST").unwrap_or("-").to_string();
    let type_name = param(&params, "TYPENAME").unwrap_or("-").to_string();
    info!(request = %request, type_name = %type_name, "WFS request");

    if !state.config.is_configured() {
        warn!("No service key configured, forwarding without one");
    }

    match forward(&state, params).await {
        Ok((status, body)) => {
            counter!("wfs_proxy_requests_total", "outcome" => "forwarded").increment(1);
            (status, Json(body)).into_response()
        }
        Err(e) => {
            counter!("wfs_proxy_requests_total", "outcome" => e.kind()).increment(1);
            match &e {
                ProxyError::Timeout => warn!("Upstream request timed out"),
                ProxyError::Request(msg) => error!(error = %msg, "Upstream request failed"),
                ProxyError::Internal(msg) => error!(error = %msg, "Proxy error"),
            }
            e.into_response()
        }
    }
}

/// GET /api/config - Whether a service key is present, never the key itself
pub async fn config_handler(Extension(state): Extension<Arc<ProxyState>>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        configured: state.config.is_configured(),
        domain: state.config.domain.clone(),
    })
}

/// GET /health - Basic health check
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn forward(
    state: &ProxyState,
    params: Vec<(String, String)>,
) -> Result<(StatusCode, Value), ProxyError> {
    let response = state
        .client
        .get(&state.config.upstream_url)
        .query(&state.upstream_params(params))
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?;

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = response.text().await?;

    map_upstream(status, &content_type, &body)
}

/// Translate an upstream reply into the proxy's reply.
///
/// JSON bodies pass through with 200. Anything else becomes an error
/// envelope carrying the upstream status and the start of the body.
pub fn map_upstream(
    status: u16,
    content_type: &str,
    body: &str,
) -> Result<(StatusCode, Value), ProxyError> {
    if content_type.to_ascii_lowercase().starts_with("application/json") {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ProxyError::Internal(format!("invalid upstream JSON: {}", e)))?;
        return Ok((StatusCode::OK, value));
    }

    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((
        code,
        json!({
            "error": "Non-JSON response from upstream",
            "status": status,
            "content": preview(body, CONTENT_PREVIEW_CHARS),
        }),
    ))
}

fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
