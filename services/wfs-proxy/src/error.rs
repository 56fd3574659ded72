//! Proxy failures and their HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Request timeout")]
    Timeout,

    #[error("{0}")]
    Request(String),

    #[error("Internal server error")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Request(_) | ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Timeout => "timeout",
            ProxyError::Request(_) => "request",
            ProxyError::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProxyError::Timeout
        } else {
            ProxyError::Request(e.to_string())
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        // Internal details stay in the logs
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
