//! Transport-level error types.

use std::time::Duration;

use thiserror::Error;
use wfs_common::WfsError;

/// Failure of a single exchange before any HTTP response was received.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("proxy path {0} requested but no proxy base URL is configured")]
    UnresolvedProxy(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Failure of the out-of-band script loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("script request returned HTTP {0}")]
    Status(u16),

    #[error("script request failed: {0}")]
    Request(String),

    #[error("script body is not a callback invocation: {0}")]
    Malformed(String),

    #[error("script names unregistered callback {0}")]
    UnknownToken(String),
}

/// Failure of the fallback channel as a whole.
#[derive(Debug, Clone, Error)]
pub enum FallbackError {
    #[error("fallback script failed to load: {0}")]
    Load(#[from] LoadError),

    #[error("fallback callback not invoked within {0:?}")]
    Timeout(Duration),

    #[error("fallback callback was released without a payload")]
    Abandoned,
}

impl From<TransportError> for WfsError {
    fn from(err: TransportError) -> Self {
        WfsError::TransportFailure(err.to_string())
    }
}

impl From<FallbackError> for WfsError {
    fn from(err: FallbackError) -> Self {
        WfsError::TransportFailure(err.to_string())
    }
}
