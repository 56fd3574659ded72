//! Error types for the feature fetch pipeline.

use thiserror::Error;

/// Result type alias using WfsError.
pub type WfsResult<T> = Result<T, WfsError>;

/// Operation-level error surfaced by the fetch pipeline.
///
/// Per-feature clipping problems never show up here; they only reduce the
/// number of features in the result.
#[derive(Debug, Error)]
pub enum WfsError {
    // === Caller Errors ===
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing credential: a service key is required")]
    MissingCredential,

    // === Network Errors ===
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Upstream error ({status}): {message}")]
    UpstreamError { status: u16, message: String },

    // === Payload Errors ===
    #[error("Response is not a feature collection: {message}")]
    FormatError { message: String },
}

impl WfsError {
    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            WfsError::InvalidInput(_) => "invalid_input",
            WfsError::MissingCredential => "missing_credential",
            WfsError::TransportFailure(_) => "transport_failure",
            WfsError::UpstreamError { .. } => "upstream_error",
            WfsError::FormatError { .. } => "format_error",
        }
    }

    /// Whether the caller may reasonably retry the whole operation.
    ///
    /// Always false: the transport already spent its retry budget, and
    /// input errors never get better by repeating them.
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub fn format(message: impl Into<String>) -> Self {
        WfsError::FormatError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for WfsError {
    fn from(err: serde_json::Error) -> Self {
        WfsError::FormatError {
            message: format!("JSON error: {}", err),
        }
    }
}
