//! Shared proxy state.

use std::time::Duration;

use wfs_protocol::DEFAULT_SERVICE_URL;

use crate::error::ProxyError;

/// Domain registered with the service key when none is configured.
pub const DEFAULT_DOMAIN: &str = "wind.rkswork.com";

/// Upstream request timeout.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Service key injected into every forwarded request.
    pub api_key: String,
    pub domain: String,
    pub upstream_url: String,
    pub timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            domain: DEFAULT_DOMAIN.to_string(),
            upstream_url: DEFAULT_SERVICE_URL.to_string(),
            timeout: UPSTREAM_TIMEOUT,
        }
    }
}

impl ProxyConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

pub struct ProxyState {
    pub client: reqwest::Client,
    pub config: ProxyConfig,
}

impl ProxyState {
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("wfs-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProxyError::Internal(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Client parameters with `key` and `domain` replaced by the
    /// configured values. Matching is case-insensitive; the configured
    /// pair is appended last.
    pub fn upstream_params(&self, params: Vec<(String, String)>) -> Vec<(String, String)> {
        let mut forwarded: Vec<(String, String)> = params
            .into_iter()
            .filter(|(name, _)| {
                !name.eq_ignore_ascii_case("key") && !name.eq_ignore_ascii_case("domain")
            })
            .collect();
        forwarded.push(("key".to_string(), self.config.api_key.clone()));
        forwarded.push(("domain".to_string(), self.config.domain.clone()));
        forwarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ProxyState {
        ProxyState::new(ProxyConfig {
            api_key: "SERVER-KEY".into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_credentials_are_overridden() {
        let params = vec![
            ("SERVICE".to_string(), "WFS".to_string()),
            ("KEY".to_string(), "client".to_string()),
            ("Domain".to_string(), "evil.example".to_string()),
            ("TYPENAME".to_string(), "lt_c_uq121".to_string()),
        ];

        let forwarded = state().upstream_params(params);

        assert_eq!(
            forwarded,
            vec![
                ("SERVICE".to_string(), "WFS".to_string()),
                ("TYPENAME".to_string(), "lt_c_uq121".to_string()),
                ("key".to_string(), "SERVER-KEY".to_string()),
                ("domain".to_string(), DEFAULT_DOMAIN.to_string()),
            ]
        );
    }

    #[test]
    fn test_is_configured() {
        assert!(!ProxyConfig::default().is_configured());
        assert!(state().config.is_configured());
    }
}
