//! Client configuration.
//!
//! Loaded from environment variables (after `.env` has been applied by the
//! binary) or from a YAML file. Every field has a default so a partial file
//! or environment is enough.

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use transport::TransportConfig;
use wfs_common::CrsCode;
use wfs_protocol::{GetFeatureConfig, DEFAULT_SERVICE_URL};

/// Path the local proxy serves GetFeature requests on.
pub const PROXY_PATH: &str = "/proxy/wfs";

/// Domain registered with the service key when none is configured.
pub const DEFAULT_DOMAIN: &str = "wind.rkswork.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file: {0}")]
    Io(String),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Everything needed to build a fetch session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service key (VWORLD_API_KEY)
    pub api_key: String,

    /// Domain registered for the key (VWORLD_DOMAIN)
    pub domain: String,

    /// Remote WFS URL (WFS_URL)
    pub service_url: String,

    /// Base URL of the local proxy; when set, GetFeature goes through it
    /// (WFS_PROXY_URL)
    pub proxy_url: Option<String>,

    /// CRS requested from the service (WFS_REQUEST_CRS)
    pub request_crs: CrsCode,

    /// Append ",EPSG:900913" to projected BBOX values
    pub append_crs_to_bbox: bool,

    pub max_features: u32,

    /// Retries after the first attempt (WFS_MAX_RETRIES)
    pub max_retries: u32,

    /// Delay between attempts (WFS_RETRY_DELAY_MS)
    pub retry_delay_ms: u64,

    /// HTTP timeout for primary attempts
    pub request_timeout_secs: u64,

    /// Wait for the fallback callback (WFS_FALLBACK_TIMEOUT_MS)
    pub fallback_timeout_ms: u64,

    /// WFS_FALLBACK_ENABLED
    pub fallback_enabled: bool,

    /// Check type names against GetCapabilities first (WFS_VALIDATE_TYPENAMES)
    pub validate_type_names: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            domain: DEFAULT_DOMAIN.to_string(),
            service_url: DEFAULT_SERVICE_URL.to_string(),
            proxy_url: None,
            request_crs: CrsCode::Epsg900913,
            append_crs_to_bbox: true,
            max_features: 500,
            max_retries: 2,
            retry_delay_ms: 600,
            request_timeout_secs: 30,
            fallback_timeout_ms: 8000,
            fallback_enabled: true,
            validate_type_names: false,
        }
    }
}

impl ClientConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable source. Unset or blank variables keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(key) = get("VWORLD_API_KEY") {
            config.api_key = key.trim().to_string();
        }
        if let Some(domain) = get("VWORLD_DOMAIN") {
            config.domain = domain.trim().to_string();
        }
        if let Some(url) = get("WFS_URL") {
            config.service_url = url.trim().to_string();
        }
        config.proxy_url = get("WFS_PROXY_URL").map(|u| u.trim().to_string());

        if let Some(value) = get("WFS_REQUEST_CRS") {
            config.request_crs =
                CrsCode::from_srs_name(&value).map_err(|e| ConfigError::InvalidValue {
                    var: "WFS_REQUEST_CRS",
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
        }
        if let Some(value) = get("WFS_MAX_RETRIES") {
            config.max_retries = parse_var("WFS_MAX_RETRIES", &value)?;
        }
        if let Some(value) = get("WFS_RETRY_DELAY_MS") {
            config.retry_delay_ms = parse_var("WFS_RETRY_DELAY_MS", &value)?;
        }
        if let Some(value) = get("WFS_FALLBACK_TIMEOUT_MS") {
            config.fallback_timeout_ms = parse_var("WFS_FALLBACK_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = get("WFS_FALLBACK_ENABLED") {
            config.fallback_enabled = parse_flag("WFS_FALLBACK_ENABLED", &value)?;
        }
        if let Some(value) = get("WFS_VALIDATE_TYPENAMES") {
            config.validate_type_names = parse_flag("WFS_VALIDATE_TYPENAMES", &value)?;
        }

        Ok(config)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_yaml::from_str(&content)?;
        info!(path = %path.display(), "Loaded client configuration");
        Ok(config)
    }

    /// Whether a service key is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn get_feature_config(&self) -> GetFeatureConfig {
        GetFeatureConfig {
            service_url: self.service_url.clone(),
            proxy_path: self.proxy_url.as_ref().map(|_| PROXY_PATH.to_string()),
            crs: self.request_crs,
            append_crs_to_bbox: self.append_crs_to_bbox,
            max_features: self.max_features,
            ..Default::default()
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            fallback_timeout: Duration::from_millis(self.fallback_timeout_ms),
            fallback_enabled: self.fallback_enabled,
            service_url: self.service_url.clone(),
            proxy_base_url: self.proxy_url.clone(),
        }
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
