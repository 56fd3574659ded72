//! Layer feature store and fetch session.
//!
//! Ties the pieces together: a [`FeaturePipeline`] performs one live
//! retrieval (query, delivery, interpretation, reprojection, clipping), the
//! [`LayerFeatureStore`] records the latest result per layer, and a
//! [`Session`] holds the credentials and the active area of interest.

pub mod config;
pub mod pipeline;
pub mod preflight;
pub mod record;
pub mod session;
pub mod store;

pub use config::{ClientConfig, ConfigError, DEFAULT_DOMAIN, PROXY_PATH};
pub use pipeline::{Credentials, FeaturePipeline};
pub use preflight::CapabilityPreflight;
pub use record::{FetchedLayerRecord, LayerStatus};
pub use session::Session;
pub use store::LayerFeatureStore;
