//! OGC WFS 1.1.0 protocol implementation (client side).
//!
//! Supports:
//! - GetFeature request construction for an area of interest
//! - GetCapabilities request construction and feature type discovery
//! - Interpretation of GetFeature responses, including XML exception reports

pub mod capabilities;
pub mod exceptions;
pub mod getfeature;
pub mod request;
pub mod response;

pub use capabilities::parse_type_names;
pub use exceptions::{extract_exception_text, preview};
pub use getfeature::{GetFeatureConfig, QueryBuilder, DEFAULT_SERVICE_URL};
pub use request::{Endpoint, Method, RawResponse, RequestDescriptor};
pub use response::{interpret, InterpretedResponse};
