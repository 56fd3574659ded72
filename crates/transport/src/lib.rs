//! Delivery of WFS requests.
//!
//! The primary path is a plain HTTP GET (directly or through the local
//! proxy) with a fixed retry budget. When no attempt reaches the service at
//! all, a single out-of-band attempt asks for a script-wrapped response and
//! waits for it on a token-correlated one-shot channel.

pub mod client;
pub mod error;
pub mod fallback;
pub mod http;

pub use client::{TransportClient, TransportConfig};
pub use error::{FallbackError, LoadError, TransportError};
pub use fallback::{
    new_token, parse_callback, CallbackGuard, CallbackRegistry, HttpScriptLoader, ScriptLoader,
};
pub use http::{HttpExchange, ReqwestExchange};
