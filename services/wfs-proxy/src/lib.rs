//! WFS key-injecting proxy.
//!
//! Forwards browser WFS queries to the upstream service, replacing the
//! `key` and `domain` parameters with server-side values so the service
//! key never reaches the client. Also serves the viewer's static files.

pub mod error;
pub mod handlers;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

pub use error::ProxyError;
pub use state::{ProxyConfig, ProxyState};

/// Path the viewer sends WFS queries to.
pub const PROXY_ROUTE: &str = "/proxy/wfs";

/// Build the proxy router. Unmatched paths are served from `static_dir`
/// when one is given.
pub fn router(state: Arc<ProxyState>, static_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route(PROXY_ROUTE, get(handlers::proxy_wfs_handler))
        .route("/api/config", get(handlers::config_handler))
        .route("/health", get(handlers::health_handler));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
