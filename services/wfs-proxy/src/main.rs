//! WFS proxy server
//!
//! Serves the viewer and forwards its WFS queries with the service key.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use wfs_proxy::state::{DEFAULT_DOMAIN, UPSTREAM_TIMEOUT};
use wfs_proxy::{ProxyConfig, ProxyState};

/// WFS proxy server
#[derive(Parser, Debug)]
#[command(name = "wfs-proxy")]
#[command(about = "Forward WFS queries with a server-side service key")]
struct Args {
    /// Listen host
    #[arg(long, default_value = "0.0.0.0", env = "PROXY_HOST")]
    host: String,

    /// Listen port
    #[arg(short, long, default_value_t = 5173, env = "PORT")]
    port: u16,

    /// Service key injected into forwarded requests
    #[arg(long, default_value = "", env = "VWORLD_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Domain registered with the service key
    #[arg(long, default_value = DEFAULT_DOMAIN, env = "VWORLD_DOMAIN")]
    domain: String,

    /// Upstream WFS endpoint
    #[arg(long, default_value = wfs_protocol::DEFAULT_SERVICE_URL, env = "WFS_SERVICE_URL")]
    upstream_url: String,

    /// Upstream timeout in seconds
    #[arg(long, default_value_t = UPSTREAM_TIMEOUT.as_secs(), env = "PROXY_TIMEOUT_SECS")]
    timeout_secs: u64,

    /// Directory of static viewer files
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    json_logs: bool,

    /// Number of worker threads
    #[arg(long, env = "PROXY_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let subscriber = fmt().with_env_filter(filter).with_target(true);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = ProxyConfig {
        api_key: args.api_key,
        domain: args.domain,
        upstream_url: args.upstream_url,
        timeout: Duration::from_secs(args.timeout_secs),
    };

    if !config.is_configured() {
        warn!("VWORLD_API_KEY is not set, upstream requests will be rejected");
    }

    let state = Arc::new(ProxyState::new(config).context("Failed to build HTTP client")?);
    let app = wfs_proxy::router(state, args.static_dir.clone());

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        address = %addr,
        static_dir = ?args.static_dir,
        "WFS proxy listening"
    );

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
