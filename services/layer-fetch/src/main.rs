//! Fetch land-use layers for an area of interest from the command line.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use feature_store::{ClientConfig, Session};
use layer_fetch::{
    fetch_to_dir, format_smoke, format_statuses, load_aoi_file, mercator_bbox, parse_bbox_aoi,
    parse_center, smoke_aoi, SmokeResult, SMOKE_LAYERS,
};
use wfs_common::{AreaOfInterest, LayerCatalog, LayerKey};

#[derive(Parser)]
#[command(name = "layer-fetch")]
#[command(about = "Fetch WFS layers clipped to an area of interest", long_about = None)]
struct Cli {
    /// Client configuration YAML (defaults to environment variables)
    #[arg(long, global = true, env = "LAYER_FETCH_CONFIG")]
    config: Option<PathBuf>,

    /// Layer catalog YAML (defaults to the built-in catalog)
    #[arg(long, global = true, env = "LAYER_CATALOG")]
    catalog: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AoiArgs {
    /// GeoJSON file holding the AOI polygon
    #[arg(long, conflicts_with = "bbox")]
    aoi: Option<PathBuf>,

    /// AOI rectangle as minLon,minLat,maxLon,maxLat
    #[arg(long)]
    bbox: Option<String>,
}

impl AoiArgs {
    fn resolve(&self) -> Result<AreaOfInterest> {
        match (&self.aoi, &self.bbox) {
            (Some(path), _) => load_aoi_file(path),
            (None, Some(bbox)) => parse_bbox_aoi(bbox),
            (None, None) => bail!("an AOI is required: pass --aoi <file> or --bbox <extent>"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch layers over an AOI and write them as GeoJSON
    Fetch {
        #[command(flatten)]
        aoi: AoiArgs,

        /// Layer keys to fetch (default: every catalog layer)
        #[arg(short, long, value_delimiter = ',')]
        layers: Vec<String>,

        /// Output directory for <layer>.geojson files
        #[arg(short, long, default_value = "layers")]
        out: PathBuf,
    },

    /// Fetch a few layers over a small box to check the setup
    Smoke {
        /// Box center as lon,lat
        #[arg(long, default_value = "127.5,36.3")]
        center: String,
    },

    /// Print the AOI bounding box in Web Mercator meters
    Bbox {
        #[command(flatten)]
        aoi: AoiArgs,
    },

    /// List the feature types the service advertises
    Capabilities,

    /// List the layer catalog
    Layers,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run(cli))
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let catalog = load_catalog(cli.catalog.as_deref())?;

    match cli.command {
        Commands::Layers => {
            for layer in catalog.iter() {
                println!(
                    "{:<12} {:<14} {:<8} {}",
                    layer.key, layer.type_name, layer.color, layer.label
                );
            }
            Ok(())
        }
        Commands::Bbox { aoi } => {
            let aoi = aoi.resolve()?;
            let bbox = mercator_bbox(&aoi).context("AOI has no extent")?;
            println!(
                "{},{},{},{}",
                bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
            );
            Ok(())
        }
        Commands::Capabilities => {
            let session = open_session(cli.config.as_deref(), catalog)?;
            let names = session
                .store()
                .pipeline()
                .type_names(session.credentials())
                .await?;
            match names {
                Some(names) => {
                    let mut names: Vec<_> = names.into_iter().collect();
                    names.sort();
                    for name in names {
                        println!("{}", name);
                    }
                }
                None => warn!("Service advertised no feature types"),
            }
            Ok(())
        }
        Commands::Fetch { aoi, layers, out } => {
            let session = open_session(cli.config.as_deref(), catalog)?;
            session.set_aoi(aoi.resolve()?).await;

            let keys: Vec<LayerKey> = if layers.is_empty() {
                session.store().catalog().keys().cloned().collect()
            } else {
                layers.iter().map(|l| LayerKey::new(l.as_str())).collect()
            };

            let result = fetch_to_dir(&session, &keys, &out).await;
            print!("{}", format_statuses(&session.store().statuses().await));
            result.map(|_| ())
        }
        Commands::Smoke { center } => {
            let (lon, lat) = parse_center(&center)?;
            let session = open_session(cli.config.as_deref(), catalog)?;
            session.set_aoi(smoke_aoi(lon, lat)?).await;

            let mut results = Vec::with_capacity(SMOKE_LAYERS.len());
            for key in SMOKE_LAYERS.iter().map(|k| LayerKey::new(*k)) {
                let outcome = session
                    .fetch_and_show(&key)
                    .await
                    .map(|fc| fc.features.len())
                    .map_err(|e| e.to_string());
                results.push(SmokeResult { key, outcome });
            }
            print!("{}", format_smoke(&results));

            if results.iter().any(|r| r.outcome.is_err()) {
                bail!("smoke test failed");
            }
            Ok(())
        }
    }
}

fn load_catalog(path: Option<&Path>) -> Result<LayerCatalog> {
    match path {
        Some(path) => Ok(LayerCatalog::load(path)?),
        None => Ok(LayerCatalog::default()),
    }
}

fn open_session(config_path: Option<&Path>, catalog: LayerCatalog) -> Result<Session> {
    let config = match config_path {
        Some(path) => ClientConfig::from_yaml_file(path)?,
        None => ClientConfig::from_env()?,
    };
    if !config.is_configured() {
        bail!("no service key configured: set VWORLD_API_KEY or api_key in the config file");
    }
    Ok(Session::from_config(&config, catalog)?)
}
