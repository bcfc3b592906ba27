//! DEX tick-feed simulator.
//!
//! Usage:
//!   dex-sim [config_path]        (default: configs/dex.yaml)
//!
//! Serves `/ws/ticks`, `/prices/snapshot`, `/metrics`, `/healthz` and the
//! static viewer pages from a single bind address. Exits non-zero on any
//! fatal init error (bad config, bind failure).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use feedsim::broadcast::Broadcaster;
use feedsim::config::{parse_bind_addr, DexConfig};
use feedsim::engine::engine_from_config;
use feedsim::fault::{FaultProfile, FaultSampler};
use feedsim::metrics::FeedMetrics;
use feedsim::rng::labeled_rng;
use feedsim::server::{cors_layer, dex_router, AppState};
use feedsim::snapshot::SnapshotStore;
use feedsim::subscribers::SubscriberRegistry;
use feedsim::ticker::DexTicker;

#[derive(Parser, Debug)]
#[command(name = "dex-sim")]
#[command(about = "DEX tick-feed simulator")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(env = "DEX_SIM_CONFIG", default_value = "configs/dex.yaml")]
    config_path: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = DexConfig::load(&args.config_path)
        .with_context(|| format!("failed to load config from {}", args.config_path))?;

    info!("🔵 DEX simulator starting");
    info!("  WS:      ws://{}/ws/ticks", config.server.http_bind);
    info!("  HTTP:    http://{}/prices/snapshot", config.server.http_bind);
    info!("  Metrics: http://{}/metrics", config.server.http_bind);
    info!("  Model:   {}", config.server.price_model);
    info!("  Seed:    {}", config.server.seed);

    let (host, port) = parse_bind_addr(&config.server.http_bind)?;

    let metrics = Arc::new(FeedMetrics::new());
    let registry = Arc::new(SubscriberRegistry::new());
    let snapshot = Arc::new(SnapshotStore::new());

    let engine = engine_from_config(
        &config.server,
        config.dex_tick_ms.min,
        labeled_rng(config.server.seed, "DEX"),
    )?;
    let faults = FaultSampler::new(
        FaultProfile::from_dex(&config),
        labeled_rng(config.server.seed, "DEX_TICKER"),
    );
    let broadcaster = Broadcaster::new(registry.clone(), snapshot.clone());
    let ticker = DexTicker::new(engine, faults, broadcaster, metrics.clone());
    tokio::spawn(ticker.run());

    let state = AppState {
        feed_id: "dex_ticks",
        metrics,
        registry,
        snapshot,
        static_dir: Some(PathBuf::from("static")),
    };
    let app = dex_router(state, cors_layer(&config.server.cors_allow_origins));

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {}:{}", host, port))?;
    info!("🚀 DEX server ready on {}:{}", host, port);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
