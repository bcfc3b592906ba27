//! Chainlink-style oracle feed simulator.
//!
//! Usage:
//!   oracle-sim [config_path]     (default: configs/oracle.yaml)
//!
//! Publishes a round only on deviation or heartbeat, mirroring how on-chain
//! price feeds behave. Serves `/ws/prices`, `/oracle/snapshot`, `/metrics`
//! and `/healthz`. Exits non-zero on any fatal init error.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use feedsim::broadcast::Broadcaster;
use feedsim::config::{parse_bind_addr, OracleConfig};
use feedsim::engine::engine_from_config;
use feedsim::fault::{FaultProfile, FaultSampler};
use feedsim::metrics::FeedMetrics;
use feedsim::publish::DeviationGate;
use feedsim::rng::labeled_rng;
use feedsim::server::{cors_layer, oracle_router, AppState};
use feedsim::snapshot::SnapshotStore;
use feedsim::subscribers::SubscriberRegistry;
use feedsim::ticker::OracleTicker;

#[derive(Parser, Debug)]
#[command(name = "oracle-sim")]
#[command(about = "Chainlink-style oracle feed simulator")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(env = "ORACLE_SIM_CONFIG", default_value = "configs/oracle.yaml")]
    config_path: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = OracleConfig::load(&args.config_path)
        .with_context(|| format!("failed to load config from {}", args.config_path))?;

    info!("🟠 Oracle simulator starting");
    info!("  WS:      ws://{}/ws/prices", config.server.http_bind);
    info!("  HTTP:    http://{}/oracle/snapshot", config.server.http_bind);
    info!("  Metrics: http://{}/metrics", config.server.http_bind);
    info!("  Model:   {}", config.server.price_model);
    info!("  Seed:    {}", config.server.seed);
    info!("  Deviation threshold: {} bps", config.oracle_deviation_bps);
    info!("  Heartbeat: {} ms", config.oracle_heartbeat_ms);

    let (host, port) = parse_bind_addr(&config.server.http_bind)?;

    let metrics = Arc::new(FeedMetrics::new());
    let registry = Arc::new(SubscriberRegistry::new());
    let snapshot = Arc::new(SnapshotStore::new());

    let engine = engine_from_config(
        &config.server,
        config.oracle_tick_ms.min,
        labeled_rng(config.server.seed, "ORACLE"),
    )?;
    let faults = FaultSampler::new(
        FaultProfile::from_oracle(&config),
        labeled_rng(config.server.seed, "ORACLE_TICKER"),
    );
    let gate = DeviationGate::new(config.oracle_deviation_bps, config.oracle_heartbeat_ms);
    let broadcaster = Broadcaster::new(registry.clone(), snapshot.clone());
    let ticker = OracleTicker::new(engine, faults, gate, broadcaster, metrics.clone());
    tokio::spawn(ticker.run());

    let state = AppState {
        feed_id: "oracle_prices",
        metrics,
        registry,
        snapshot,
        static_dir: None,
    };
    let app = oracle_router(state, cors_layer(&config.server.cors_allow_origins));

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {}:{}", host, port))?;
    info!("🚀 Oracle server ready on {}:{}", host, port);

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
