//! feedsim - deterministic price-feed simulators
//!
//! Two independently runnable feeds built on a shared core:
//! - `dex-sim`: a DEX-style tick feed that publishes every surviving tick
//! - `oracle-sim`: a Chainlink-style feed gated by deviation + heartbeat
//!
//! Both generate a synthetic price process from a seeded RNG, push it through
//! a fault-injection pipeline (drops, duplicates, jitter, staleness, bursts)
//! and fan the result out to WebSocket subscribers. Given the same seed and
//! configuration, two runs produce identical tick sequences.

pub mod broadcast;
pub mod config;
pub mod engine;
pub mod fault;
pub mod metrics;
pub mod middleware;
pub mod publish;
pub mod rng;
pub mod server;
pub mod snapshot;
pub mod subscribers;
pub mod ticker;
pub mod types;

pub use config::{DexConfig, OracleConfig, ServerConfig};
pub use metrics::FeedMetrics;
pub use types::{PriceTick, SourceKind};
