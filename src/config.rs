//! YAML configuration for both simulators.
//!
//! A shared [`ServerConfig`] block (pairs, price model, seed, binds, CORS)
//! is flattened into the per-feed configs. Everything is fatal at startup:
//! a missing file, a bad type or an unparseable bind address exits non-zero.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid bind address '{0}' (expected host:port)")]
    BadBindAddr(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Inclusive `{min, max}` pair used for all sampled intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

/// Keys shared by both feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub pairs: Vec<String>,
    /// `"gbm"` or `"jump_diffusion"`.
    pub price_model: String,
    pub price_start: f64,
    pub gbm_mu: f64,
    pub gbm_sigma: f64,
    pub jump_lambda: f64,
    pub jump_mu: f64,
    pub jump_sigma: f64,
    pub seed: u64,
    /// Accepted and validated; both surfaces are served from `http_bind`.
    pub ws_bind: String,
    pub http_bind: String,
    pub cors_allow_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexConfig {
    #[serde(flatten)]
    pub server: ServerConfig,
    pub dex_tick_ms: Range<u64>,
    pub dex_ws_jitter_ms: Range<u64>,
    pub dex_latency_ms: Range<u64>,
    pub dex_p_drop: f64,
    pub dex_p_dup: f64,
    /// Reserved: parsed but not applied (see DESIGN.md).
    pub dex_p_reorder: f64,
    pub dex_burst_mode: bool,
    pub dex_burst_on_ms: u64,
    pub dex_burst_off_ms: u64,
    /// Reserved: parsed but not applied (see DESIGN.md).
    pub dex_disconnect_windows_ms: Vec<u64>,
    pub dex_stale_after_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(flatten)]
    pub server: ServerConfig,
    pub oracle_tick_ms: Range<u64>,
    pub oracle_ws_jitter_ms: Range<u64>,
    pub oracle_deviation_bps: u32,
    pub oracle_heartbeat_ms: u64,
    pub oracle_p_drop: f64,
    pub oracle_p_dup: f64,
    /// Reserved: parsed but not applied (see DESIGN.md).
    pub oracle_p_reorder: f64,
    pub oracle_stale_after_ms: u64,
}

impl DexConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = load_yaml(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        validate_probability("dex_p_drop", self.dex_p_drop)?;
        validate_probability("dex_p_dup", self.dex_p_dup)?;
        validate_probability("dex_p_reorder", self.dex_p_reorder)?;
        Ok(())
    }
}

impl OracleConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = load_yaml(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        validate_probability("oracle_p_drop", self.oracle_p_drop)?;
        validate_probability("oracle_p_dup", self.oracle_p_dup)?;
        validate_probability("oracle_p_reorder", self.oracle_p_reorder)?;
        Ok(())
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.pairs.is_empty() {
            return Err(ConfigError::Invalid("pairs must not be empty".to_string()));
        }
        if self.price_start <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "price_start must be positive, got {}",
                self.price_start
            )));
        }
        parse_bind_addr(&self.http_bind)?;
        parse_bind_addr(&self.ws_bind)?;
        Ok(())
    }
}

fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn validate_probability(key: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{} must be in [0, 1], got {}",
            key, value
        )));
    }
    Ok(())
}

/// Split `"host:port"` into its parts. The port is the final colon-separated
/// segment so IPv6-ish hosts keep their colons.
pub fn parse_bind_addr(addr: &str) -> Result<(String, u16), ConfigError> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| ConfigError::BadBindAddr(addr.to_string()))?;
    if host.is_empty() {
        return Err(ConfigError::BadBindAddr(addr.to_string()));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| ConfigError::BadBindAddr(addr.to_string()))?;
    Ok((host.to_string(), port))
}
