//! Synthetic price engines.
//!
//! An engine owns the current price and a private RNG stream; the ticker
//! calls [`PriceEngine::next_tick`] once per generated tick. Two runs with
//! the same seed/label and call sequence produce bit-identical prices.

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::{ConfigError, ServerConfig};
use crate::rng::happens;
use crate::types::{PriceTick, SourceKind};

/// Prices never go below one cent regardless of how hard sigma pulls down.
pub const PRICE_FLOOR: f64 = 0.01;

pub trait PriceEngine: Send {
    fn next_tick(
        &mut self,
        ts: u64,
        seq: u64,
        source: SourceKind,
        delay_ms: u32,
        stale: bool,
    ) -> PriceTick;

    fn current_price(&self) -> f64;

    fn pair(&self) -> &str;
}

/// Years per tick as a double. Drift and volatility are annualized.
fn dt_years(tick_interval_ms: u64) -> f64 {
    tick_interval_ms as f64 / 1000.0 / 86_400.0 / 365.25
}

/// Standard-normal sample via the Box-Muller transform.
fn sample_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Geometric Brownian motion: `dS = mu*S dt + sigma*S dW`.
pub struct GbmPriceEngine {
    pair: String,
    price: f64,
    drift: f64,
    volatility: f64,
    tick_interval_ms: u64,
    rng: StdRng,
}

impl GbmPriceEngine {
    pub fn new(
        pair: String,
        initial_price: f64,
        drift: f64,
        volatility: f64,
        tick_interval_ms: u64,
        rng: StdRng,
    ) -> Self {
        Self {
            pair,
            price: initial_price,
            drift,
            volatility,
            tick_interval_ms,
            rng,
        }
    }
}

impl PriceEngine for GbmPriceEngine {
    fn next_tick(
        &mut self,
        ts: u64,
        seq: u64,
        source: SourceKind,
        delay_ms: u32,
        stale: bool,
    ) -> PriceTick {
        let dt = dt_years(self.tick_interval_ms);
        let dw = sample_normal(&mut self.rng) * dt.sqrt();
        let relative_change = self.drift * dt + self.volatility * dw;

        self.price = (self.price * relative_change.exp()).max(PRICE_FLOOR);

        PriceTick {
            ts,
            pair: self.pair.clone(),
            price: self.price,
            source,
            src_seq: seq,
            delay_ms,
            stale,
        }
    }

    fn current_price(&self) -> f64 {
        self.price
    }

    fn pair(&self) -> &str {
        &self.pair
    }
}

/// GBM plus Merton-style compound Poisson jumps in log space.
///
/// At the tick intervals this feed runs at, `lambda * dt` is tiny, so the
/// Poisson arrival collapses to at most one jump per tick.
pub struct JumpDiffusionPriceEngine {
    pair: String,
    price: f64,
    drift: f64,
    volatility: f64,
    jump_lambda: f64,
    jump_mu: f64,
    jump_sigma: f64,
    tick_interval_ms: u64,
    rng: StdRng,
}

impl JumpDiffusionPriceEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pair: String,
        initial_price: f64,
        drift: f64,
        volatility: f64,
        jump_lambda: f64,
        jump_mu: f64,
        jump_sigma: f64,
        tick_interval_ms: u64,
        rng: StdRng,
    ) -> Self {
        Self {
            pair,
            price: initial_price,
            drift,
            volatility,
            jump_lambda,
            jump_mu,
            jump_sigma,
            tick_interval_ms,
            rng,
        }
    }
}

impl PriceEngine for JumpDiffusionPriceEngine {
    fn next_tick(
        &mut self,
        ts: u64,
        seq: u64,
        source: SourceKind,
        delay_ms: u32,
        stale: bool,
    ) -> PriceTick {
        let dt = dt_years(self.tick_interval_ms);
        let dw = sample_normal(&mut self.rng) * dt.sqrt();
        let mut relative_change = self.drift * dt + self.volatility * dw;

        let p_jump = (self.jump_lambda * dt).min(1.0);
        if happens(&mut self.rng, p_jump) {
            relative_change += self.jump_mu + self.jump_sigma * sample_normal(&mut self.rng);
        }

        self.price = (self.price * relative_change.exp()).max(PRICE_FLOOR);

        PriceTick {
            ts,
            pair: self.pair.clone(),
            price: self.price,
            source,
            src_seq: seq,
            delay_ms,
            stale,
        }
    }

    fn current_price(&self) -> f64 {
        self.price
    }

    fn pair(&self) -> &str {
        &self.pair
    }
}

/// Build the engine named by `price_model`, backed by the given labeled RNG.
pub fn engine_from_config(
    server: &ServerConfig,
    tick_interval_ms: u64,
    rng: StdRng,
) -> Result<Box<dyn PriceEngine>, ConfigError> {
    let pair = server
        .pairs
        .first()
        .cloned()
        .ok_or_else(|| ConfigError::Invalid("pairs must not be empty".to_string()))?;

    match server.price_model.as_str() {
        "gbm" => Ok(Box::new(GbmPriceEngine::new(
            pair,
            server.price_start,
            server.gbm_mu,
            server.gbm_sigma,
            tick_interval_ms,
            rng,
        ))),
        "jump_diffusion" => Ok(Box::new(JumpDiffusionPriceEngine::new(
            pair,
            server.price_start,
            server.gbm_mu,
            server.gbm_sigma,
            server.jump_lambda,
            server.jump_mu,
            server.jump_sigma,
            tick_interval_ms,
            rng,
        ))),
        other => Err(ConfigError::Invalid(format!(
            "unknown price_model '{}' (expected gbm or jump_diffusion)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::labeled_rng;

    fn gbm(seed: u64) -> GbmPriceEngine {
        GbmPriceEngine::new(
            "ETH/USD".to_string(),
            3500.0,
            0.0,
            2.0,
            1000,
            labeled_rng(seed, "TEST"),
        )
    }

    #[test]
    fn gbm_is_deterministic() {
        let mut engine1 = gbm(42);
        let mut engine2 = gbm(42);

        for i in 0..10 {
            let t1 = engine1.next_tick(i * 1000, i, SourceKind::Dex, 0, false);
            let t2 = engine2.next_tick(i * 1000, i, SourceKind::Dex, 0, false);
            assert_eq!(t1.price.to_bits(), t2.price.to_bits());
            assert_eq!(t1.pair, t2.pair);
            assert_eq!(t1.src_seq, t2.src_seq);
        }
    }

    #[test]
    fn gbm_prices_stay_positive_and_vary() {
        let mut engine = gbm(42);

        let mut prices = Vec::new();
        for i in 0..100 {
            let tick = engine.next_tick(i * 1000, i, SourceKind::Dex, 0, false);
            assert!(tick.price >= PRICE_FLOOR);
            prices.push(tick.price);
        }
        assert!(prices.iter().any(|p| *p != prices[0]));
    }

    #[test]
    fn gbm_current_price_tracks_last_tick() {
        let mut engine = gbm(42);
        assert_eq!(engine.current_price(), 3500.0);

        let tick = engine.next_tick(1000, 0, SourceKind::Dex, 0, false);
        assert_eq!(engine.current_price(), tick.price);
        assert_eq!(engine.pair(), "ETH/USD");
    }

    #[test]
    fn gbm_zero_vol_holds_price() {
        let mut engine = GbmPriceEngine::new(
            "ETH/USD".to_string(),
            100.0,
            0.0,
            0.0,
            1000,
            labeled_rng(42, "TEST"),
        );
        for i in 0..20 {
            let tick = engine.next_tick(i * 1000, i, SourceKind::Chainlink, 0, false);
            assert_eq!(tick.price, 100.0);
        }
    }

    #[test]
    fn jump_diffusion_is_deterministic() {
        let make = || {
            JumpDiffusionPriceEngine::new(
                "BTC/USD".to_string(),
                50_000.0,
                0.0,
                1.5,
                50.0,
                -0.02,
                0.05,
                1000,
                labeled_rng(7, "TEST"),
            )
        };
        let mut engine1 = make();
        let mut engine2 = make();

        for i in 0..50 {
            let t1 = engine1.next_tick(i * 1000, i, SourceKind::Dex, 0, false);
            let t2 = engine2.next_tick(i * 1000, i, SourceKind::Dex, 0, false);
            assert_eq!(t1.price.to_bits(), t2.price.to_bits());
            assert!(t1.price >= PRICE_FLOOR);
        }
    }

    #[test]
    fn engine_from_config_selects_model() {
        let mut server = ServerConfig {
            pairs: vec!["ETH/USD".to_string()],
            price_model: "gbm".to_string(),
            price_start: 3500.0,
            gbm_mu: 0.0,
            gbm_sigma: 2.0,
            jump_lambda: 0.0,
            jump_mu: 0.0,
            jump_sigma: 0.0,
            seed: 42,
            ws_bind: "127.0.0.1:9101".to_string(),
            http_bind: "127.0.0.1:9101".to_string(),
            cors_allow_origins: vec![],
        };

        let engine = engine_from_config(&server, 1000, labeled_rng(42, "DEX")).unwrap();
        assert_eq!(engine.pair(), "ETH/USD");

        server.price_model = "jump_diffusion".to_string();
        assert!(engine_from_config(&server, 1000, labeled_rng(42, "DEX")).is_ok());

        server.price_model = "heston".to_string();
        assert!(engine_from_config(&server, 1000, labeled_rng(42, "DEX")).is_err());
    }
}
