//! Fault-injection pipeline.
//!
//! [`FaultSampler`] owns the ticker's RNG stream and makes every stochastic
//! decision other than the price itself, in a fixed order per tick:
//! inter-tick delay (with burst clamping), simulated one-way delay,
//! staleness, drop, duplicate. Changing the order changes the statistics
//! observably, so the ticker must call these in pipeline order.
//!
//! Reordering (`p_reorder`) and disconnect windows exist in configuration
//! but are reserved; see DESIGN.md.

use std::time::Duration;

use rand::rngs::StdRng;

use crate::config::{DexConfig, OracleConfig, Range};
use crate::rng::{happens, sample_range};

/// Static description of a feed's fault behavior.
#[derive(Debug, Clone)]
pub struct FaultProfile {
    /// Inter-tick delay range.
    pub tick_ms: Range<u64>,
    /// Simulated one-way delay range (informational `delay_ms` field).
    pub jitter_ms: Range<u64>,
    pub p_drop: f64,
    pub p_dup: f64,
    pub burst_mode: bool,
    pub burst_on_ms: u64,
    pub burst_off_ms: u64,
    pub stale_after_ms: u64,
}

impl FaultProfile {
    pub fn from_dex(config: &DexConfig) -> Self {
        Self {
            tick_ms: config.dex_tick_ms,
            jitter_ms: config.dex_latency_ms,
            p_drop: config.dex_p_drop,
            p_dup: config.dex_p_dup,
            burst_mode: config.dex_burst_mode,
            burst_on_ms: config.dex_burst_on_ms,
            burst_off_ms: config.dex_burst_off_ms,
            stale_after_ms: config.dex_stale_after_ms,
        }
    }

    pub fn from_oracle(config: &OracleConfig) -> Self {
        Self {
            tick_ms: config.oracle_tick_ms,
            jitter_ms: config.oracle_ws_jitter_ms,
            p_drop: config.oracle_p_drop,
            p_dup: config.oracle_p_dup,
            burst_mode: false,
            burst_on_ms: 0,
            burst_off_ms: 0,
            stale_after_ms: config.oracle_stale_after_ms,
        }
    }
}

/// Per-tick fault decisions drawn from the ticker's own RNG stream.
pub struct FaultSampler {
    profile: FaultProfile,
    rng: StdRng,
}

impl FaultSampler {
    pub fn new(profile: FaultProfile, rng: StdRng) -> Self {
        Self { profile, rng }
    }

    pub fn profile(&self) -> &FaultProfile {
        &self.profile
    }

    /// Sample the next inter-tick delay. In burst mode a fair coin either
    /// clamps the delay down to `burst_on_ms` (rapid-fire) or raises it to
    /// at least `burst_off_ms` (silence).
    pub fn next_tick_delay(&mut self) -> Duration {
        let mut tick_ms = sample_range(&mut self.rng, self.profile.tick_ms.min, self.profile.tick_ms.max);

        if self.profile.burst_mode {
            if happens(&mut self.rng, 0.5) {
                tick_ms = tick_ms.min(self.profile.burst_on_ms);
            } else {
                tick_ms = tick_ms.max(self.profile.burst_off_ms);
            }
        }

        Duration::from_millis(tick_ms)
    }

    /// Simulated one-way delay attached to the tick. The frame is still sent
    /// immediately; consumers may use this to model their own buffering.
    pub fn sample_delay_ms(&mut self) -> u32 {
        sample_range(&mut self.rng, self.profile.jitter_ms.min, self.profile.jitter_ms.max) as u32
    }

    /// Whether the gap since the previous generated tick crossed the
    /// staleness threshold.
    pub fn is_stale(&self, elapsed: Duration) -> bool {
        elapsed.as_millis() as u64 > self.profile.stale_after_ms
    }

    pub fn should_drop(&mut self) -> bool {
        happens(&mut self.rng, self.profile.p_drop)
    }

    pub fn should_duplicate(&mut self) -> bool {
        happens(&mut self.rng, self.profile.p_dup)
    }
}
