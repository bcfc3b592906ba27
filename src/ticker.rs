//! The ticker loops driving each feed.
//!
//! One ticker task runs per process. Each iteration sleeps for a sampled
//! inter-tick delay, then runs `step()`: sample the simulated delay, compute
//! staleness, generate a price, and push it through drop / broadcast /
//! duplicate in that fixed order. `step()` is synchronous and takes the
//! clock readings as arguments so tests can drive it with fabricated time.
//!
//! The ticker is survival-critical: nothing in a step can short-circuit the
//! loop. Per-sink failures are absorbed inside the broadcaster.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::broadcast::Broadcaster;
use crate::engine::PriceEngine;
use crate::fault::FaultSampler;
use crate::metrics::FeedMetrics;
use crate::publish::{DeviationGate, PublishDecision};
use crate::types::{current_time_ms, SourceKind};

/// DEX discipline: every generated tick that survives the drop decision is
/// broadcast.
pub struct DexTicker {
    engine: Box<dyn PriceEngine>,
    faults: FaultSampler,
    broadcaster: Broadcaster,
    metrics: Arc<FeedMetrics>,
    seq: u64,
    last_tick_at: Option<Instant>,
}

impl DexTicker {
    pub fn new(
        engine: Box<dyn PriceEngine>,
        faults: FaultSampler,
        broadcaster: Broadcaster,
        metrics: Arc<FeedMetrics>,
    ) -> Self {
        Self {
            engine,
            faults,
            broadcaster,
            metrics,
            seq: 0,
            last_tick_at: None,
        }
    }

    /// One tick cycle at monotonic time `now` / wall-clock `ts_ms`.
    pub fn step(&mut self, now: Instant, ts_ms: u64) {
        let delay_ms = self.faults.sample_delay_ms();
        let elapsed = now.duration_since(self.last_tick_at.unwrap_or(now));
        let stale = self.faults.is_stale(elapsed);

        let tick = self
            .engine
            .next_tick(ts_ms, self.seq, SourceKind::Dex, delay_ms, stale);
        self.metrics.inc_generated();
        self.seq += 1;
        self.last_tick_at = Some(now);

        if self.faults.should_drop() {
            self.metrics.inc_dropped();
            return;
        }

        info!(
            source = tick.source.as_str(),
            pair = %tick.pair,
            price = tick.price,
            seq = tick.src_seq,
            delay_ms = tick.delay_ms,
            stale = tick.stale,
            "price_tick"
        );

        let frame = self.broadcaster.broadcast(&tick);
        self.metrics.inc_sent();

        if self.faults.should_duplicate() {
            self.broadcaster.rebroadcast(&frame);
            self.metrics.inc_duplicated();
        }
    }

    pub async fn run(mut self) {
        loop {
            let delay = self.faults.next_tick_delay();
            tokio::time::sleep(delay).await;
            self.step(Instant::now(), current_time_ms());
        }
    }
}

/// Oracle discipline: the deviation/heartbeat gate runs before the drop
/// decision, and only gate-passing ticks count as generated.
pub struct OracleTicker {
    engine: Box<dyn PriceEngine>,
    faults: FaultSampler,
    gate: DeviationGate,
    broadcaster: Broadcaster,
    metrics: Arc<FeedMetrics>,
    seq: u64,
    last_tick_at: Option<Instant>,
}

impl OracleTicker {
    pub fn new(
        engine: Box<dyn PriceEngine>,
        faults: FaultSampler,
        gate: DeviationGate,
        broadcaster: Broadcaster,
        metrics: Arc<FeedMetrics>,
    ) -> Self {
        Self {
            engine,
            faults,
            gate,
            broadcaster,
            metrics,
            seq: 0,
            last_tick_at: None,
        }
    }

    pub fn step(&mut self, now: Instant, ts_ms: u64) {
        let delay_ms = self.faults.sample_delay_ms();
        let elapsed = now.duration_since(self.last_tick_at.unwrap_or(now));
        let stale = self.faults.is_stale(elapsed);

        let tick = self
            .engine
            .next_tick(ts_ms, self.seq, SourceKind::Chainlink, delay_ms, stale);

        let decision = self.gate.evaluate(tick.price, now);
        match decision {
            PublishDecision::Suppressed { bps } => {
                debug!(
                    price = tick.price,
                    last_published = ?self.gate.last_published_price(),
                    deviation_bps = bps,
                    threshold_bps = self.gate.deviation_bps(),
                    "publication gate suppressed tick"
                );
                self.last_tick_at = Some(now);
                return;
            }
            PublishDecision::Deviation { bps } => {
                info!(
                    deviation_bps = bps,
                    threshold_bps = self.gate.deviation_bps(),
                    "deviation trigger"
                );
            }
            PublishDecision::Heartbeat { elapsed_ms } => {
                info!(elapsed_ms, "heartbeat trigger");
            }
            PublishDecision::First => {}
        }

        self.metrics.inc_generated();

        if self.faults.should_drop() {
            self.metrics.inc_dropped();
            // Intent to publish still counts: a run of drops must not cause
            // spurious heartbeat re-firing on the next tick.
            self.gate.mark_published(tick.price, now);
            self.seq += 1;
            self.last_tick_at = Some(now);
            return;
        }

        info!(
            source = tick.source.as_str(),
            pair = %tick.pair,
            price = tick.price,
            seq = tick.src_seq,
            delay_ms = tick.delay_ms,
            stale = tick.stale,
            "price_tick"
        );

        let frame = self.broadcaster.broadcast(&tick);
        self.gate.mark_published(tick.price, now);
        self.metrics.inc_sent();
        self.seq += 1;

        if self.faults.should_duplicate() {
            self.broadcaster.rebroadcast(&frame);
            self.metrics.inc_duplicated();
        }

        self.last_tick_at = Some(now);
    }

    pub async fn run(mut self) {
        loop {
            let delay = self.faults.next_tick_delay();
            tokio::time::sleep(delay).await;
            self.step(Instant::now(), current_time_ms());
        }
    }
}
