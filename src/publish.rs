//! Oracle publication gating.
//!
//! Chainlink-style feeds only post a round when the price moved past a
//! deviation threshold or a heartbeat interval expired. The gate sits
//! *before* the fault pipeline's drop decision, and its state is updated on
//! every decision to publish - even when the frame is subsequently dropped -
//! so a run of drops cannot re-fire the heartbeat on the next tick.
//!
//! The DEX feed has no gate: every generated tick that survives the drop
//! decision is broadcast.

use std::time::{Duration, Instant};

/// Why a tick was (or was not) published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishDecision {
    /// No prior publication; always publish.
    First,
    /// Price moved at least `deviation_bps` from the last published price.
    Deviation { bps: u32 },
    /// Heartbeat interval expired since the last publication.
    Heartbeat { elapsed_ms: u64 },
    /// Neither trigger fired; the tick is discarded.
    Suppressed { bps: u32 },
}

impl PublishDecision {
    pub fn is_publish(&self) -> bool {
        !matches!(self, PublishDecision::Suppressed { .. })
    }
}

/// Deviation-or-heartbeat gate with the oracle's publication state.
#[derive(Debug)]
pub struct DeviationGate {
    deviation_bps: u32,
    heartbeat: Duration,
    last_published_price: Option<f64>,
    last_publish_time: Option<Instant>,
}

impl DeviationGate {
    pub fn new(deviation_bps: u32, heartbeat_ms: u64) -> Self {
        Self {
            deviation_bps,
            heartbeat: Duration::from_millis(heartbeat_ms),
            last_published_price: None,
            last_publish_time: None,
        }
    }

    pub fn deviation_bps(&self) -> u32 {
        self.deviation_bps
    }

    pub fn last_published_price(&self) -> Option<f64> {
        self.last_published_price
    }

    /// Decide whether `price` should be published at monotonic time `now`.
    /// Deviation uses absolute value and integer truncation of the bps.
    pub fn evaluate(&self, price: f64, now: Instant) -> PublishDecision {
        let Some(last) = self.last_published_price else {
            return PublishDecision::First;
        };

        let bps = ((price - last).abs() / last * 10_000.0) as u32;
        if bps >= self.deviation_bps {
            return PublishDecision::Deviation { bps };
        }

        if let Some(last_time) = self.last_publish_time {
            let elapsed = now.duration_since(last_time);
            if elapsed >= self.heartbeat {
                return PublishDecision::Heartbeat {
                    elapsed_ms: elapsed.as_millis() as u64,
                };
            }
        }

        PublishDecision::Suppressed { bps }
    }

    /// Record a publish decision. Called on every intent to publish,
    /// including when the fault pipeline drops the frame afterwards.
    pub fn mark_published(&mut self, price: f64, now: Instant) {
        self.last_published_price = Some(price);
        self.last_publish_time = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_always_publishes() {
        let gate = DeviationGate::new(500, 15_000);
        assert_eq!(
            gate.evaluate(100.0, Instant::now()),
            PublishDecision::First
        );
    }

    #[test]
    fn deviation_trigger_is_absolute_and_truncated() {
        let mut gate = DeviationGate::new(500, u64::MAX / 2);
        let t0 = Instant::now();
        gate.mark_published(100.0, t0);

        // 4.99% -> 499 bps, below the 500 threshold.
        assert!(!gate.evaluate(104.99, t0).is_publish());
        // Exactly 5% either direction fires.
        assert_eq!(
            gate.evaluate(105.0, t0),
            PublishDecision::Deviation { bps: 500 }
        );
        assert_eq!(
            gate.evaluate(95.0, t0),
            PublishDecision::Deviation { bps: 500 }
        );
    }

    #[test]
    fn heartbeat_fires_after_interval() {
        let mut gate = DeviationGate::new(10_000, 500);
        let t0 = Instant::now();
        gate.mark_published(100.0, t0);

        assert!(!gate
            .evaluate(100.0, t0 + Duration::from_millis(499))
            .is_publish());
        assert_eq!(
            gate.evaluate(100.0, t0 + Duration::from_millis(500)),
            PublishDecision::Heartbeat { elapsed_ms: 500 }
        );
    }

    #[test]
    fn mark_published_resets_heartbeat() {
        let mut gate = DeviationGate::new(10_000, 500);
        let t0 = Instant::now();
        gate.mark_published(100.0, t0);
        gate.mark_published(100.0, t0 + Duration::from_millis(400));

        // 600ms after t0 but only 200ms after the second publish.
        assert!(!gate
            .evaluate(100.0, t0 + Duration::from_millis(600))
            .is_publish());
    }

    #[test]
    fn suppressed_reports_observed_bps() {
        let mut gate = DeviationGate::new(500, u64::MAX / 2);
        let t0 = Instant::now();
        gate.mark_published(100.0, t0);

        assert_eq!(
            gate.evaluate(101.0, t0),
            PublishDecision::Suppressed { bps: 100 }
        );
        assert_eq!(gate.last_published_price(), Some(100.0));
    }
}
