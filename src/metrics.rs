//! Feed counters exposed in Prometheus exposition format.
//!
//! The registry is an explicitly-passed `Arc<FeedMetrics>` handle rather than
//! a process singleton so tests can construct and reset their own instance.
//! All counters are atomic; increments race freely and never take a lock.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct FeedMetrics {
    pub price_ticks_generated: AtomicU64,
    pub ws_frames_sent: AtomicU64,
    pub ws_frames_dropped: AtomicU64,
    pub ws_frames_duplicated: AtomicU64,
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_generated(&self) {
        self.price_ticks_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_sent(&self) {
        self.ws_frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dropped(&self) {
        self.ws_frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_duplicated(&self) {
        self.ws_frames_duplicated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn generated(&self) -> u64 {
        self.price_ticks_generated.load(Ordering::Relaxed)
    }

    pub fn sent(&self) -> u64 {
        self.ws_frames_sent.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.ws_frames_dropped.load(Ordering::Relaxed)
    }

    pub fn duplicated(&self) -> u64 {
        self.ws_frames_duplicated.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.price_ticks_generated.store(0, Ordering::Relaxed);
        self.ws_frames_sent.store(0, Ordering::Relaxed);
        self.ws_frames_dropped.store(0, Ordering::Relaxed);
        self.ws_frames_duplicated.store(0, Ordering::Relaxed);
    }

    /// Render all counters in Prometheus exposition format.
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP price_ticks_generated Total price ticks generated\n");
        output.push_str("# TYPE price_ticks_generated counter\n");
        output.push_str(&format!("price_ticks_generated {}\n\n", self.generated()));

        output.push_str("# HELP ws_frames_sent Total WebSocket frames sent\n");
        output.push_str("# TYPE ws_frames_sent counter\n");
        output.push_str(&format!("ws_frames_sent {}\n\n", self.sent()));

        output.push_str("# HELP ws_frames_dropped Total WebSocket frames dropped\n");
        output.push_str("# TYPE ws_frames_dropped counter\n");
        output.push_str(&format!("ws_frames_dropped {}\n\n", self.dropped()));

        output.push_str("# HELP ws_frames_duplicated Total WebSocket frames duplicated\n");
        output.push_str("# TYPE ws_frames_duplicated counter\n");
        output.push_str(&format!("ws_frames_duplicated {}\n\n", self.duplicated()));

        output
    }
}
