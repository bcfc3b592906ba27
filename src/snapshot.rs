//! Last-published-tick store backing the HTTP snapshot endpoints.
//!
//! One writer (the broadcaster), many readers (HTTP handlers). parking_lot
//! keeps the critical sections cheap.

use parking_lot::RwLock;

use crate::types::{PriceSnapshot, PriceTick};

#[derive(Debug, Default)]
pub struct SnapshotStore {
    last_tick: RwLock<Option<PriceTick>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, tick: PriceTick) {
        *self.last_tick.write() = Some(tick);
    }

    pub fn get(&self) -> Option<PriceTick> {
        self.last_tick.read().clone()
    }

    /// Assemble the snapshot envelope: zero or one tick plus the server time.
    pub fn assemble(&self, server_time: u64) -> PriceSnapshot {
        PriceSnapshot {
            prices: self.get().into_iter().collect(),
            server_time,
        }
    }
}
