//! Connected WebSocket subscribers.
//!
//! The registry maps a process-local sink id to the sending half of a bounded
//! per-sink queue. Session tasks register themselves on upgrade and remove
//! themselves when their socket dies; the broadcaster only ever sees a
//! snapshot of the current sinks, so no lock is held across network writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

/// Serialized frame shared between all sinks of one broadcast pass.
pub type Frame = Arc<str>;

/// Per-sink queue depth. A subscriber that falls this far behind starts
/// losing frames (drop-newest policy, warn-logged by the broadcaster).
pub const SINK_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(pub u64);

impl std::fmt::Display for SinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    sinks: RwLock<HashMap<SinkId, mpsc::Sender<Frame>>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber. Returns its id and the receiving half of
    /// its frame queue.
    pub fn add(&self) -> (SinkId, mpsc::Receiver<Frame>) {
        let id = SinkId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(SINK_QUEUE_CAPACITY);
        self.sinks.write().insert(id, tx);
        (id, rx)
    }

    pub fn remove(&self, id: SinkId) -> bool {
        self.sinks.write().remove(&id).is_some()
    }

    /// Clone the current sink set for one fan-out pass.
    pub fn snapshot(&self) -> Vec<(SinkId, mpsc::Sender<Frame>)> {
        self.sinks
            .read()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }
}
