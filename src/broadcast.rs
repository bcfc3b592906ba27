//! Fan-out of one tick to every connected subscriber.
//!
//! The tick is serialized exactly once per broadcast; duplicates re-use the
//! same bytes. A failing or lagging sink never aborts the pass and never
//! blocks the ticker - removal is the owning session's job when its own
//! socket dies.

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::snapshot::SnapshotStore;
use crate::subscribers::{Frame, SubscriberRegistry};
use crate::types::{PriceTick, WsMessage};

pub struct Broadcaster {
    registry: Arc<SubscriberRegistry>,
    snapshot: Arc<SnapshotStore>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SubscriberRegistry>, snapshot: Arc<SnapshotStore>) -> Self {
        Self { registry, snapshot }
    }

    /// Serialize `tick` once, record it as the latest snapshot, and deliver
    /// it to every currently-registered sink. Returns the frame so a
    /// duplicate decision can resend identical bytes.
    pub fn broadcast(&self, tick: &PriceTick) -> Frame {
        self.snapshot.put(tick.clone());
        let frame: Frame = WsMessage::price(tick).to_json().into();
        self.fan_out(&frame);
        frame
    }

    /// Resend a previously-serialized frame (the duplicate path).
    pub fn rebroadcast(&self, frame: &Frame) {
        self.fan_out(frame);
    }

    fn fan_out(&self, frame: &Frame) {
        for (sink_id, sink) in self.registry.snapshot() {
            match sink.try_send(frame.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(%sink_id, "subscriber queue full, dropping frame for this sink");
                }
                Err(TrySendError::Closed(_)) => {
                    // Session is tearing down; it removes itself.
                    debug!(%sink_id, "subscriber queue closed mid-broadcast");
                }
            }
        }
    }
}
