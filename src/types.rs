//! Wire types shared by both feeds.
//!
//! Everything a subscriber or HTTP client sees is defined here: the price
//! tick, the subscription acknowledgement, and the snapshot envelope.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Which upstream this tick pretends to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Dex,
    Chainlink,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Dex => "dex",
            SourceKind::Chainlink => "chainlink",
        }
    }
}

/// A single published price observation.
///
/// `src_seq` advances once per *generated* tick, so dropped frames leave
/// visible gaps and duplicated frames share a value. `delay_ms` is the
/// simulated one-way delay; the frame itself is still sent immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Wall-clock milliseconds at generation.
    pub ts: u64,
    pub pair: String,
    pub price: f64,
    pub source: SourceKind,
    pub src_seq: u64,
    pub delay_ms: u32,
    /// True when the gap since the previous generated tick exceeded the
    /// configured staleness threshold.
    pub stale: bool,
}

/// Subscription acknowledgement sent once after a WS upgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionAck {
    pub id: String,
    pub status: String,
}

/// Outbound WebSocket frame. Tagged with `"type"` so browser clients can
/// dispatch without sniffing fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WsMessage {
    Price(PriceTick),
    Subscription(SubscriptionAck),
}

impl WsMessage {
    pub fn price(tick: &PriceTick) -> Self {
        WsMessage::Price(tick.clone())
    }

    pub fn subscription(feed_id: &str) -> Self {
        WsMessage::Subscription(SubscriptionAck {
            id: feed_id.to_string(),
            status: "subscribed".to_string(),
        })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to serialize ws frame");
            "{}".to_string()
        })
    }
}

/// Snapshot envelope returned by the HTTP snapshot endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub prices: Vec<PriceTick>,
    pub server_time: u64,
}

/// Wall-clock milliseconds since the Unix epoch. Used for the `ts` field of
/// published ticks; staleness and heartbeat math use monotonic time instead.
pub fn current_time_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tick() -> PriceTick {
        PriceTick {
            ts: 1234567890,
            pair: "ETH/USD".to_string(),
            price: 3500.50,
            source: SourceKind::Dex,
            src_seq: 42,
            delay_ms: 10,
            stale: false,
        }
    }

    #[test]
    fn price_tick_json_shape() {
        let json = serde_json::to_value(WsMessage::price(&sample_tick())).unwrap();
        assert_eq!(json["type"], "price");
        assert_eq!(json["ts"], 1234567890u64);
        assert_eq!(json["pair"], "ETH/USD");
        assert_eq!(json["source"], "dex");
        assert_eq!(json["src_seq"], 42);
        assert_eq!(json["delay_ms"], 10);
        assert_eq!(json["stale"], false);
    }

    #[test]
    fn price_tick_round_trip() {
        let tick = sample_tick();
        let json = serde_json::to_string(&tick).unwrap();
        let parsed: PriceTick = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tick);
    }

    #[test]
    fn chainlink_source_string() {
        let mut tick = sample_tick();
        tick.source = SourceKind::Chainlink;
        let json = WsMessage::price(&tick).to_json();
        assert!(json.contains("\"source\":\"chainlink\""));
    }

    #[test]
    fn subscription_ack_shape() {
        let json = WsMessage::subscription("oracle_prices").to_json();
        assert!(json.contains("\"type\":\"subscription\""));
        assert!(json.contains("\"id\":\"oracle_prices\""));
        assert!(json.contains("\"status\":\"subscribed\""));
    }

    #[test]
    fn current_time_advances() {
        let t1 = current_time_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let t2 = current_time_ms();
        assert!(t2 > t1);
    }
}
