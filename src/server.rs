//! HTTP/WS surface for a feed process.
//!
//! One axum router per feed: health, Prometheus metrics, the JSON snapshot,
//! the WebSocket upgrade, and (DEX only) the static viewer pages. Unknown
//! paths fall back to a plain-text 404. Every response carries the CORS
//! allow-origin header.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::debug;

use crate::metrics::FeedMetrics;
use crate::middleware::request_logging;
use crate::snapshot::SnapshotStore;
use crate::subscribers::SubscriberRegistry;
use crate::types::{current_time_ms, PriceSnapshot, WsMessage};

/// Shared state cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Feed id echoed in the subscription ack (`"dex_ticks"` / `"oracle_prices"`).
    pub feed_id: &'static str,
    pub metrics: Arc<FeedMetrics>,
    pub registry: Arc<SubscriberRegistry>,
    pub snapshot: Arc<SnapshotStore>,
    /// Directory for the static viewer pages; `None` disables them.
    pub static_dir: Option<PathBuf>,
}

/// Router for the DEX simulator.
pub fn dex_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/prices/snapshot", get(snapshot))
        .route("/ws/ticks", get(ws_upgrade))
        .route("/", get(static_page))
        .route("/index.html", get(static_page))
        .route("/dual.html", get(static_page))
        .route("/debug.html", get(static_page))
        .fallback(not_found)
        .layer(axum::middleware::from_fn(request_logging))
        .layer(cors)
        .with_state(state)
}

/// Router for the oracle simulator.
pub fn oracle_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/oracle/snapshot", get(snapshot))
        .route("/ws/prices", get(ws_upgrade))
        .fallback(not_found)
        .layer(axum::middleware::from_fn(request_logging))
        .layer(cors)
        .with_state(state)
}

/// Build the CORS layer from the configured origin list. A `"*"` entry (or an
/// empty list) allows everything.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn healthz() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.to_prometheus()
}

async fn snapshot(State(state): State<AppState>) -> Json<PriceSnapshot> {
    Json(state.snapshot.assemble(current_time_ms()))
}

async fn not_found(uri: Uri) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Not found: {}", uri))
}

/// Serve one of the bundled viewer pages from the static directory.
async fn static_page(State(state): State<AppState>, uri: Uri) -> Response {
    let name = match uri.path() {
        "/" | "/index.html" => "index.html",
        "/dual.html" => "dual.html",
        "/debug.html" => "debug.html",
        other => return not_found_response(other),
    };

    let Some(dir) = &state.static_dir else {
        return not_found_response(uri.path());
    };

    match tokio::fs::read_to_string(dir.join(name)).await {
        Ok(body) => Html(body).into_response(),
        Err(_) => not_found_response(uri.path()),
    }
}

fn not_found_response(target: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("Not found: {}", target)).into_response()
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_subscriber(socket, state))
}

/// One WS subscriber session. The sink is registered before the ack is sent;
/// clients must not rely on ordering between the ack and the first price
/// frame. Subscribers are receive-only: all inbound frames are discarded.
async fn handle_subscriber(mut socket: WebSocket, state: AppState) {
    let (sink_id, mut frames) = state.registry.add();
    debug!(%sink_id, feed = state.feed_id, "ws subscriber connected");

    let ack = WsMessage::subscription(state.feed_id).to_json();
    if socket.send(Message::Text(ack)).await.is_err() {
        state.registry.remove(sink_id);
        return;
    }

    loop {
        tokio::select! {
            frame = frames.recv() => {
                match frame {
                    Some(frame) => {
                        if socket.send(Message::Text(frame.to_string())).await.is_err() {
                            break;
                        }
                    }
                    // Registry side closed; nothing left to forward.
                    None => break,
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(%sink_id, error = %e, "ws read failed");
                        break;
                    }
                }
            }
        }
    }

    state.registry.remove(sink_id);
    debug!(%sink_id, feed = state.feed_id, "ws subscriber disconnected");
}
