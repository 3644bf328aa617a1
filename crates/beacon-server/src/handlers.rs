//! HTTP surface for Beacon.
//!
//! The REST routes are the pull path: submissions land in the durable
//! store and peers poll for the pending description and queued candidates.
//! Request and response bodies use the field names browser clients send
//! (`roomId`, `{success: true}`, `{description: null}`). The WebSocket
//! route is the push path, handled in [`crate::ws`].

use crate::config::{Config, StorageBackend};
use crate::metrics;
use crate::ws;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use beacon_core::{
    FileStore, MemoryStore, RelayConfig, SignalStore, SignalingCoordinator, SignalingError,
    StoreError,
};
use beacon_protocol::{IceCandidate, SessionDescription};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Shared server state.
pub struct AppState {
    /// The signaling coordinator.
    pub coordinator: SignalingCoordinator,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Create new app state, wiring the configured store backend.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let store: Arc<dyn SignalStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::File => {
                info!(path = %config.storage.path, "Using file store");
                Arc::new(FileStore::new(&config.storage.path))
            }
        };

        let relay_config = RelayConfig {
            event_queue_capacity: config.limits.event_queue_capacity,
        };

        Self {
            coordinator: SignalingCoordinator::with_config(store, relay_config),
            config,
        }
    }
}

/// Run the HTTP/WebSocket server.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config.clone()));

    // Start metrics server if enabled
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            warn!("Failed to start metrics server: {}", e);
        }
    }

    let app = Router::new()
        .route("/api/signaling/offer", post(submit_offer))
        .route("/api/signaling/answer", post(submit_answer))
        .route("/api/signaling/ice-candidate", post(submit_candidate))
        .route("/api/signaling/description", get(fetch_description))
        .route("/api/signaling/candidates", get(fetch_candidates))
        .route("/api/signaling/cleanup", post(cleanup_room))
        .route("/health", get(health_handler))
        .route(&config.live.websocket_path, get(ws::ws_handler))
        .with_state(state);

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Beacon server listening on {}", addr);
    info!(
        "Live channel endpoint: ws://{}{}",
        addr, config.live.websocket_path
    );

    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfferRequest {
    room_id: String,
    offer: SessionDescription,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnswerRequest {
    room_id: String,
    answer: SessionDescription,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateRequest {
    room_id: String,
    candidate: IceCandidate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomRequest {
    room_id: String,
}

#[derive(Debug, Deserialize)]
struct RoomQuery {
    #[serde(rename = "roomId")]
    room_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
struct DescriptionResponse {
    description: Option<SessionDescription>,
}

#[derive(Debug, Serialize)]
struct CandidatesResponse {
    candidates: Vec<IceCandidate>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn success() -> Response {
    Json(SuccessResponse { success: true }).into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// A failed store operation surfaces as an explicit 503, never a
/// generic success - a silently lost payload is an un-diagnosable
/// stuck call for the peers.
fn store_error_response(err: &StoreError) -> Response {
    metrics::record_store_error();
    warn!(error = %err, "Durable signaling operation failed");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn signaling_error_response(err: &SignalingError) -> Response {
    match err {
        SignalingError::InvalidPayload(reason) => bad_request(*reason),
        SignalingError::Store(store_err) => store_error_response(store_err),
        SignalingError::Relay(relay_err) => bad_request(relay_err.to_string()),
    }
}

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn submit_offer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OfferRequest>,
) -> Response {
    match state
        .coordinator
        .submit_offer(&request.room_id, request.offer)
        .await
    {
        Ok(()) => {
            metrics::record_signal("offer", "pull");
            success()
        }
        Err(err) => signaling_error_response(&err),
    }
}

async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnswerRequest>,
) -> Response {
    match state
        .coordinator
        .submit_answer(&request.room_id, request.answer)
        .await
    {
        Ok(()) => {
            metrics::record_signal("answer", "pull");
            success()
        }
        Err(err) => signaling_error_response(&err),
    }
}

async fn submit_candidate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CandidateRequest>,
) -> Response {
    match state
        .coordinator
        .submit_candidate(&request.room_id, request.candidate)
        .await
    {
        Ok(()) => {
            metrics::record_signal("candidate", "pull");
            success()
        }
        Err(err) => signaling_error_response(&err),
    }
}

async fn fetch_description(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomQuery>,
) -> Response {
    let Some(room_id) = query.room_id else {
        return bad_request("Room ID is required");
    };

    match state.coordinator.fetch_pending(&room_id).await {
        Ok(description) => Json(DescriptionResponse { description }).into_response(),
        Err(err) => store_error_response(&err),
    }
}

async fn fetch_candidates(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomQuery>,
) -> Response {
    let Some(room_id) = query.room_id else {
        return bad_request("Room ID is required");
    };

    match state.coordinator.fetch_candidates(&room_id).await {
        Ok(candidates) => Json(CandidatesResponse { candidates }).into_response(),
        Err(err) => store_error_response(&err),
    }
}

async fn cleanup_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RoomRequest>,
) -> Response {
    match state.coordinator.teardown(&request.room_id).await {
        Ok(()) => {
            metrics::record_teardown();
            metrics::set_rooms_active(state.coordinator.stats().room_count);
            success()
        }
        Err(err) => store_error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shapes_match_browser_payloads() {
        let offer: OfferRequest = serde_json::from_str(
            r#"{"roomId":"r1","offer":{"type":"offer","sdp":"v=0"}}"#,
        )
        .unwrap();
        assert_eq!(offer.room_id, "r1");
        assert_eq!(offer.offer.sdp, "v=0");

        let candidate: CandidateRequest = serde_json::from_str(
            r#"{"roomId":"r1","candidate":{"candidate":"candidate:1","sdpMid":"0","sdpMLineIndex":0}}"#,
        )
        .unwrap();
        assert_eq!(candidate.candidate.sdp_mid.as_deref(), Some("0"));
    }

    #[test]
    fn test_empty_description_serializes_as_null() {
        let body = serde_json::to_string(&DescriptionResponse { description: None }).unwrap();
        assert_eq!(body, r#"{"description":null}"#);
    }
}
