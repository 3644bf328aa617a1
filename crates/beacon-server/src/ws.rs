//! Live-channel handler.
//!
//! One WebSocket per peer. Inbound frames are decoded from a streaming
//! buffer and routed into the push relay; events fanned out by the other
//! members of the peer's rooms flow back out over the same socket. When
//! the transport drops, the peer is promptly removed from every room it
//! joined - there is no explicit leave frame.

use crate::handlers::AppState;
use crate::metrics::{self, ConnectionMetricsGuard};
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use beacon_core::{SignalEvent, SignalPayload};
use beacon_protocol::{codec, Frame, PROTOCOL_VERSION};
use bytes::BytesMut;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let max_message_size = state.config.limits.max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle one peer's live channel.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let _metrics_guard = ConnectionMetricsGuard::new();

    let peer_id = format!(
        "peer_{:x}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    );

    debug!(peer = %peer_id, "Live channel connected");

    let (mut sender, mut receiver) = socket.split();

    // The peer's outbound event queue; fan-outs from room members land here.
    let mut events = state.coordinator.connect_peer(&peer_id);

    let connected = Frame::connected(
        &peer_id,
        PROTOCOL_VERSION,
        state.config.live.heartbeat_ms as u32,
    );
    if send_frame(&mut sender, &connected).await.is_err() {
        state.coordinator.disconnect_peer(&peer_id);
        return;
    }

    // Read buffer for partial frames
    let mut read_buffer = BytesMut::with_capacity(4096);

    loop {
        tokio::select! {
            biased;

            // Events relayed from the other members of this peer's rooms
            Some(event) = events.recv() => {
                let frame = frame_for_event(&event);
                if send_frame(&mut sender, &frame).await.is_err() {
                    break;
                }
            }

            // Frames from the peer itself
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        let start = Instant::now();
                        read_buffer.extend_from_slice(&data);

                        loop {
                            match codec::decode_from(&mut read_buffer) {
                                Ok(Some(frame)) => {
                                    if let Err(e) = handle_frame(&frame, &peer_id, &state, &mut sender).await {
                                        warn!(peer = %peer_id, error = %e, "Frame handling error");
                                    }
                                }
                                Ok(None) => break,
                                Err(e) => {
                                    warn!(peer = %peer_id, error = %e, "Undecodable frame, resetting buffer");
                                    let _ = send_frame(&mut sender, &Frame::error(0, 1001, e.to_string())).await;
                                    read_buffer.clear();
                                    break;
                                }
                            }
                        }

                        metrics::record_latency(start.elapsed().as_secs_f64());
                    }
                    Some(Ok(Message::Text(_))) => {
                        // The live channel is binary-only.
                        debug!(peer = %peer_id, "Ignoring text message");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        // Ignore pongs
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!(peer = %peer_id, "Received close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(peer = %peer_id, error = %e, "WebSocket error");
                        break;
                    }
                    None => {
                        debug!(peer = %peer_id, "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    // Transport-level disconnect: drop the peer from every room it joined.
    state.coordinator.disconnect_peer(&peer_id);
    metrics::set_rooms_active(state.coordinator.stats().room_count);

    debug!(peer = %peer_id, "Live channel disconnected");
}

/// Handle a decoded frame from the peer.
async fn handle_frame(
    frame: &Frame,
    peer_id: &str,
    state: &Arc<AppState>,
    sender: &mut futures_util::stream::SplitSink<WebSocket, Message>,
) -> Result<()> {
    match frame {
        Frame::Join { id, room } => {
            debug!(peer = %peer_id, room = %room, "Join request");

            let response = match state.coordinator.join_room(peer_id, room) {
                Ok(()) => {
                    metrics::set_rooms_active(state.coordinator.stats().room_count);
                    Frame::ack(*id)
                }
                Err(e) => {
                    warn!(peer = %peer_id, error = %e, "Join failed");
                    Frame::error(*id, 1003, e.to_string())
                }
            };

            send_frame(sender, &response).await?;
        }

        Frame::Offer { room, description } => {
            match state
                .coordinator
                .push_offer(room, description.clone(), peer_id)
            {
                Ok(recipients) => {
                    metrics::record_signal("offer", "push");
                    metrics::record_relay_result(recipients);
                    debug!(peer = %peer_id, room = %room, recipients, "Offer relayed");
                }
                Err(e) => {
                    send_frame(sender, &Frame::error(0, 1002, e.to_string())).await?;
                }
            }
        }

        Frame::Answer { room, description } => {
            match state
                .coordinator
                .push_answer(room, description.clone(), peer_id)
            {
                Ok(recipients) => {
                    metrics::record_signal("answer", "push");
                    metrics::record_relay_result(recipients);
                    debug!(peer = %peer_id, room = %room, recipients, "Answer relayed");
                }
                Err(e) => {
                    send_frame(sender, &Frame::error(0, 1002, e.to_string())).await?;
                }
            }
        }

        Frame::Candidate { room, candidate } => {
            match state
                .coordinator
                .push_candidate(room, candidate.clone(), peer_id)
            {
                Ok(recipients) => {
                    metrics::record_signal("candidate", "push");
                    metrics::record_relay_result(recipients);
                }
                Err(e) => {
                    send_frame(sender, &Frame::error(0, 1002, e.to_string())).await?;
                }
            }
        }

        Frame::Ping { timestamp } => {
            send_frame(sender, &Frame::pong(*timestamp)).await?;
        }

        Frame::Pong { .. } => {
            // Keepalive response, nothing to do
        }

        Frame::Connect { version } => {
            debug!(peer = %peer_id, version, "Connect frame (already connected)");
        }

        _ => {
            warn!(peer = %peer_id, frame_type = ?frame.frame_type(), "Unexpected frame type");
        }
    }

    Ok(())
}

/// Build the outbound frame for a relayed event.
fn frame_for_event(event: &SignalEvent) -> Frame {
    match &event.payload {
        SignalPayload::Offer(description) => Frame::offer(event.room.as_str(), description.clone()),
        SignalPayload::Answer(description) => Frame::answer(event.room.as_str(), description.clone()),
        SignalPayload::Candidate(candidate) => {
            Frame::candidate(event.room.as_str(), candidate.clone())
        }
    }
}

/// Encode and send a frame to the peer.
async fn send_frame(
    sender: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    frame: &Frame,
) -> Result<()> {
    let data = codec::encode(frame)?;
    sender.send(Message::Binary(data.to_vec())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_protocol::SessionDescription;

    #[test]
    fn test_frame_for_event_preserves_payload() {
        let event = SignalEvent::new(
            "abc12",
            "peer-a",
            SignalPayload::Offer(SessionDescription::offer("X")),
        );

        match frame_for_event(&event) {
            Frame::Offer { room, description } => {
                assert_eq!(room, "abc12");
                assert_eq!(description.sdp, "X");
            }
            other => panic!("expected offer frame, got {:?}", other),
        }
    }
}
