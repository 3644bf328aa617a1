//! Push relay.
//!
//! The relay owns the live peer connections and fans signaling events out
//! to the other members of a room with at-most-one-hop latency and no
//! storage. Delivery is fire-and-forget: no acknowledgement, no retry. A
//! room with no other member drops the message silently - a peer that is
//! not yet connected has no queue to receive into on this path.

use crate::event::{PeerId, SignalEvent, SignalPayload};
use crate::registry::RoomRegistry;
use crate::room::RoomId;
use beacon_protocol::{IceCandidate, SessionDescription};
use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Relay errors.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The peer has no registered live channel.
    #[error("Peer not connected: {0}")]
    NotConnected(String),
}

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Capacity of each peer's outbound event queue. A full queue drops
    /// further events for that recipient (logged, never retried).
    pub event_queue_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            event_queue_capacity: 64,
        }
    }
}

/// The push relay.
pub struct PushRelay {
    /// Shared room membership.
    registry: Arc<RoomRegistry>,
    /// Outbound queue of every connected peer.
    peers: DashMap<PeerId, mpsc::Sender<Arc<SignalEvent>>>,
    /// Rooms each peer has joined (peer id -> set of room ids).
    memberships: DashMap<PeerId, DashSet<RoomId>>,
    /// Configuration.
    config: RelayConfig,
}

impl PushRelay {
    /// Create a relay over a registry with default configuration.
    #[must_use]
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self::with_config(registry, RelayConfig::default())
    }

    /// Create a relay with custom configuration.
    #[must_use]
    pub fn with_config(registry: Arc<RoomRegistry>, config: RelayConfig) -> Self {
        Self {
            registry,
            peers: DashMap::new(),
            memberships: DashMap::new(),
            config,
        }
    }

    /// Number of connected peers.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Register a peer's live channel.
    ///
    /// Returns the receiving end of the peer's outbound event queue. A
    /// repeated registration under the same id replaces the previous
    /// queue, closing its receiver.
    pub fn connect(&self, peer_id: impl Into<PeerId>) -> mpsc::Receiver<Arc<SignalEvent>> {
        let peer = peer_id.into();
        let (tx, rx) = mpsc::channel(self.config.event_queue_capacity);

        debug!(peer = %peer, "Peer connected to relay");
        self.peers.insert(peer, tx);
        rx
    }

    /// Register a connected peer as a member of a room.
    ///
    /// A peer may join any number of rooms; the intended cardinality per
    /// room is two.
    ///
    /// # Errors
    ///
    /// Returns an error if the peer has no live channel.
    pub fn join(&self, peer_id: &str, room_id: &str) -> Result<(), RelayError> {
        let sender = self
            .peers
            .get(peer_id)
            .map(|tx| tx.clone())
            .ok_or_else(|| RelayError::NotConnected(peer_id.to_string()))?;

        self.registry.insert_member(room_id, peer_id, sender);
        self.memberships
            .entry(peer_id.to_string())
            .or_default()
            .insert(room_id.to_string());

        debug!(
            peer = %peer_id,
            room = %room_id,
            members = self.registry.member_count(room_id),
            "Joined"
        );
        Ok(())
    }

    /// Disconnect a peer: remove it from every room it joined and drop
    /// its queue.
    ///
    /// Triggered by transport-level disconnect detection, not by an
    /// explicit message.
    pub fn leave(&self, peer_id: &str) {
        if let Some((_, rooms)) = self.memberships.remove(peer_id) {
            for room in rooms.iter() {
                self.registry.remove_member(room.as_str(), peer_id);
            }
        }
        self.peers.remove(peer_id);
        debug!(peer = %peer_id, "Peer disconnected from relay");
    }

    /// Relay an offer to the other members of a room.
    ///
    /// Returns the number of recipients (zero is not an error).
    pub fn relay_offer(
        &self,
        room_id: &str,
        description: SessionDescription,
        sender: &str,
    ) -> usize {
        self.fan_out(SignalEvent::new(
            room_id,
            sender,
            SignalPayload::Offer(description),
        ))
    }

    /// Relay an answer to the other members of a room.
    pub fn relay_answer(
        &self,
        room_id: &str,
        description: SessionDescription,
        sender: &str,
    ) -> usize {
        self.fan_out(SignalEvent::new(
            room_id,
            sender,
            SignalPayload::Answer(description),
        ))
    }

    /// Relay an ICE candidate to the other members of a room.
    pub fn relay_candidate(&self, room_id: &str, candidate: IceCandidate, sender: &str) -> usize {
        self.fan_out(SignalEvent::new(
            room_id,
            sender,
            SignalPayload::Candidate(candidate),
        ))
    }

    /// Deliver an event to every member of its room except the sender.
    ///
    /// Per-recipient queues are FIFO, so events from one sender to one
    /// room arrive in submission order. Cross-sender ordering is not
    /// guaranteed. Delivery waits on nothing: a full or closed recipient
    /// queue drops the event for that recipient only.
    fn fan_out(&self, event: SignalEvent) -> usize {
        let recipients = self.registry.member_senders(&event.room);
        let event = Arc::new(event);
        let mut delivered = 0;

        for (peer, tx) in recipients {
            if peer == event.sender {
                continue;
            }
            match tx.try_send(Arc::clone(&event)) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        room = %event.room,
                        peer = %peer,
                        kind = event.payload.kind(),
                        "Recipient queue full, event dropped"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(
                        room = %event.room,
                        peer = %peer,
                        "Recipient channel closed, event dropped"
                    );
                }
            }
        }

        trace!(
            room = %event.room,
            kind = event.payload.kind(),
            recipients = delivered,
            "Relayed"
        );
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_protocol::SessionDescription;
    use tokio::sync::mpsc::Receiver;

    fn relay() -> PushRelay {
        PushRelay::new(Arc::new(RoomRegistry::new()))
    }

    fn drain(rx: &mut Receiver<Arc<SignalEvent>>) -> Vec<Arc<SignalEvent>> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn test_offer_reaches_other_member_only() {
        let relay = relay();

        let mut rx_a = relay.connect("peer-a");
        let mut rx_b = relay.connect("peer-b");
        let mut rx_c = relay.connect("peer-c");
        relay.join("peer-a", "abc12").unwrap();
        relay.join("peer-b", "abc12").unwrap();
        relay.join("peer-c", "xyz99").unwrap();

        let offer = SessionDescription::offer("X");
        let delivered = relay.relay_offer("abc12", offer.clone(), "peer-a");
        assert_eq!(delivered, 1);

        let received = drain(&mut rx_b);
        assert_eq!(received.len(), 1);
        assert_eq!(
            received[0].payload,
            SignalPayload::Offer(offer)
        );

        // The sender hears nothing back; the unrelated room hears nothing.
        assert!(drain(&mut rx_a).is_empty());
        assert!(drain(&mut rx_c).is_empty());
    }

    #[tokio::test]
    async fn test_relay_to_empty_room_drops_silently() {
        let relay = relay();

        let mut rx_a = relay.connect("peer-a");
        relay.join("peer-a", "abc12").unwrap();

        // No other member: the call succeeds and nothing is delivered.
        let delivered = relay.relay_offer("abc12", SessionDescription::offer("X"), "peer-a");
        assert_eq!(delivered, 0);

        // A later joiner sees nothing on the push path.
        let mut rx_b = relay.connect("peer-b");
        relay.join("peer-b", "abc12").unwrap();
        assert!(drain(&mut rx_a).is_empty());
        assert!(drain(&mut rx_b).is_empty());
    }

    #[tokio::test]
    async fn test_single_sender_events_arrive_in_order() {
        let relay = relay();

        relay.connect("peer-a");
        let mut rx_b = relay.connect("peer-b");
        relay.join("peer-a", "abc12").unwrap();
        relay.join("peer-b", "abc12").unwrap();

        relay.relay_offer("abc12", SessionDescription::offer("1"), "peer-a");
        for n in 2..=5 {
            relay.relay_candidate("abc12", IceCandidate::new(format!("candidate:{n}")), "peer-a");
        }

        let received = drain(&mut rx_b);
        assert_eq!(received.len(), 5);
        assert_eq!(received[0].payload.kind(), "offer");
        for (n, event) in received.iter().enumerate().skip(1) {
            match &event.payload {
                SignalPayload::Candidate(cand) => {
                    assert_eq!(cand.candidate, format!("candidate:{}", n + 1));
                }
                other => panic!("expected candidate, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_leave_removes_peer_from_all_rooms() {
        let relay = relay();

        relay.connect("peer-a");
        let mut rx_b = relay.connect("peer-b");
        relay.join("peer-a", "abc12").unwrap();
        relay.join("peer-b", "abc12").unwrap();
        relay.join("peer-b", "xyz99").unwrap();

        relay.leave("peer-b");
        assert_eq!(relay.peer_count(), 1);

        let delivered = relay.relay_offer("abc12", SessionDescription::offer("X"), "peer-a");
        assert_eq!(delivered, 0);
        assert!(drain(&mut rx_b).is_empty());
    }

    #[tokio::test]
    async fn test_join_requires_live_channel() {
        let relay = relay();
        assert!(matches!(
            relay.join("ghost", "abc12"),
            Err(RelayError::NotConnected(_))
        ));
    }

    #[tokio::test]
    async fn test_full_recipient_queue_drops_overflow() {
        let relay = PushRelay::with_config(
            Arc::new(RoomRegistry::new()),
            RelayConfig {
                event_queue_capacity: 1,
            },
        );

        relay.connect("peer-a");
        let mut rx_b = relay.connect("peer-b");
        relay.join("peer-a", "abc12").unwrap();
        relay.join("peer-b", "abc12").unwrap();

        // Second event overflows peer-b's queue and is dropped for it.
        assert_eq!(
            relay.relay_offer("abc12", SessionDescription::offer("1"), "peer-a"),
            1
        );
        assert_eq!(
            relay.relay_offer("abc12", SessionDescription::offer("2"), "peer-a"),
            0
        );

        assert_eq!(drain(&mut rx_b).len(), 1);
    }
}
