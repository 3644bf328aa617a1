//! Room state for the push path.
//!
//! A room groups the peers that agreed on a shared identifier out-of-band.
//! Identifiers are opaque strings; no format constraint is enforced at this
//! layer - a caller that wants validation does it before reaching the
//! registry.

use crate::event::{PeerId, SignalEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::debug;

/// A room identifier.
pub type RoomId = String;

/// Outbound event queue of one live peer.
pub type EventSender = mpsc::Sender<Arc<SignalEvent>>;

/// Lifecycle phase of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// Default on first use.
    Active,
    /// Terminal. Re-ensuring the same identifier afterwards creates a
    /// fresh, logically unrelated room with empty state.
    TornDown,
}

/// A room and its live membership.
#[derive(Debug)]
pub struct Room {
    /// Room identifier.
    id: RoomId,
    /// Lifecycle phase.
    phase: RoomPhase,
    /// Outbound queues of the peers currently in the room.
    members: HashMap<PeerId, EventSender>,
    /// Wall-clock creation time in milliseconds.
    created_at: u64,
}

impl Room {
    /// Create a new active, empty room.
    #[must_use]
    pub fn new(id: impl Into<RoomId>) -> Self {
        Self {
            id: id.into(),
            phase: RoomPhase::Active,
            members: HashMap::new(),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        }
    }

    /// Get the room identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// Get the number of live members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Check whether a peer is currently a member.
    #[must_use]
    pub fn is_member(&self, peer_id: &str) -> bool {
        self.members.contains_key(peer_id)
    }

    /// Check whether the room has no live members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Register a peer's outbound queue as a member.
    ///
    /// Returns `false` if the peer was already a member (its queue is
    /// replaced either way).
    pub fn insert_member(&mut self, peer_id: impl Into<PeerId>, sender: EventSender) -> bool {
        let peer = peer_id.into();
        let inserted = self.members.insert(peer.clone(), sender).is_none();
        if inserted {
            debug!(room = %self.id, peer = %peer, "Peer joined room");
        }
        inserted
    }

    /// Remove a peer from the room.
    ///
    /// Returns `true` if the peer was a member.
    pub fn remove_member(&mut self, peer_id: &str) -> bool {
        let removed = self.members.remove(peer_id).is_some();
        if removed {
            debug!(room = %self.id, peer = %peer_id, "Peer left room");
        }
        removed
    }

    /// Snapshot the member queues for a fan-out.
    ///
    /// Senders are cheap clones; the room lock is not held during delivery.
    #[must_use]
    pub fn member_senders(&self) -> Vec<(PeerId, EventSender)> {
        self.members
            .iter()
            .map(|(peer, tx)| (peer.clone(), tx.clone()))
            .collect()
    }

    /// Mark the room torn down. Terminal.
    pub fn mark_torn_down(&mut self) {
        self.phase = RoomPhase::TornDown;
    }

    /// Wall-clock creation time in milliseconds.
    #[must_use]
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Take a snapshot of the room's state.
    #[must_use]
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id.clone(),
            phase: self.phase,
            member_count: self.members.len(),
            created_at: self.created_at,
        }
    }
}

/// A copyable view of a room's state, safe to hand out without holding
/// any registry lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    /// Room identifier.
    pub id: RoomId,
    /// Lifecycle phase at snapshot time.
    pub phase: RoomPhase,
    /// Live member count at snapshot time.
    pub member_count: usize,
    /// Wall-clock creation time in milliseconds.
    pub created_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn queue() -> EventSender {
        mpsc::channel(8).0
    }

    #[test]
    fn test_new_room_is_active_and_empty() {
        let room = Room::new("abc12");
        assert_eq!(room.id(), "abc12");
        assert_eq!(room.phase(), RoomPhase::Active);
        assert!(room.is_empty());
    }

    #[test]
    fn test_membership() {
        let mut room = Room::new("abc12");

        assert!(room.insert_member("peer-a", queue()));
        assert!(room.insert_member("peer-b", queue()));
        assert!(!room.insert_member("peer-a", queue())); // re-join replaces
        assert_eq!(room.member_count(), 2);
        assert!(room.is_member("peer-a"));

        assert!(room.remove_member("peer-a"));
        assert!(!room.remove_member("peer-a"));
        assert_eq!(room.member_count(), 1);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut room = Room::new("abc12");
        room.insert_member("peer-a", queue());
        room.mark_torn_down();

        let snapshot = room.snapshot();
        assert_eq!(snapshot.id, "abc12");
        assert_eq!(snapshot.phase, RoomPhase::TornDown);
        assert_eq!(snapshot.member_count, 1);
    }
}
