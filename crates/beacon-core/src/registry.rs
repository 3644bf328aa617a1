//! Room registry.
//!
//! The registry owns room identity and live membership. Rooms are created
//! implicitly on first reference and destroyed only by explicit teardown;
//! an emptied room stays registered until a peer tears it down. Rooms are
//! keyed in a sharded map so operations on unrelated rooms never contend.

use crate::event::PeerId;
use crate::room::{EventSender, Room, RoomId, RoomPhase, RoomSnapshot};
use dashmap::DashMap;
use tracing::{debug, info};

/// Registry statistics.
#[derive(Debug, Clone)]
pub struct RegistryStats {
    /// Number of registered rooms.
    pub room_count: usize,
    /// Total live memberships across all rooms.
    pub member_total: usize,
}

/// The room registry.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Rooms indexed by identifier.
    rooms: DashMap<RoomId, Room>,
}

impl RoomRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the room on first reference; return existing state otherwise.
    ///
    /// Idempotent and side-effect-free on repeat calls. A room caught in
    /// the middle of a teardown is replaced with a fresh one, so the
    /// returned state is always `Active`.
    pub fn ensure_room(&self, room_id: &str) -> RoomSnapshot {
        let mut entry = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                debug!(room = %room_id, "Creating room");
                Room::new(room_id)
            });

        if entry.phase() == RoomPhase::TornDown {
            *entry = Room::new(room_id);
        }

        entry.snapshot()
    }

    /// Look up a room without creating it.
    #[must_use]
    pub fn get_room(&self, room_id: &str) -> Option<RoomSnapshot> {
        self.rooms.get(room_id).map(|room| room.snapshot())
    }

    /// Check if a room is registered.
    #[must_use]
    pub fn room_exists(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Register a peer's outbound queue as a member of a room, creating
    /// the room if needed.
    pub fn insert_member(&self, room_id: &str, peer_id: impl Into<PeerId>, sender: EventSender) {
        let mut entry = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Room::new(room_id));

        if entry.phase() == RoomPhase::TornDown {
            *entry = Room::new(room_id);
        }

        entry.insert_member(peer_id, sender);
    }

    /// Remove a peer from a room.
    ///
    /// The room itself stays registered even when emptied; only teardown
    /// removes it.
    pub fn remove_member(&self, room_id: &str, peer_id: &str) -> bool {
        match self.rooms.get_mut(room_id) {
            Some(mut room) => room.remove_member(peer_id),
            None => false,
        }
    }

    /// Snapshot a room's member queues for a fan-out.
    ///
    /// Unknown rooms yield an empty list.
    #[must_use]
    pub fn member_senders(&self, room_id: &str) -> Vec<(PeerId, EventSender)> {
        self.rooms
            .get(room_id)
            .map(|room| room.member_senders())
            .unwrap_or_default()
    }

    /// Get the live member count of a room.
    #[must_use]
    pub fn member_count(&self, room_id: &str) -> usize {
        self.rooms
            .get(room_id)
            .map(|room| room.member_count())
            .unwrap_or(0)
    }

    /// Tear a room down: mark it terminal and drop it with all membership.
    ///
    /// Member queues are dropped with the room, closing each member's
    /// receiver. Idempotent - tearing down an unknown room is a no-op.
    /// Returns `true` if the room existed.
    pub fn teardown(&self, room_id: &str) -> bool {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.mark_torn_down();
        } else {
            return false;
        }

        let removed = self.rooms.remove(room_id).is_some();
        if removed {
            info!(room = %room_id, "Room torn down");
        }
        removed
    }

    /// Get all registered room identifiers.
    #[must_use]
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.iter().map(|room| room.key().clone()).collect()
    }

    /// Get registry statistics.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            room_count: self.rooms.len(),
            member_total: self.rooms.iter().map(|room| room.member_count()).sum(),
        }
    }
}
