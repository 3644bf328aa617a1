//! In-memory store backend.

use super::{RoomRecords, SignalStore, StoreError};
use crate::room::RoomId;
use async_trait::async_trait;
use beacon_protocol::{IceCandidate, SessionDescription};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Keyed in-memory record store.
///
/// Records live in a sharded map, so writes to one room never stall
/// another. This backend cannot fail; it suits single-process deployments
/// and tests. Records do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: DashMap<RoomId, RoomRecords>,
    seq: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn put_offer(
        &self,
        room_id: &str,
        description: SessionDescription,
    ) -> Result<(), StoreError> {
        let seq = self.next_seq();
        self.rooms
            .entry(room_id.to_string())
            .or_default()
            .set_offer(description, seq);
        Ok(())
    }

    async fn put_answer(
        &self,
        room_id: &str,
        description: SessionDescription,
    ) -> Result<(), StoreError> {
        let seq = self.next_seq();
        self.rooms
            .entry(room_id.to_string())
            .or_default()
            .set_answer(description, seq);
        Ok(())
    }

    async fn append_candidate(
        &self,
        room_id: &str,
        candidate: IceCandidate,
    ) -> Result<(), StoreError> {
        let seq = self.next_seq();
        self.rooms
            .entry(room_id.to_string())
            .or_default()
            .push_candidate(candidate, seq);
        Ok(())
    }

    async fn offer(&self, room_id: &str) -> Result<Option<SessionDescription>, StoreError> {
        Ok(self.rooms.get(room_id).and_then(|records| {
            records
                .offer
                .as_ref()
                .map(|stamped| stamped.description.clone())
        }))
    }

    async fn answer(&self, room_id: &str) -> Result<Option<SessionDescription>, StoreError> {
        Ok(self.rooms.get(room_id).and_then(|records| {
            records
                .answer
                .as_ref()
                .map(|stamped| stamped.description.clone())
        }))
    }

    async fn candidates(&self, room_id: &str) -> Result<Vec<IceCandidate>, StoreError> {
        Ok(self
            .rooms
            .get(room_id)
            .map(|records| {
                records
                    .candidates
                    .iter()
                    .map(|stamped| stamped.candidate.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn clear_room(&self, room_id: &str) -> Result<(), StoreError> {
        if self.rooms.remove(room_id).is_some() {
            debug!(room = %room_id, "Cleared signaling records");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_offer_last_write_wins() {
        let store = MemoryStore::new();

        store
            .put_offer("r1", SessionDescription::offer("d1"))
            .await
            .unwrap();
        store
            .put_offer("r1", SessionDescription::offer("d2"))
            .await
            .unwrap();

        let current = store.current_description("r1").await.unwrap().unwrap();
        assert_eq!(current.sdp, "d2");
    }

    #[tokio::test]
    async fn test_candidates_accumulate_in_order() {
        let store = MemoryStore::new();

        for n in 0..4 {
            store
                .append_candidate("r1", IceCandidate::new(format!("candidate:{n}")))
                .await
                .unwrap();
        }
        // Duplicates are permitted; no dedup contract.
        store
            .append_candidate("r1", IceCandidate::new("candidate:0"))
            .await
            .unwrap();

        let candidates = store.candidates("r1").await.unwrap();
        assert_eq!(candidates.len(), 5);
        assert_eq!(candidates[0].candidate, "candidate:0");
        assert_eq!(candidates[3].candidate, "candidate:3");
        assert_eq!(candidates[4].candidate, "candidate:0");
    }

    #[tokio::test]
    async fn test_current_description_prefers_offer() {
        let store = MemoryStore::new();

        store
            .put_answer("r1", SessionDescription::answer("Y"))
            .await
            .unwrap();
        let current = store.current_description("r1").await.unwrap().unwrap();
        assert_eq!(current.kind, beacon_protocol::SdpKind::Answer);

        store
            .put_offer("r1", SessionDescription::offer("X"))
            .await
            .unwrap();
        let current = store.current_description("r1").await.unwrap().unwrap();
        assert_eq!(current.kind, beacon_protocol::SdpKind::Offer);
        assert_eq!(current.sdp, "X");
    }

    #[tokio::test]
    async fn test_clear_room_is_idempotent() {
        let store = MemoryStore::new();

        store
            .put_offer("r1", SessionDescription::offer("X"))
            .await
            .unwrap();
        store
            .append_candidate("r1", IceCandidate::new("candidate:1"))
            .await
            .unwrap();

        store.clear_room("r1").await.unwrap();
        assert!(store.current_description("r1").await.unwrap().is_none());
        assert!(store.candidates("r1").await.unwrap().is_empty());

        // Clearing an already-clear or unknown room succeeds silently.
        store.clear_room("r1").await.unwrap();
        store.clear_room("never-seen").await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_room_reads_as_empty() {
        let store = MemoryStore::new();
        assert!(store.offer("nope").await.unwrap().is_none());
        assert!(store.answer("nope").await.unwrap().is_none());
        assert!(store.candidates("nope").await.unwrap().is_empty());
    }
}
