//! Pull coordinator.
//!
//! Resolves "what should I process next" for a peer whose only access is
//! room-keyed polling. Resolution is single-slot: at most one description
//! per poll, offer taking precedence over answer, regardless of how many
//! candidates are queued. Candidates are drained through a separate
//! accumulation read - the two retrievals are deliberately not unified.

use crate::store::{SignalStore, StoreError};
use beacon_protocol::{IceCandidate, SessionDescription};
use std::sync::Arc;

/// The pull-path resolver.
#[derive(Clone)]
pub struct PullCoordinator {
    store: Arc<dyn SignalStore>,
}

impl PullCoordinator {
    /// Create a coordinator over a store.
    #[must_use]
    pub fn new(store: Arc<dyn SignalStore>) -> Self {
        Self { store }
    }

    /// The single pending description for a room, or `None`.
    ///
    /// Checks the current offer first; only if no offer exists does the
    /// current answer surface. The caller tells the two apart by the
    /// payload's embedded `type` field. An unknown room is "no data yet",
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend read failed.
    pub async fn resolve_pending(
        &self,
        room_id: &str,
    ) -> Result<Option<SessionDescription>, StoreError> {
        if let Some(offer) = self.store.offer(room_id).await? {
            return Ok(Some(offer));
        }
        self.store.answer(room_id).await
    }

    /// All queued candidates for a room, in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend read failed.
    pub async fn candidates(&self, room_id: &str) -> Result<Vec<IceCandidate>, StoreError> {
        self.store.candidates(room_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use beacon_protocol::SdpKind;

    fn coordinator() -> (PullCoordinator, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (PullCoordinator::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_offer_wins_over_later_answer() {
        let (pull, store) = coordinator();

        store
            .put_offer("r1", SessionDescription::offer("X"))
            .await
            .unwrap();
        let pending = pull.resolve_pending("r1").await.unwrap().unwrap();
        assert_eq!(pending.kind, SdpKind::Offer);
        assert_eq!(pending.sdp, "X");

        // An answer arriving afterwards does not displace the offer.
        store
            .put_answer("r1", SessionDescription::answer("Y"))
            .await
            .unwrap();
        let pending = pull.resolve_pending("r1").await.unwrap().unwrap();
        assert_eq!(pending.kind, SdpKind::Offer);
        assert_eq!(pending.sdp, "X");
    }

    #[tokio::test]
    async fn test_answer_surfaces_without_offer() {
        let (pull, store) = coordinator();

        store
            .put_answer("r1", SessionDescription::answer("Y"))
            .await
            .unwrap();
        let pending = pull.resolve_pending("r1").await.unwrap().unwrap();
        assert_eq!(pending.kind, SdpKind::Answer);
    }

    #[tokio::test]
    async fn test_unknown_room_is_none_not_error() {
        let (pull, _) = coordinator();
        assert!(pull.resolve_pending("never-seen").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_candidates_are_a_separate_read() {
        let (pull, store) = coordinator();

        store
            .append_candidate("r1", IceCandidate::new("candidate:1"))
            .await
            .unwrap();

        // Queued candidates never surface through the description poll.
        assert!(pull.resolve_pending("r1").await.unwrap().is_none());
        assert_eq!(pull.candidates("r1").await.unwrap().len(), 1);
    }
}
