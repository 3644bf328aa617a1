//! Room signaling coordinator.
//!
//! The coordinator is the single entry point collaborators talk to. The
//! two delivery models the system grew - push (live fan-out, no storage)
//! and pull (durable store, polling) - are deliberately kept as two named
//! strategies behind this one interface rather than reconciled, so each
//! can be exercised and tested in isolation. Every submission is
//! structurally validated before it can touch any state.

use crate::event::SignalEvent;
use crate::lifecycle::LifecycleManager;
use crate::pull::PullCoordinator;
use crate::registry::{RegistryStats, RoomRegistry};
use crate::relay::{PushRelay, RelayConfig, RelayError};
use crate::room::RoomSnapshot;
use crate::store::{SignalStore, StoreError};
use beacon_protocol::{
    validate_candidate, validate_description, IceCandidate, SdpKind, SessionDescription,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Coordinator errors.
#[derive(Debug, Error)]
pub enum SignalingError {
    /// A description or candidate failed structural validation. Rejected
    /// before any state mutation.
    #[error("Invalid signaling payload: {0}")]
    InvalidPayload(&'static str),

    /// The durable backend failed; the payload was not stored.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A live-channel operation referenced an unconnected peer.
    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// The room signaling coordinator.
pub struct SignalingCoordinator {
    registry: Arc<RoomRegistry>,
    relay: PushRelay,
    store: Arc<dyn SignalStore>,
    pull: PullCoordinator,
    lifecycle: LifecycleManager,
}

impl SignalingCoordinator {
    /// Create a coordinator over a store with default relay settings.
    #[must_use]
    pub fn new(store: Arc<dyn SignalStore>) -> Self {
        Self::with_config(store, RelayConfig::default())
    }

    /// Create a coordinator with custom relay settings.
    #[must_use]
    pub fn with_config(store: Arc<dyn SignalStore>, relay_config: RelayConfig) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        Self {
            relay: PushRelay::with_config(registry.clone(), relay_config),
            pull: PullCoordinator::new(store.clone()),
            lifecycle: LifecycleManager::new(registry.clone(), store.clone()),
            registry,
            store,
        }
    }

    /// Create the room on first reference; return existing state otherwise.
    pub fn ensure_room(&self, room_id: &str) -> RoomSnapshot {
        self.registry.ensure_room(room_id)
    }

    /// Look up a room without creating it.
    #[must_use]
    pub fn get_room(&self, room_id: &str) -> Option<RoomSnapshot> {
        self.registry.get_room(room_id)
    }

    /// Registry statistics.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    // --- durable strategy ---------------------------------------------

    /// Durably store an offer as the room's new current offer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` for a malformed description, or `Store`
    /// if the backend write failed.
    pub async fn submit_offer(
        &self,
        room_id: &str,
        description: SessionDescription,
    ) -> Result<(), SignalingError> {
        validate_description(&description, SdpKind::Offer)
            .map_err(SignalingError::InvalidPayload)?;
        self.store.put_offer(room_id, description).await?;
        Ok(())
    }

    /// Durably store an answer as the room's new current answer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` for a malformed description, or `Store`
    /// if the backend write failed.
    pub async fn submit_answer(
        &self,
        room_id: &str,
        description: SessionDescription,
    ) -> Result<(), SignalingError> {
        validate_description(&description, SdpKind::Answer)
            .map_err(SignalingError::InvalidPayload)?;
        self.store.put_answer(room_id, description).await?;
        Ok(())
    }

    /// Durably append an ICE candidate.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` for a malformed candidate, or `Store` if
    /// the backend write failed.
    pub async fn submit_candidate(
        &self,
        room_id: &str,
        candidate: IceCandidate,
    ) -> Result<(), SignalingError> {
        validate_candidate(&candidate).map_err(SignalingError::InvalidPayload)?;
        self.store.append_candidate(room_id, candidate).await?;
        Ok(())
    }

    /// The single pending description for a polling peer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend read failed.
    pub async fn fetch_pending(
        &self,
        room_id: &str,
    ) -> Result<Option<SessionDescription>, StoreError> {
        self.pull.resolve_pending(room_id).await
    }

    /// All queued candidates for a polling peer, in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend read failed.
    pub async fn fetch_candidates(&self, room_id: &str) -> Result<Vec<IceCandidate>, StoreError> {
        self.pull.candidates(room_id).await
    }

    // --- live strategy ------------------------------------------------

    /// Register a peer's live channel; returns its inbound event stream.
    pub fn connect_peer(&self, peer_id: &str) -> mpsc::Receiver<Arc<SignalEvent>> {
        self.relay.connect(peer_id)
    }

    /// Enter a room on the live channel.
    ///
    /// # Errors
    ///
    /// Returns `Relay` if the peer has no live channel.
    pub fn join_room(&self, peer_id: &str, room_id: &str) -> Result<(), SignalingError> {
        self.relay.join(peer_id, room_id)?;
        Ok(())
    }

    /// Fan an offer out to the other members of a room. Returns the
    /// recipient count; zero means the message was dropped (no error).
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` for a malformed description.
    pub fn push_offer(
        &self,
        room_id: &str,
        description: SessionDescription,
        sender: &str,
    ) -> Result<usize, SignalingError> {
        validate_description(&description, SdpKind::Offer)
            .map_err(SignalingError::InvalidPayload)?;
        Ok(self.relay.relay_offer(room_id, description, sender))
    }

    /// Fan an answer out to the other members of a room.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` for a malformed description.
    pub fn push_answer(
        &self,
        room_id: &str,
        description: SessionDescription,
        sender: &str,
    ) -> Result<usize, SignalingError> {
        validate_description(&description, SdpKind::Answer)
            .map_err(SignalingError::InvalidPayload)?;
        Ok(self.relay.relay_answer(room_id, description, sender))
    }

    /// Fan an ICE candidate out to the other members of a room.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPayload` for a malformed candidate.
    pub fn push_candidate(
        &self,
        room_id: &str,
        candidate: IceCandidate,
        sender: &str,
    ) -> Result<usize, SignalingError> {
        validate_candidate(&candidate).map_err(SignalingError::InvalidPayload)?;
        Ok(self.relay.relay_candidate(room_id, candidate, sender))
    }

    /// Drop a peer from every room it joined. Prompt; called on
    /// transport-level disconnect.
    pub fn disconnect_peer(&self, peer_id: &str) {
        self.relay.leave(peer_id);
    }

    // --- lifecycle ----------------------------------------------------

    /// Tear a room down on both delivery paths. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the durable purge failed.
    pub async fn teardown(&self, room_id: &str) -> Result<(), StoreError> {
        self.lifecycle.teardown(room_id).await
    }
}
