//! Durable signaling store.
//!
//! The pull path parks descriptions and candidates here so peers that are
//! not simultaneously online can still negotiate. Offer and answer are
//! single slots with last-write-wins semantics; candidates accumulate in
//! arrival order, duplicates permitted. A backend failure is reported as
//! [`StoreError::Unavailable`] and must reach the caller - a silently
//! dropped signaling payload manifests as an un-diagnosable stuck call.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use beacon_protocol::{IceCandidate, SessionDescription};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend failed a read or write.
    #[error("Signaling store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Wrap a backend failure.
    #[must_use]
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// A stored description with its supersession stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StampedDescription {
    pub description: SessionDescription,
    /// Monotonically increasing per store; resolves "latest".
    pub seq: u64,
}

/// A stored candidate with its arrival stamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StampedCandidate {
    pub candidate: IceCandidate,
    pub seq: u64,
}

/// All records of one room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct RoomRecords {
    /// The logically current offer, if any.
    pub offer: Option<StampedDescription>,
    /// The logically current answer, if any.
    pub answer: Option<StampedDescription>,
    /// Accumulated candidates in arrival order.
    pub candidates: Vec<StampedCandidate>,
}

impl RoomRecords {
    pub fn set_offer(&mut self, description: SessionDescription, seq: u64) {
        self.offer = Some(StampedDescription { description, seq });
    }

    pub fn set_answer(&mut self, description: SessionDescription, seq: u64) {
        self.answer = Some(StampedDescription { description, seq });
    }

    pub fn push_candidate(&mut self, candidate: IceCandidate, seq: u64) {
        self.candidates.push(StampedCandidate { candidate, seq });
    }
}

/// Storage interface for signaling records.
///
/// Implementations must guarantee that records are never mutated in place:
/// a new offer or answer supersedes the previous one wholesale, and
/// candidates only ever append.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Store the new current offer for a room, superseding any prior one.
    ///
    /// Last-write-wins; storing over an existing offer is not an error and
    /// no concurrency check is made.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend write failed.
    async fn put_offer(
        &self,
        room_id: &str,
        description: SessionDescription,
    ) -> Result<(), StoreError>;

    /// Store the new current answer for a room. Same contract as
    /// [`put_offer`](SignalStore::put_offer).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend write failed.
    async fn put_answer(
        &self,
        room_id: &str,
        description: SessionDescription,
    ) -> Result<(), StoreError>;

    /// Append a candidate record. Always inserts, never replaces.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend write failed.
    async fn append_candidate(
        &self,
        room_id: &str,
        candidate: IceCandidate,
    ) -> Result<(), StoreError>;

    /// Read the current offer for a room.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend read failed.
    async fn offer(&self, room_id: &str) -> Result<Option<SessionDescription>, StoreError>;

    /// Read the current answer for a room.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend read failed.
    async fn answer(&self, room_id: &str) -> Result<Option<SessionDescription>, StoreError>;

    /// Read all candidates for a room in arrival order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend read failed.
    async fn candidates(&self, room_id: &str) -> Result<Vec<IceCandidate>, StoreError>;

    /// Delete every record of a room.
    ///
    /// Idempotent: clearing an already-clear or unknown room succeeds
    /// silently.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the backend write failed.
    async fn clear_room(&self, room_id: &str) -> Result<(), StoreError>;

    /// The most recent offer or answer for a room, offer checked first.
    ///
    /// The caller inspects the returned payload's embedded `type` field to
    /// know which it received.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if a backend read failed.
    async fn current_description(
        &self,
        room_id: &str,
    ) -> Result<Option<SessionDescription>, StoreError> {
        if let Some(offer) = self.offer(room_id).await? {
            return Ok(Some(offer));
        }
        self.answer(room_id).await
    }
}
