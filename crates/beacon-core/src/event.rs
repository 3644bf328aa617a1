//! Signaling events on the push path.
//!
//! An event is one signaling message in flight from a sender to the other
//! members of a room. Events are wrapped in `Arc` so a single fan-out never
//! copies the payload per recipient.

use crate::room::RoomId;
use beacon_protocol::{IceCandidate, SessionDescription};
use std::time::{SystemTime, UNIX_EPOCH};

/// A peer's live-channel identifier.
pub type PeerId = String;

/// The payload of a signaling event.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalPayload {
    /// A session offer.
    Offer(SessionDescription),
    /// A session answer.
    Answer(SessionDescription),
    /// One ICE candidate.
    Candidate(IceCandidate),
}

impl SignalPayload {
    /// Payload kind label, for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SignalPayload::Offer(_) => "offer",
            SignalPayload::Answer(_) => "answer",
            SignalPayload::Candidate(_) => "candidate",
        }
    }
}

/// A signaling event addressed to the other members of a room.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalEvent {
    /// The room the event is scoped to.
    pub room: RoomId,
    /// The peer that submitted it (excluded from delivery).
    pub sender: PeerId,
    /// The signaling payload, verbatim.
    pub payload: SignalPayload,
    /// Wall-clock creation time in milliseconds.
    pub timestamp: u64,
}

impl SignalEvent {
    /// Create a new event.
    #[must_use]
    pub fn new(room: impl Into<RoomId>, sender: impl Into<PeerId>, payload: SignalPayload) -> Self {
        Self {
            room: room.into(),
            sender: sender.into(),
            payload,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_protocol::SessionDescription;

    #[test]
    fn test_payload_kind() {
        let offer = SignalPayload::Offer(SessionDescription::offer("v=0"));
        assert_eq!(offer.kind(), "offer");

        let candidate = SignalPayload::Candidate(IceCandidate::new("candidate:1"));
        assert_eq!(candidate.kind(), "candidate");
    }

    #[test]
    fn test_event_carries_sender_and_room() {
        let event = SignalEvent::new(
            "abc12",
            "peer-a",
            SignalPayload::Answer(SessionDescription::answer("v=0")),
        );
        assert_eq!(event.room, "abc12");
        assert_eq!(event.sender, "peer-a");
        assert_eq!(event.payload.kind(), "answer");
    }
}
