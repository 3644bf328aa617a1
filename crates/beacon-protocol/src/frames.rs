//! Frame types for the Beacon live channel.
//!
//! A frame is one message on the persistent bidirectional channel between a
//! peer and the relay. Frames are serialized with MessagePack; the signaling
//! payloads inside them keep their browser-native field names.

use crate::signal::{IceCandidate, SessionDescription};
use serde::{Deserialize, Serialize};

/// Current live-channel protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Frame type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum FrameType {
    Join = 0x01,
    Offer = 0x02,
    Answer = 0x03,
    Candidate = 0x04,
    Ack = 0x05,
    Error = 0x06,
    Ping = 0x07,
    Pong = 0x08,
    Connect = 0x09,
    Connected = 0x0A,
}

impl From<FrameType> for u8 {
    fn from(ft: FrameType) -> u8 {
        ft as u8
    }
}

impl TryFrom<u8> for FrameType {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            0x01 => Ok(FrameType::Join),
            0x02 => Ok(FrameType::Offer),
            0x03 => Ok(FrameType::Answer),
            0x04 => Ok(FrameType::Candidate),
            0x05 => Ok(FrameType::Ack),
            0x06 => Ok(FrameType::Error),
            0x07 => Ok(FrameType::Ping),
            0x08 => Ok(FrameType::Pong),
            0x09 => Ok(FrameType::Connect),
            0x0A => Ok(FrameType::Connected),
            _ => Err("Invalid frame type"),
        }
    }
}

/// A live-channel frame.
///
/// `Join`, `Offer`, `Answer` and `Candidate` flow client-to-server; the
/// signaling frames also flow server-to-client when fanned out to the other
/// members of a room. The payload of a fanned-out frame is byte-identical to
/// what the sender submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Frame {
    /// Enter a room, becoming a fan-out target for it.
    #[serde(rename = "join")]
    Join {
        /// Request ID for acknowledgment.
        id: u64,
        /// Room to join.
        room: String,
    },

    /// A session offer for the other members of a room.
    #[serde(rename = "offer")]
    Offer {
        /// Target room.
        room: String,
        /// The offer payload.
        description: SessionDescription,
    },

    /// A session answer for the other members of a room.
    #[serde(rename = "answer")]
    Answer {
        /// Target room.
        room: String,
        /// The answer payload.
        description: SessionDescription,
    },

    /// An ICE candidate for the other members of a room.
    #[serde(rename = "ice-candidate")]
    Candidate {
        /// Target room.
        room: String,
        /// The candidate payload.
        candidate: IceCandidate,
    },

    /// Acknowledgment of a request.
    #[serde(rename = "ack")]
    Ack {
        /// ID of the acknowledged request.
        id: u64,
    },

    /// Error response.
    #[serde(rename = "error")]
    Error {
        /// ID of the failed request (0 if not applicable).
        id: u64,
        /// Error code.
        code: u16,
        /// Human-readable error message.
        message: String,
    },

    /// Keepalive ping.
    #[serde(rename = "ping")]
    Ping {
        /// Optional timestamp.
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<u64>,
    },

    /// Keepalive pong.
    #[serde(rename = "pong")]
    Pong {
        /// Echoed timestamp from ping.
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<u64>,
    },

    /// Initial connection handshake.
    #[serde(rename = "connect")]
    Connect {
        /// Protocol version.
        version: u8,
    },

    /// Connection established response.
    #[serde(rename = "connected")]
    Connected {
        /// Unique connection identifier.
        connection_id: String,
        /// Negotiated protocol version.
        version: u8,
        /// Recommended heartbeat interval in milliseconds.
        heartbeat: u32,
    },
}

impl Frame {
    /// Get the frame type.
    #[must_use]
    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::Join { .. } => FrameType::Join,
            Frame::Offer { .. } => FrameType::Offer,
            Frame::Answer { .. } => FrameType::Answer,
            Frame::Candidate { .. } => FrameType::Candidate,
            Frame::Ack { .. } => FrameType::Ack,
            Frame::Error { .. } => FrameType::Error,
            Frame::Ping { .. } => FrameType::Ping,
            Frame::Pong { .. } => FrameType::Pong,
            Frame::Connect { .. } => FrameType::Connect,
            Frame::Connected { .. } => FrameType::Connected,
        }
    }

    /// Create a new Join frame.
    #[must_use]
    pub fn join(id: u64, room: impl Into<String>) -> Self {
        Frame::Join {
            id,
            room: room.into(),
        }
    }

    /// Create a new Offer frame.
    #[must_use]
    pub fn offer(room: impl Into<String>, description: SessionDescription) -> Self {
        Frame::Offer {
            room: room.into(),
            description,
        }
    }

    /// Create a new Answer frame.
    #[must_use]
    pub fn answer(room: impl Into<String>, description: SessionDescription) -> Self {
        Frame::Answer {
            room: room.into(),
            description,
        }
    }

    /// Create a new Candidate frame.
    #[must_use]
    pub fn candidate(room: impl Into<String>, candidate: IceCandidate) -> Self {
        Frame::Candidate {
            room: room.into(),
            candidate,
        }
    }

    /// Create a new Ack frame.
    #[must_use]
    pub fn ack(id: u64) -> Self {
        Frame::Ack { id }
    }

    /// Create a new Error frame.
    #[must_use]
    pub fn error(id: u64, code: u16, message: impl Into<String>) -> Self {
        Frame::Error {
            id,
            code,
            message: message.into(),
        }
    }

    /// Create a new Ping frame.
    #[must_use]
    pub fn ping(timestamp: Option<u64>) -> Self {
        Frame::Ping { timestamp }
    }

    /// Create a new Pong frame.
    #[must_use]
    pub fn pong(timestamp: Option<u64>) -> Self {
        Frame::Pong { timestamp }
    }

    /// Create a new Connect frame.
    #[must_use]
    pub fn connect(version: u8) -> Self {
        Frame::Connect { version }
    }

    /// Create a new Connected frame.
    #[must_use]
    pub fn connected(connection_id: impl Into<String>, version: u8, heartbeat: u32) -> Self {
        Frame::Connected {
            connection_id: connection_id.into(),
            version,
            heartbeat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SessionDescription;

    #[test]
    fn test_frame_type() {
        let join = Frame::join(1, "abc12");
        assert_eq!(join.frame_type(), FrameType::Join);

        let offer = Frame::offer("abc12", SessionDescription::offer("v=0"));
        assert_eq!(offer.frame_type(), FrameType::Offer);

        let pong = Frame::pong(Some(7));
        assert_eq!(pong.frame_type(), FrameType::Pong);
    }

    #[test]
    fn test_frame_type_conversion() {
        for byte in 0x01..=0x0A_u8 {
            let ft = FrameType::try_from(byte).unwrap();
            assert_eq!(u8::from(ft), byte);
        }
        assert!(FrameType::try_from(0x0B).is_err());
        assert!(FrameType::try_from(0x00).is_err());
    }

    #[test]
    fn test_candidate_frame_wire_tag() {
        // The candidate frame keeps the original "ice-candidate" event name.
        let frame = Frame::candidate("abc12", crate::signal::IceCandidate::new("candidate:1"));
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "ice-candidate");
    }
}
