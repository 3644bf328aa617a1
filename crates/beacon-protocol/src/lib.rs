//! # beacon-protocol
//!
//! Wire protocol for the Beacon signaling relay.
//!
//! This crate defines the payload types exchanged during WebRTC session
//! negotiation, the frames of the live channel, and the binary codec used
//! on that channel.
//!
//! ## Contents
//!
//! - `SessionDescription` / `IceCandidate` - signaling payloads, opaque to
//!   the relay, with browser-native JSON field names
//! - `Frame` - live-channel messages (`Join`, `Offer`, `Answer`,
//!   `Candidate`, plus handshake and keepalive)
//! - `codec` - length-prefixed MessagePack framing
//!
//! ## Example
//!
//! ```rust
//! use beacon_protocol::{codec, Frame, SessionDescription};
//!
//! let frame = Frame::offer("abc12", SessionDescription::offer("v=0"));
//!
//! let encoded = codec::encode(&frame).unwrap();
//! let decoded = codec::decode(&encoded).unwrap();
//! ```

pub mod codec;
pub mod frames;
pub mod signal;

pub use codec::{decode, encode, ProtocolError};
pub use frames::{Frame, FrameType, PROTOCOL_VERSION};
pub use signal::{
    validate_candidate, validate_description, IceCandidate, SdpKind, SessionDescription,
};
