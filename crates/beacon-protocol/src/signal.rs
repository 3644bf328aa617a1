//! Signaling payload types.
//!
//! These mirror the browser's `RTCSessionDescriptionInit` and
//! `RTCIceCandidateInit` dictionaries, including their JSON field names, so
//! a payload can travel from one peer's media stack to the other's without
//! translation. Beacon never interprets the SDP body or the candidate line;
//! it only checks that the envelope is structurally sound before storing or
//! relaying it.

use serde::{Deserialize, Serialize};

/// Maximum accepted SDP body size.
pub const MAX_SDP_LENGTH: usize = 64 * 1024;

/// Maximum accepted ICE candidate line length.
pub const MAX_CANDIDATE_LENGTH: usize = 1024;

/// The two halves of a session-description exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    /// Proposes media/transport parameters.
    Offer,
    /// Accepts or counter-proposes them.
    Answer,
}

impl SdpKind {
    /// Lowercase name as it appears on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SdpKind::Offer => "offer",
            SdpKind::Answer => "answer",
        }
    }
}

impl std::fmt::Display for SdpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A WebRTC session description (offer or answer).
///
/// The embedded `type` field is the only type disambiguation a reader gets;
/// callers of a mixed read such as `fetch-pending` must inspect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// Whether this is an offer or an answer.
    #[serde(rename = "type")]
    pub kind: SdpKind,
    /// The SDP body, opaque to Beacon.
    pub sdp: String,
}

impl SessionDescription {
    /// Create a new session description.
    #[must_use]
    pub fn new(kind: SdpKind, sdp: impl Into<String>) -> Self {
        Self {
            kind,
            sdp: sdp.into(),
        }
    }

    /// Shorthand for an offer.
    #[must_use]
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self::new(SdpKind::Offer, sdp)
    }

    /// Shorthand for an answer.
    #[must_use]
    pub fn answer(sdp: impl Into<String>) -> Self {
        Self::new(SdpKind::Answer, sdp)
    }
}

/// One discovered network path a peer advertises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    /// The candidate line, opaque to Beacon.
    pub candidate: String,
    /// Media stream identification tag.
    #[serde(rename = "sdpMid", skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    /// Index of the media description this candidate belongs to.
    #[serde(rename = "sdpMLineIndex", skip_serializing_if = "Option::is_none")]
    pub sdp_mline_index: Option<u16>,
    /// ICE username fragment.
    #[serde(rename = "usernameFragment", skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    /// Create a candidate from just the candidate line.
    #[must_use]
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_mline_index: None,
            username_fragment: None,
        }
    }

    /// Attach a media stream identification tag.
    #[must_use]
    pub fn with_sdp_mid(mut self, mid: impl Into<String>) -> Self {
        self.sdp_mid = Some(mid.into());
        self
    }

    /// Attach a media line index.
    #[must_use]
    pub fn with_mline_index(mut self, index: u16) -> Self {
        self.sdp_mline_index = Some(index);
        self
    }
}

/// Validate a session description against the slot it is being submitted to.
///
/// Rejected payloads must not reach storage or the relay.
///
/// # Errors
///
/// Returns an error message if the description is structurally invalid.
pub fn validate_description(
    description: &SessionDescription,
    expected: SdpKind,
) -> Result<(), &'static str> {
    if description.kind != expected {
        return Err("description type does not match the submitted slot");
    }
    if description.sdp.is_empty() {
        return Err("SDP body cannot be empty");
    }
    if description.sdp.len() > MAX_SDP_LENGTH {
        return Err("SDP body too large");
    }
    Ok(())
}

/// Validate an ICE candidate.
///
/// End-of-candidates markers (empty candidate line) are not relayed;
/// clients only forward candidates that carry a line.
///
/// # Errors
///
/// Returns an error message if the candidate is structurally invalid.
pub fn validate_candidate(candidate: &IceCandidate) -> Result<(), &'static str> {
    if candidate.candidate.is_empty() {
        return Err("candidate line cannot be empty");
    }
    if candidate.candidate.len() > MAX_CANDIDATE_LENGTH {
        return Err("candidate line too large");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_json_shape() {
        let desc = SessionDescription::offer("v=0\r\n");
        let json = serde_json::to_value(&desc).unwrap();

        assert_eq!(json["type"], "offer");
        assert_eq!(json["sdp"], "v=0\r\n");
    }

    #[test]
    fn test_candidate_json_shape() {
        let cand = IceCandidate::new("candidate:1 1 udp 2122260223 192.0.2.1 54400 typ host")
            .with_sdp_mid("0")
            .with_mline_index(0);
        let json = serde_json::to_value(&cand).unwrap();

        assert_eq!(json["sdpMid"], "0");
        assert_eq!(json["sdpMLineIndex"], 0);
        assert!(json.get("usernameFragment").is_none());
    }

    #[test]
    fn test_candidate_roundtrip_from_browser_json() {
        let raw = r#"{"candidate":"candidate:2 1 tcp 1518280447 198.51.100.7 9 typ host","sdpMid":"audio","sdpMLineIndex":1}"#;
        let cand: IceCandidate = serde_json::from_str(raw).unwrap();

        assert_eq!(cand.sdp_mid.as_deref(), Some("audio"));
        assert_eq!(cand.sdp_mline_index, Some(1));
        assert!(cand.username_fragment.is_none());
    }

    #[test]
    fn test_validate_description() {
        let offer = SessionDescription::offer("v=0");
        assert!(validate_description(&offer, SdpKind::Offer).is_ok());
        assert!(validate_description(&offer, SdpKind::Answer).is_err());

        let empty = SessionDescription::offer("");
        assert!(validate_description(&empty, SdpKind::Offer).is_err());

        let oversized = SessionDescription::answer("a".repeat(MAX_SDP_LENGTH + 1));
        assert!(validate_description(&oversized, SdpKind::Answer).is_err());
    }

    #[test]
    fn test_validate_candidate() {
        assert!(validate_candidate(&IceCandidate::new("candidate:1 1 udp 1 h 1 typ host")).is_ok());
        assert!(validate_candidate(&IceCandidate::new("")).is_err());
        assert!(validate_candidate(&IceCandidate::new("c".repeat(MAX_CANDIDATE_LENGTH + 1))).is_err());
    }
}
