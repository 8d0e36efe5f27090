//! Chat envelope carried over the bridge
//!
//! The bridge itself only moves opaque text frames; the surrounding glue
//! layers this JSON envelope with a `type` discriminator on top. Malformed
//! envelopes are logged and dropped, never propagated.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::Result;

/// JSON envelope exchanged with the far side of the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum BridgeEnvelope {
    #[serde(rename = "chat", rename_all = "camelCase")]
    Chat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chat_user: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chat_message: Option<String>,
    },
}

impl BridgeEnvelope {
    /// Build a chat envelope.
    pub fn chat(user: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeEnvelope::Chat {
            chat_user: Some(user.into()),
            chat_message: Some(message.into()),
        }
    }

    /// Encode to the wire representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Tolerant parse: malformed or unknown envelopes return `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                warn!(error = %e, "Could not parse bridge envelope");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_envelope_wire_shape() {
        let envelope = BridgeEnvelope::chat("alice", "hello there");
        let json = envelope.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"type":"chat","chatUser":"alice","chatMessage":"hello there"}"#
        );
    }

    #[test]
    fn test_parse_round_trip() {
        let raw = r#"{"type":"chat","chatUser":"bob","chatMessage":"ping"}"#;
        let envelope = BridgeEnvelope::parse(raw).unwrap();
        assert_eq!(envelope, BridgeEnvelope::chat("bob", "ping"));
    }

    #[test]
    fn test_parse_tolerates_missing_fields() {
        let envelope = BridgeEnvelope::parse(r#"{"type":"chat"}"#).unwrap();
        let BridgeEnvelope::Chat {
            chat_user,
            chat_message,
        } = envelope;
        assert!(chat_user.is_none());
        assert!(chat_message.is_none());
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(BridgeEnvelope::parse("not json at all").is_none());
        assert!(BridgeEnvelope::parse(r#"{"type":"unknown"}"#).is_none());
        assert!(BridgeEnvelope::parse("").is_none());
    }
}
