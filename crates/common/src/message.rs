use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One logical unit of work: deliver one text payload to one recipient on
/// one instance. Immutable once enqueued except for `attempts`.
///
/// Unknown fields survive a decode/re-encode round trip via `extras`, so a
/// worker built against an older version of this struct never drops fields
/// a newer producer attached. See [`OutboundMessage::from_json`] /
/// [`OutboundMessage::to_json`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub message_id: String,
    pub instance: String,
    pub to: String,
    pub text: String,
    pub queued_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, flatten)]
    pub extras: HashMap<String, serde_json::Value>,
}

impl OutboundMessage {
    pub fn new(message_id: impl Into<String>, instance: impl Into<String>, to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            instance: instance.into(),
            to: to.into(),
            text: text.into(),
            queued_at: chrono::Utc::now(),
            attempts: 0,
            extras: HashMap::new(),
        }
    }

    /// Parse a raw stream payload, preserving unrecognized fields.
    ///
    /// `serde(flatten)` into a `HashMap` already keeps unknown keys, but we
    /// parse through `serde_json::Value` first so a malformed payload (the
    /// "parse_error" DLQ path in the worker) is detected before we commit
    /// to any particular struct shape.
    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// A fresh append for the retry path: bumps `attempts`, keeps everything
    /// else (including `extras`) untouched.
    pub fn with_incremented_attempts(&self) -> Self {
        let mut next = self.clone();
        next.attempts += 1;
        next
    }
}

/// Normalized shape of an inbound gateway event, handed off to the
/// inbound-processing queue. The AI pipeline that consumes this is out of
/// scope; this struct is the contract boundary with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub from: String,
    pub text: Option<String>,
    pub instance: String,
    pub gateway_message_id: String,
    pub received_at: chrono::DateTime<chrono::Utc>,
}

/// A queue entry that exhausted its retry budget, retained for operator
/// inspection. Never automatically reprocessed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    #[serde(flatten)]
    pub message: OutboundMessage,
    pub final_error: String,
    pub dead_lettered_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_unknown_fields_through_extras() {
        let raw = br#"{
            "message_id": "m1",
            "instance": "inst-a",
            "to": "+15551230000",
            "text": "hi",
            "queued_at": "2026-01-01T00:00:00Z",
            "attempts": 0,
            "campaign_id": "spring-promo"
        }"#;

        let msg = OutboundMessage::from_json(raw).expect("should parse");
        assert_eq!(msg.extras.get("campaign_id").unwrap(), "spring-promo");

        let retried = msg.with_incremented_attempts();
        assert_eq!(retried.attempts, 1);
        let reencoded = retried.to_json().unwrap();
        let reparsed = OutboundMessage::from_json(&reencoded).unwrap();
        assert_eq!(reparsed.extras.get("campaign_id").unwrap(), "spring-promo");
    }

    #[test]
    fn rejects_malformed_payload() {
        let raw = b"{ not json";
        assert!(OutboundMessage::from_json(raw).is_err());
    }
}
