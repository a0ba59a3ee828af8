use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::Document;

/// The `participantNames` field as it actually arrives from the store.
///
/// Production data carries three encodings of the same logical pair: a proper
/// array of strings, a single JSON-encoded string, and an array whose first
/// element is itself JSON-encoded. Anything else lands in `Other` and is
/// treated as unresolvable. This raw shape never propagates past
/// [`normalize_roster`](crate::resolve::normalize_roster).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawParticipants {
    List(Vec<String>),
    Text(String),
    Other(serde_json::Value),
}

/// A conversation document, decoded leniently from the wire shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub participant_names: Option<RawParticipants>,

    /// Legacy per-document name field, kept only as a display fallback.
    #[serde(default)]
    pub employee_name: Option<String>,

    #[serde(default)]
    pub last_message: Option<String>,

    /// `None` while the server-assigned timestamp is still a placeholder.
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub last_message_timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_message_sender_id: Option<String>,
}

impl Conversation {
    /// Decode a raw store document. Returns `None` (with a warning) when the
    /// document body is not an object; individual malformed fields degrade to
    /// their defaults instead of failing the whole record.
    pub fn from_document(doc: &Document) -> Option<Conversation> {
        if !doc.data.is_object() {
            warn!(id = %doc.id, "conversation document is not an object, skipping");
            return None;
        }
        match serde_json::from_value::<Conversation>(doc.data.clone()) {
            Ok(mut conversation) => {
                conversation.id = doc.id.clone();
                Some(conversation)
            }
            Err(e) => {
                warn!(id = %doc.id, error = %e, "failed to decode conversation document");
                None
            }
        }
    }
}

/// Lenient decoding for server-assigned timestamp fields: RFC 3339 strings
/// and epoch-millisecond numbers resolve, everything else (null, the
/// server-timestamp write sentinel, malformed strings) reads as `None` —
/// "not yet ready" is not an error condition.
pub(crate) mod lenient_timestamp {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| match v {
            serde_json::Value::String(s) => s.parse::<DateTime<Utc>>().ok(),
            serde_json::Value::Number(n) => n
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
            _ => None,
        }))
    }
}
