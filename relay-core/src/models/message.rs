use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::conversation::lenient_timestamp;
use crate::store::Document;

/// A message document within a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub sender_id: String,

    #[serde(default)]
    pub text: String,

    /// `None` while the server timestamp is still a placeholder; such a
    /// message is not yet orderable and stays hidden from display.
    #[serde(default, deserialize_with = "lenient_timestamp::deserialize")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    /// Decode a raw store document, tolerating malformed fields.
    pub fn from_document(doc: &Document) -> Option<Message> {
        if !doc.data.is_object() {
            warn!(id = %doc.id, "message document is not an object, skipping");
            return None;
        }
        match serde_json::from_value::<Message>(doc.data.clone()) {
            Ok(mut message) => {
                message.id = doc.id.clone();
                Some(message)
            }
            Err(e) => {
                warn!(id = %doc.id, error = %e, "failed to decode message document");
                None
            }
        }
    }

    /// Whether the server has not yet assigned this message's timestamp.
    pub fn is_pending(&self) -> bool {
        self.timestamp.is_none()
    }
}
