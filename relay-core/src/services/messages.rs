//! Per-conversation message flows: live message feed and the send path.

use serde_json::json;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::config::{DisplayConfig, RelayConfig};
use crate::error::{RelayError, RelayResult};
use crate::feed::MessageFeed;
use crate::models::Message;
use crate::resolve::truncate_chars;
use crate::store::{
    server_timestamp, DocumentStore, OrderDirection, QueryOptions, SubscriptionHandle,
};

use super::{messages_path, CONVERSATIONS};

pub struct MessageService<S> {
    store: Arc<S>,
    display: DisplayConfig,
    current: Mutex<Option<SubscriptionHandle>>,
}

impl<S: DocumentStore> MessageService<S> {
    pub fn new(store: Arc<S>, config: &RelayConfig) -> Self {
        Self {
            store,
            display: config.display.clone(),
            current: Mutex::new(None),
        }
    }

    /// Subscribe to one conversation's messages. Any previously open
    /// subscription is torn down first — snapshots must never arrive into a
    /// stale classification context (messages from conversation B rendered
    /// against conversation A's roster).
    ///
    /// `on_messages` receives the display-ready sequence after each snapshot
    /// runs through the feed (pending messages hidden, duplicates collapsed,
    /// frozen display order).
    pub async fn open(
        &self,
        conversation_id: &str,
        on_messages: impl Fn(Vec<Message>) + Send + Sync + 'static,
        on_error: impl Fn(RelayError) + Send + Sync + 'static,
    ) -> RelayResult<()> {
        self.close();

        let feed = Mutex::new(MessageFeed::new());
        let handle = self
            .store
            .subscribe(
                &messages_path(conversation_id),
                QueryOptions::ordered_by("timestamp", OrderDirection::Asc),
                Box::new(move |docs| {
                    let snapshot: Vec<Message> =
                        docs.iter().filter_map(Message::from_document).collect();
                    match feed.lock() {
                        Ok(mut feed) => {
                            feed.apply_snapshot(snapshot);
                            on_messages(feed.messages().to_vec());
                        }
                        Err(_) => warn!("message feed lock poisoned, snapshot dropped"),
                    }
                }),
                Box::new(on_error),
            )
            .await?;

        if let Ok(mut slot) = self.current.lock() {
            // A racing open may have landed meanwhile; replacing the handle
            // drops it, which unsubscribes.
            *slot = Some(handle);
        }
        debug!(conversation_id, "message subscription opened");
        Ok(())
    }

    /// Tear down the current subscription, if any. Idempotent.
    pub fn close(&self) {
        if let Ok(mut slot) = self.current.lock() {
            if let Some(handle) = slot.take() {
                handle.unsubscribe();
            }
        }
    }

    /// Send a message. The conversation document is created lazily on the
    /// first message from either side; the preview fields are updated with a
    /// bounded excerpt and a server-assigned timestamp.
    pub async fn send(
        &self,
        conversation_id: &str,
        sender_id: &str,
        text: &str,
        participant_names: &[String],
    ) -> RelayResult<String> {
        self.ensure_conversation(conversation_id, participant_names)
            .await?;

        let message_id = self
            .store
            .create(
                &messages_path(conversation_id),
                None,
                json!({
                    "senderId": sender_id,
                    "text": text,
                    "timestamp": server_timestamp(),
                }),
            )
            .await?;

        self.store
            .update(
                CONVERSATIONS,
                conversation_id,
                json!({
                    "lastMessage": truncate_chars(text, self.display.preview_len),
                    "lastMessageSenderId": sender_id,
                    "lastMessageTimestamp": server_timestamp(),
                }),
            )
            .await?;

        Ok(message_id)
    }

    async fn ensure_conversation(
        &self,
        conversation_id: &str,
        participant_names: &[String],
    ) -> RelayResult<()> {
        if self
            .store
            .get_by_id(CONVERSATIONS, conversation_id)
            .await?
            .is_none()
        {
            debug!(conversation_id, "creating conversation on first message");
            self.store
                .create(
                    CONVERSATIONS,
                    Some(conversation_id),
                    json!({ "participantNames": participant_names }),
                )
                .await?;
        }
        Ok(())
    }
}

impl<S> Drop for MessageService<S> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.current.lock() {
            if let Some(handle) = slot.take() {
                handle.unsubscribe();
            }
        }
    }
}
