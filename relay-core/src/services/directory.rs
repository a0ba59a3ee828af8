//! Conversation directory service: the read/watch flows feeding both apps'
//! conversation lists.

use std::sync::Arc;
use tracing::debug;

use crate::config::{DisplayConfig, RelayConfig, ResolverConfig};
use crate::error::{RelayError, RelayResult};
use crate::models::Conversation;
use crate::resolve::{build_directory, DirectoryEntry};
use crate::store::{
    Document, DocumentStore, OrderDirection, QueryOptions, SubscriptionHandle,
};

use super::CONVERSATIONS;

pub struct DirectoryService<S> {
    store: Arc<S>,
    resolver: ResolverConfig,
    display: DisplayConfig,
}

impl<S: DocumentStore> DirectoryService<S> {
    pub fn new(store: Arc<S>, config: &RelayConfig) -> Self {
        Self {
            store,
            resolver: config.resolver.clone(),
            display: config.display.clone(),
        }
    }

    /// One-shot read of the full directory.
    pub async fn load(&self) -> RelayResult<Vec<DirectoryEntry>> {
        let docs = self.store.list_all(CONVERSATIONS).await?;
        Ok(derive(&docs, &self.resolver, &self.display))
    }

    /// Subscribe to the conversation list; `on_change` receives the freshly
    /// derived directory on every snapshot. Store failures go to `on_error`
    /// — the only error class worth a user-visible banner.
    pub async fn watch(
        &self,
        on_change: impl Fn(Vec<DirectoryEntry>) + Send + Sync + 'static,
        on_error: impl Fn(RelayError) + Send + Sync + 'static,
    ) -> RelayResult<SubscriptionHandle> {
        let resolver = self.resolver.clone();
        let display = self.display.clone();
        self.store
            .subscribe(
                CONVERSATIONS,
                QueryOptions::ordered_by("lastMessageTimestamp", OrderDirection::Desc),
                Box::new(move |docs| {
                    on_change(derive(&docs, &resolver, &display));
                }),
                Box::new(on_error),
            )
            .await
    }
}

/// Resolution runs fresh on every snapshot; documents that fail tolerant
/// decode are skipped with a warning inside `from_document`, everything else
/// flows through the fallback chains.
fn derive(
    docs: &[Document],
    resolver: &ResolverConfig,
    display: &DisplayConfig,
) -> Vec<DirectoryEntry> {
    let conversations: Vec<Conversation> =
        docs.iter().filter_map(Conversation::from_document).collect();
    if conversations.len() < docs.len() {
        debug!(
            skipped = docs.len() - conversations.len(),
            "snapshot contained undecodable conversation documents"
        );
    }
    build_directory(&conversations, resolver, display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ViewerRole;
    use crate::store::InMemoryStore;
    use serde_json::json;
    use std::sync::Mutex;

    fn service(store: Arc<InMemoryStore>) -> DirectoryService<InMemoryStore> {
        DirectoryService::new(store, &RelayConfig::new(ViewerRole::Primary))
    }

    #[tokio::test]
    async fn test_load_derives_names() {
        let store = Arc::new(InMemoryStore::new());
        store
            .create(
                CONVERSATIONS,
                Some("chat_alice_johnson"),
                json!({
                    "participantNames": ["Sarah Connor (HR)", "Alice Johnson"],
                    "lastMessage": "Hi"
                }),
            )
            .await
            .unwrap();

        let entries = service(Arc::clone(&store)).load().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_name, "Alice Johnson");
    }

    #[tokio::test]
    async fn test_watch_redelivers_on_change() {
        let store = Arc::new(InMemoryStore::new());
        store
            .create(CONVERSATIONS, Some("c1"), json!({"lastMessage": "one"}))
            .await
            .unwrap();

        let latest = Arc::new(Mutex::new(Vec::<DirectoryEntry>::new()));
        let sink = Arc::clone(&latest);
        let handle = service(Arc::clone(&store))
            .watch(
                move |entries| {
                    if let Ok(mut slot) = sink.lock() {
                        *slot = entries;
                    }
                },
                |e| panic!("unexpected store error: {e}"),
            )
            .await
            .unwrap();

        assert_eq!(latest.lock().unwrap().len(), 1);

        store
            .create(CONVERSATIONS, Some("c2"), json!({"lastMessage": "two"}))
            .await
            .unwrap();
        assert_eq!(latest.lock().unwrap().len(), 2);

        handle.unsubscribe();
        store
            .create(CONVERSATIONS, Some("c3"), json!({"lastMessage": "three"}))
            .await
            .unwrap();
        assert_eq!(latest.lock().unwrap().len(), 2);
    }
}
