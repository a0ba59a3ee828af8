//! In-memory [`DocumentStore`] implementation.
//!
//! Backs the integration tests and local development; behaves like the hosted
//! store where it matters to this crate: collections addressed by path,
//! server-timestamp sentinel resolution at commit, an initial snapshot on
//! subscribe, and a full snapshot to every matching listener on each write.

use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use async_trait::async_trait;

use crate::error::{RelayError, RelayResult};

use super::traits::{
    Document, DocumentStore, ErrorCallback, FieldFilter, FilterOp, OrderDirection, QueryOptions,
    SnapshotCallback, SubscriptionHandle, SERVER_TIMESTAMP,
};

type Collections = HashMap<String, BTreeMap<String, Value>>;

struct Listener {
    path: String,
    options: QueryOptions,
    on_snapshot: SnapshotCallback,
    on_error: ErrorCallback,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<Mutex<Collections>>,
    listeners: Arc<Mutex<HashMap<Uuid, Arc<Listener>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<'a, T>(mutex: &'a Mutex<T>) -> RelayResult<MutexGuard<'a, T>> {
        mutex
            .lock()
            .map_err(|_| RelayError::Internal("store lock poisoned".to_string()))
    }

    /// Compute the current snapshot for one listener.
    fn snapshot_for(&self, path: &str, options: &QueryOptions) -> RelayResult<Vec<Document>> {
        let collections = Self::lock(&self.collections)?;
        let docs = collections
            .get(path)
            .map(|collection| {
                collection
                    .iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(apply_query(docs, options))
    }

    /// Push fresh snapshots to every listener on `path`.
    fn notify(&self, path: &str) {
        let targets: Vec<Arc<Listener>> = match Self::lock(&self.listeners) {
            Ok(listeners) => listeners
                .values()
                .filter(|l| l.path == path)
                .cloned()
                .collect(),
            Err(_) => return,
        };

        for listener in targets {
            match self.snapshot_for(&listener.path, &listener.options) {
                Ok(snapshot) => (listener.on_snapshot)(snapshot),
                Err(e) => (listener.on_error)(e),
            }
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_by_id(&self, collection: &str, id: &str) -> RelayResult<Option<Document>> {
        let collections = Self::lock(&self.collections)?;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn list_all(&self, collection: &str) -> RelayResult<Vec<Document>> {
        let collections = Self::lock(&self.collections)?;
        Ok(collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(
        &self,
        collection: &str,
        id: Option<&str>,
        mut data: Value,
    ) -> RelayResult<String> {
        let id = id
            .map(|s| s.to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        resolve_server_timestamps(&mut data);

        {
            let mut collections = Self::lock(&self.collections)?;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), data);
        }
        debug!(collection, id = %id, "document created");
        self.notify(collection);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, mut partial: Value) -> RelayResult<()> {
        resolve_server_timestamps(&mut partial);
        let Value::Object(fields) = partial else {
            return Err(RelayError::InvalidUpdatePayload {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        };

        {
            let mut collections = Self::lock(&self.collections)?;
            let doc = collections
                .get_mut(collection)
                .and_then(|c| c.get_mut(id))
                .ok_or_else(|| RelayError::DocumentNotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            match doc {
                Value::Object(existing) => {
                    for (key, value) in fields {
                        existing.insert(key, value);
                    }
                }
                other => {
                    *other = Value::Object(fields);
                }
            }
        }
        debug!(collection, id, "document updated");
        self.notify(collection);
        Ok(())
    }

    async fn subscribe(
        &self,
        path: &str,
        options: QueryOptions,
        on_snapshot: SnapshotCallback,
        on_error: ErrorCallback,
    ) -> RelayResult<SubscriptionHandle> {
        let id = Uuid::new_v4();
        let listener = Arc::new(Listener {
            path: path.to_string(),
            options,
            on_snapshot,
            on_error,
        });

        {
            let mut listeners = Self::lock(&self.listeners)?;
            listeners.insert(id, Arc::clone(&listener));
        }

        // Initial snapshot, matching the hosted store's listener semantics.
        match self.snapshot_for(&listener.path, &listener.options) {
            Ok(snapshot) => (listener.on_snapshot)(snapshot),
            Err(e) => (listener.on_error)(e),
        }

        let registry = Arc::clone(&self.listeners);
        Ok(SubscriptionHandle::new(id, move || {
            if let Ok(mut listeners) = registry.lock() {
                listeners.remove(&id);
            }
        }))
    }
}

fn apply_query(mut docs: Vec<Document>, options: &QueryOptions) -> Vec<Document> {
    docs.retain(|doc| options.filters.iter().all(|f| matches_filter(doc, f)));

    if let Some(field) = &options.order_by_field {
        docs.sort_by(|a, b| {
            let ordering = compare_values(a.data.get(field), b.data.get(field));
            match options.order_direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            }
        });
    }

    if let Some(limit) = options.limit_count {
        docs.truncate(limit);
    }
    docs
}

fn matches_filter(doc: &Document, filter: &FieldFilter) -> bool {
    let Some(value) = doc.data.get(&filter.field) else {
        return false;
    };
    let ordering = compare_values(Some(value), Some(&filter.value));
    match filter.op {
        FilterOp::Eq => value == &filter.value,
        FilterOp::Ne => value != &filter.value,
        FilterOp::Lt => ordering == std::cmp::Ordering::Less,
        FilterOp::Le => ordering != std::cmp::Ordering::Greater,
        FilterOp::Gt => ordering == std::cmp::Ordering::Greater,
        FilterOp::Ge => ordering != std::cmp::Ordering::Less,
    }
}

/// Loose cross-type comparison: missing and null sort first, then numbers,
/// strings, booleans; mixed types compare as equal.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => Ordering::Equal,
        },
    }
}

/// Replace top-level server-timestamp sentinels with the store clock, as the
/// hosted store does at commit time.
fn resolve_server_timestamps(data: &mut Value) {
    if let Value::Object(fields) = data {
        let now = Utc::now().to_rfc3339();
        for value in fields.values_mut() {
            if value.as_str() == Some(SERVER_TIMESTAMP) {
                *value = Value::String(now.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    #[tokio::test]
    async fn test_create_get_list() {
        let store = InMemoryStore::new();
        let id = store
            .create("conversations", Some("c1"), json!({"lastMessage": "Hi"}))
            .await
            .unwrap();
        assert_eq!(id, "c1");

        let doc = store.get_by_id("conversations", "c1").await.unwrap().unwrap();
        assert_eq!(doc.data["lastMessage"], "Hi");

        store
            .create("conversations", None, json!({"lastMessage": "Yo"}))
            .await
            .unwrap();
        assert_eq!(store.list_all("conversations").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_and_requires_existing() {
        let store = InMemoryStore::new();
        store
            .create("conversations", Some("c1"), json!({"a": 1, "b": 2}))
            .await
            .unwrap();
        store
            .update("conversations", "c1", json!({"b": 3, "c": 4}))
            .await
            .unwrap();

        let doc = store.get_by_id("conversations", "c1").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"a": 1, "b": 3, "c": 4}));

        let err = store
            .update("conversations", "missing", json!({"a": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::DocumentNotFound { .. }));

        let err = store
            .update("conversations", "c1", json!("not an object"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidUpdatePayload { .. }));
    }

    #[tokio::test]
    async fn test_server_timestamp_resolution() {
        let store = InMemoryStore::new();
        store
            .create(
                "conversations/c1/messages",
                Some("m1"),
                json!({"text": "Hi", "timestamp": SERVER_TIMESTAMP}),
            )
            .await
            .unwrap();

        let doc = store
            .get_by_id("conversations/c1/messages", "m1")
            .await
            .unwrap()
            .unwrap();
        let stamped = doc.data["timestamp"].as_str().unwrap();
        assert_ne!(stamped, SERVER_TIMESTAMP);
        assert!(stamped.parse::<chrono::DateTime<Utc>>().is_ok());
    }

    #[tokio::test]
    async fn test_subscribe_initial_and_change_snapshots() {
        let store = InMemoryStore::new();
        store
            .create("conversations", Some("c1"), json!({"lastMessage": "one"}))
            .await
            .unwrap();

        let deliveries = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&deliveries);
        let handle = store
            .subscribe(
                "conversations",
                QueryOptions::default(),
                Box::new(move |snapshot| {
                    assert!(!snapshot.is_empty());
                    seen.fetch_add(1, AtomicOrdering::SeqCst);
                }),
                Box::new(|e| panic!("unexpected store error: {e}")),
            )
            .await
            .unwrap();

        // Initial snapshot already delivered.
        assert_eq!(deliveries.load(AtomicOrdering::SeqCst), 1);

        store
            .update("conversations", "c1", json!({"lastMessage": "two"}))
            .await
            .unwrap();
        assert_eq!(deliveries.load(AtomicOrdering::SeqCst), 2);

        handle.unsubscribe();
        store
            .update("conversations", "c1", json!({"lastMessage": "three"}))
            .await
            .unwrap();
        assert_eq!(deliveries.load(AtomicOrdering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_query_order_filter_limit() {
        let store = InMemoryStore::new();
        for (id, n) in [("a", 3), ("b", 1), ("c", 2), ("d", 5)] {
            store
                .create("items", Some(id), json!({"rank": n}))
                .await
                .unwrap();
        }

        let options = QueryOptions::ordered_by("rank", OrderDirection::Desc)
            .with_limit(2)
            .with_filter("rank", FilterOp::Lt, json!(5));

        let got = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&got);
        let _handle = store
            .subscribe(
                "items",
                options,
                Box::new(move |snapshot| {
                    if let Ok(mut slot) = sink.lock() {
                        *slot = snapshot.iter().map(|d| d.id.clone()).collect();
                    }
                }),
                Box::new(|e| panic!("unexpected store error: {e}")),
            )
            .await
            .unwrap();

        let ids: Vec<String> = got.lock().unwrap().clone();
        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
    }
}
