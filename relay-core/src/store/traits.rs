use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use uuid::Uuid;

use crate::error::{RelayError, RelayResult};

/// Sentinel a writer places in a timestamp field; the store replaces it with
/// its own clock at commit time. Until the replacement is observed, clients
/// see the field as unresolved.
pub const SERVER_TIMESTAMP: &str = "__serverTimestamp__";

/// A timestamp field value requesting server-side assignment.
pub fn server_timestamp() -> Value {
    Value::String(SERVER_TIMESTAMP.to_string())
}

/// A raw document as the store hands it over: an id plus an untyped body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Query shape accepted by [`DocumentStore::subscribe`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub order_by_field: Option<String>,

    #[serde(default)]
    pub order_direction: OrderDirection,

    #[serde(default)]
    pub limit_count: Option<usize>,

    #[serde(default)]
    pub filters: Vec<FieldFilter>,
}

impl QueryOptions {
    pub fn ordered_by(field: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            order_by_field: Some(field.into()),
            order_direction: direction,
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit_count = Some(limit);
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            op,
            value,
        });
        self
    }
}

/// Full-snapshot delivery on every change to the subscribed query.
pub type SnapshotCallback = Box<dyn Fn(Vec<Document>) + Send + Sync>;

/// Store-level failure delivery (network, permission, query errors) — the
/// only error class a UI should surface.
pub type ErrorCallback = Box<dyn Fn(RelayError) + Send + Sync>;

/// Live subscription to a store query. `unsubscribe` is idempotent and also
/// runs on drop, so a handle going out of scope cannot keep delivering
/// snapshots into a stale context.
pub struct SubscriptionHandle {
    id: Uuid,
    cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl SubscriptionHandle {
    pub fn new(id: Uuid, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Tear down the subscription. Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        if let Ok(mut guard) = self.cancel.lock() {
            if let Some(cancel) = guard.take() {
                cancel();
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// The narrow seam to the hosted document store. Collections and
/// subcollections are addressed by slash-separated paths
/// (`conversations`, `conversations/{id}/messages`).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_by_id(&self, collection: &str, id: &str) -> RelayResult<Option<Document>>;

    async fn list_all(&self, collection: &str) -> RelayResult<Vec<Document>>;

    /// Create a document; the store assigns an id when `id` is `None` and
    /// resolves any server-timestamp sentinels in `data`.
    async fn create(&self, collection: &str, id: Option<&str>, data: Value)
        -> RelayResult<String>;

    /// Merge `partial` (a JSON object) into an existing document.
    async fn update(&self, collection: &str, id: &str, partial: Value) -> RelayResult<()>;

    /// Register a listener; an initial snapshot is delivered immediately and
    /// further snapshots on every matching change.
    async fn subscribe(
        &self,
        path: &str,
        options: QueryOptions,
        on_snapshot: SnapshotCallback,
        on_error: ErrorCallback,
    ) -> RelayResult<SubscriptionHandle>;
}
