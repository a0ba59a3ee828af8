pub mod memory;
pub mod traits;

pub use memory::InMemoryStore;
pub use traits::{
    server_timestamp, Document, DocumentStore, ErrorCallback, FieldFilter, FilterOp,
    OrderDirection, QueryOptions, SnapshotCallback, SubscriptionHandle, SERVER_TIMESTAMP,
};
