//! Core library for Relay, a two-sided messaging feature (employee app + HR
//! dashboard) on a hosted document database with real-time listeners.
//!
//! The centerpiece is the participant-name resolution protocol in
//! [`resolve`]: normalizing the loosely-typed `participantNames` field,
//! classifying message senders, and deriving the display fields both apps
//! render. [`store`] is the narrow seam to the document database, [`feed`]
//! the snapshot-to-display message pipeline, and [`services`] the read,
//! watch, and send flows built on top.

pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod resolve;
pub mod services;
pub mod store;

pub use config::{init_logging, DisplayConfig, LoggingConfig, RelayConfig, ResolverConfig};
pub use error::{RelayError, RelayResult};
pub use feed::MessageFeed;
pub use models::{Conversation, Message, RawParticipants, Role, Roster, ViewerRole};
pub use resolve::{
    build_directory, classify, derive_display, is_own_message, normalize_roster,
    participant_list, ConversationDisplay, DirectoryEntry,
};
pub use services::{DirectoryService, MessageService};
pub use store::{
    Document, DocumentStore, FieldFilter, FilterOp, InMemoryStore, OrderDirection, QueryOptions,
    SubscriptionHandle, SERVER_TIMESTAMP,
};
