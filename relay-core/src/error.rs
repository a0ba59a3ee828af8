//! Error types for the Relay core library.
//!
//! The resolution protocol itself (roster normalization, role classification,
//! display derivation) never produces errors for data-shape reasons; malformed
//! data degrades to placeholders. Everything here belongs to the store-access
//! layer, configuration loading, and subscriptions — the classes that are
//! allowed to surface to a caller.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Store | Document store connection, read, write, query errors |
//! | E2001-E2099 | Config | Environment, config file, and validation errors |
//! | E3001-E3099 | Subscription | Listener registration and delivery errors |
//! | E9001-E9099 | General | Internal and serialization errors |

use thiserror::Error;

/// The main error type for the Relay core library.
#[derive(Debug, Error)]
pub enum RelayError {
    // ========================================================================
    // Store Errors (E1001-E1099)
    // ========================================================================
    /// Failed to reach the document store
    #[error("[E1001] Store connection failed: {message}")]
    StoreConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Store read or query failed
    #[error("[E1002] Store query failed: {0}")]
    StoreQueryFailed(String),

    /// Document does not exist
    #[error("[E1003] Document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    /// Store rejected the operation
    #[error("[E1004] Store permission denied: {0}")]
    StorePermissionDenied(String),

    /// Store write failed
    #[error("[E1005] Store write failed: {0}")]
    StoreWriteFailed(String),

    /// Partial update payload was not a JSON object
    #[error("[E1006] Invalid update payload for {collection}/{id}: expected an object")]
    InvalidUpdatePayload { collection: String, id: String },

    // ========================================================================
    // Configuration Errors (E2001-E2099)
    // ========================================================================
    /// Required configuration value is missing
    #[error("[E2001] Missing required configuration: {0}")]
    MissingRequiredConfig(String),

    /// Configuration file or environment parse error
    #[error("[E2002] Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// Invalid configuration value
    #[error("[E2003] Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    // ========================================================================
    // Subscription Errors (E3001-E3099)
    // ========================================================================
    /// Listener registration failed
    #[error("[E3001] Subscription failed for '{path}': {message}")]
    SubscriptionFailed { path: String, message: String },

    /// Snapshot delivery failed after the listener was torn down
    #[error("[E3002] Subscription closed: {0}")]
    SubscriptionClosed(String),

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// Internal error (catch-all for unexpected conditions)
    #[error("[E9001] Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("[E9002] Serialization error: {0}")]
    SerializationError(String),
}

impl RelayError {
    /// Create a store connection error from a string message.
    pub fn store_connection_failed(message: impl Into<String>) -> Self {
        RelayError::StoreConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a store connection error with a source error.
    pub fn store_connection_failed_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RelayError::StoreConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether the error should be presented to the user with a retry
    /// affordance. Only store connectivity and write failures qualify;
    /// everything else is a programming or configuration problem.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            RelayError::StoreConnectionFailed { .. }
                | RelayError::StoreQueryFailed(_)
                | RelayError::StoreWriteFailed(_)
                | RelayError::SubscriptionFailed { .. }
        )
    }
}

/// Result type alias for Relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::SerializationError(err.to_string())
    }
}

impl From<config::ConfigError> for RelayError {
    fn from(err: config::ConfigError) -> Self {
        RelayError::ConfigParseError(err.to_string())
    }
}
