//! Error types for the datastore.

use thiserror::Error;

/// Main error type for datastore operations.
///
/// Lookups never fail for missing data; absence is reported as
/// [`Value::Undefined`](crate::Value::Undefined) or an empty result.
/// Errors are reserved for malformed input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Multi-node queries are disabled for this datastore")]
    QueriesDisabled,

    #[error("Events are disabled for this datastore")]
    EventsDisabled,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for datastore operations.
pub type Result<T> = std::result::Result<T, StoreError>;
