//! Error types for the store layer.

/// Errors raised by durable stores and snapshots.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A key does not follow the `{kind}:{uuid}` pattern.
    #[error("malformed store key: {0}")]
    MalformedKey(String),

    /// The backing store is unusable (poisoned lock, injected failure).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
