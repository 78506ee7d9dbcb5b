//! Error types for the `annals-civ` crate.
//!
//! Gameplay outcomes such as "not enough culture" are result values, not
//! errors. [`CivError`] covers malformed records and unknown catalog ids.

/// Errors raised by civ-level operations.
#[derive(Debug, thiserror::Error)]
pub enum CivError {
    /// A persistence record could not be encoded or decoded.
    #[error("record error: {0}")]
    Record(#[from] serde_json::Error),

    /// A technology id is not in the tech tree.
    #[error("unknown technology: {0}")]
    UnknownTech(String),

    /// A policy id is not in the policy catalog.
    #[error("unknown policy: {0}")]
    UnknownPolicy(String),

    /// A building, wonder, or unit id is not in the production catalog.
    #[error("unknown production item: {0}")]
    UnknownItem(String),
}
