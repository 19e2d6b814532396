//! Error taxonomy for a category walk.
//!
//! Failures inside a walk are never handled locally; they surface here and are
//! caught one level up by the retry wrapper, which restarts the whole category.

use thiserror::Error;

/// Everything that can go wrong while walking one category.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// An expected element did not appear or respond within its scoped timeout.
    #[error("timed out after {timeout_ms}ms waiting on `{selector}`")]
    ElementTimeout { selector: String, timeout_ms: u64 },

    /// No element matched the substituted category-link selector.
    #[error("no category link matched `{name}`")]
    CategoryNotFound { name: String },

    /// The page never went network-quiet within the configured window.
    #[error("network did not go idle within {timeout_ms}ms")]
    NetworkIdleTimeout { timeout_ms: u64 },

    /// Snapshot or cookie persistence failed.
    #[error("failed to persist state: {0}")]
    Persist(#[source] anyhow::Error),

    /// Catch-all for any other driver failure.
    #[error(transparent)]
    Driver(#[from] anyhow::Error),
}
