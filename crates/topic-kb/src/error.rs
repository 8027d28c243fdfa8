//! Knowledge-base error types.

use thiserror::Error;

/// Errors that can occur while talking to the knowledge base.
#[derive(Debug, Error)]
pub enum KbError {
    /// Remote call returned a non-success status, timed out, or never completed
    #[error("Lookup failed for '{query}': {reason}")]
    LookupFailure { query: String, reason: String },

    /// Response body could not be decoded
    #[error("Failed to parse knowledge-base response: {0}")]
    Parse(String),

    /// Detail payload did not contain the requested entity
    #[error("Entity not found in knowledge base: {0}")]
    MissingEntity(String),

    /// Client could not be constructed
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl KbError {
    /// Build a lookup failure for a query.
    pub fn lookup(query: impl Into<String>, reason: impl Into<String>) -> Self {
        KbError::LookupFailure {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is a remote lookup failure.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, KbError::LookupFailure { .. })
    }
}
