//! Labelling error types.

use thiserror::Error;

use topic_graph::GraphError;
use topic_kb::KbError;

/// Errors that can occur while labelling documents.
#[derive(Debug, Error)]
pub enum LabelError {
    /// Knowledge-base error
    #[error("Knowledge-base error: {0}")]
    Kb(#[from] KbError),

    /// Graph error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Worker task panicked or was aborted
    #[error("Worker failed for document {document_id}: {reason}")]
    Worker { document_id: String, reason: String },

    /// Document was never dispatched because the batch was cancelled
    #[error("Labelling cancelled before document {0} was dispatched")]
    Cancelled(String),
}

impl LabelError {
    /// Whether the root cause is a failed knowledge-base lookup.
    pub fn is_lookup_failure(&self) -> bool {
        match self {
            LabelError::Kb(e) => e.is_lookup_failure(),
            LabelError::Graph(GraphError::Kb(e)) => e.is_lookup_failure(),
            _ => false,
        }
    }
}
