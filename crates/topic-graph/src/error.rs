//! Graph error types.

use thiserror::Error;

use topic_kb::KbError;

/// Errors that can occur while crawling, reducing or ranking a graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Graph has no nodes (no seed could be crawled)
    #[error("Graph is empty")]
    EmptyGraph,

    /// Algorithm requires a connected graph
    #[error("Graph is not connected")]
    NotConnected,

    /// Knowledge-base lookup failed during the crawl
    #[error(transparent)]
    Kb(#[from] KbError),
}
