//! # topic-kb
//!
//! Knowledge-base access for the topic labeller.
//!
//! - [`KnowledgeBase`]: pluggable async lookup capability (search + entity detail)
//! - [`WikidataClient`]: HTTP implementation against a MediaWiki/Wikibase API
//! - [`InMemoryKnowledgeBase`]: deterministic stub for tests and offline runs
//! - [`EntityResolver`]: label -> identifier resolution with a run-scoped cache
//!
//! Remote lookups are never retried here. A non-success status, a timeout or
//! a transport failure surfaces as [`KbError::LookupFailure`] and the caller
//! decides whether to skip or abort.

mod client;
mod error;
mod memory;
mod resolver;
mod wire;

pub use client::WikidataClient;
pub use error::KbError;
pub use memory::{InMemoryKnowledgeBase, KnowledgeBaseFixture};
pub use resolver::EntityResolver;
pub use wire::{Claim, DataValue, EntityDetail, LangValue, SearchHit, Snak, SnakType};

use async_trait::async_trait;

use topic_types::EntityId;

/// Namespace of concept URIs for knowledge-base entities.
pub const ENTITY_URI_PREFIX: &str = "http://www.wikidata.org/entity/";

/// Canonical concept URI for an entity identifier.
pub fn entity_uri(id: &str) -> String {
    format!("{ENTITY_URI_PREFIX}{id}")
}

/// Identifier at the end of a concept URI (`.../entity/Q42` -> `Q42`).
pub fn entity_id_from_uri(uri: &str) -> Option<EntityId> {
    uri.rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Remote knowledge-base lookup capability.
///
/// Implementations must be safe to share across worker tasks.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Ranked search results for a free-text label.
    async fn search(&self, label: &str) -> Result<Vec<SearchHit>, KbError>;

    /// Detail payload (labels, descriptions, claims) of one entity.
    async fn entity(&self, id: &str) -> Result<EntityDetail, KbError>;

    /// Language used for search and display strings.
    fn language(&self) -> &str;
}
