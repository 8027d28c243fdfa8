//! In-memory knowledge base for tests and offline runs.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use topic_types::EntityId;

use crate::error::KbError;
use crate::wire::{EntityDetail, SearchHit};
use crate::KnowledgeBase;

/// Serializable contents of an [`InMemoryKnowledgeBase`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBaseFixture {
    /// Language reported by the stub
    #[serde(default = "default_language")]
    pub language: String,
    /// Search results keyed by exact label
    #[serde(default)]
    pub search: HashMap<String, Vec<SearchHit>>,
    /// Entity detail payloads
    #[serde(default)]
    pub entities: Vec<EntityDetail>,
}

fn default_language() -> String {
    "en".to_string()
}

/// Deterministic knowledge base that answers from memory.
///
/// Records how often each query was made and can be told to fail specific
/// queries with a lookup failure.
pub struct InMemoryKnowledgeBase {
    language: String,
    search: HashMap<String, Vec<SearchHit>>,
    entities: HashMap<EntityId, EntityDetail>,
    failing: HashSet<String>,
    latency: Option<Duration>,
    search_calls: DashMap<String, usize>,
    entity_calls: DashMap<String, usize>,
}

impl InMemoryKnowledgeBase {
    /// Create an empty knowledge base.
    pub fn new() -> Self {
        Self {
            language: default_language(),
            search: HashMap::new(),
            entities: HashMap::new(),
            failing: HashSet::new(),
            latency: None,
            search_calls: DashMap::new(),
            entity_calls: DashMap::new(),
        }
    }

    /// Build from a fixture.
    pub fn from_fixture(fixture: KnowledgeBaseFixture) -> Self {
        let mut kb = Self::new();
        kb.language = fixture.language;
        kb.search = fixture.search;
        for detail in fixture.entities {
            kb.entities.insert(detail.id.clone(), detail);
        }
        kb
    }

    /// Load a JSON fixture file.
    pub fn from_json_file(path: &Path) -> Result<Self, KbError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| KbError::Config(format!("{}: {}", path.display(), e)))?;
        let fixture: KnowledgeBaseFixture =
            serde_json::from_str(&text).map_err(|e| KbError::Parse(e.to_string()))?;
        Ok(Self::from_fixture(fixture))
    }

    /// Resolve `label` to `id` on search.
    pub fn with_search_hit(mut self, label: impl Into<String>, id: impl Into<EntityId>) -> Self {
        self.search
            .entry(label.into())
            .or_default()
            .push(SearchHit::for_id(id));
        self
    }

    /// Register an entity detail payload.
    pub fn with_entity(mut self, detail: EntityDetail) -> Self {
        self.entities.insert(detail.id.clone(), detail);
        self
    }

    /// Fail every lookup whose query (label or id) equals `query`.
    pub fn failing_on(mut self, query: impl Into<String>) -> Self {
        self.failing.insert(query.into());
        self
    }

    /// Sleep before answering each lookup.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of searches made for a label.
    pub fn search_calls(&self, label: &str) -> usize {
        self.search_calls.get(label).map(|c| *c).unwrap_or(0)
    }

    /// Number of detail lookups made for an id.
    pub fn entity_calls(&self, id: &str) -> usize {
        self.entity_calls.get(id).map(|c| *c).unwrap_or(0)
    }

    /// Total lookups of either kind.
    pub fn total_calls(&self) -> usize {
        let searches: usize = self.search_calls.iter().map(|e| *e.value()).sum();
        let details: usize = self.entity_calls.iter().map(|e| *e.value()).sum();
        searches + details
    }

    async fn before_lookup(&self, counter: &DashMap<String, usize>, query: &str) -> Result<(), KbError> {
        *counter.entry(query.to_string()).or_insert(0) += 1;
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.contains(query) {
            return Err(KbError::lookup(query, "HTTP 503 Service Unavailable: injected failure"));
        }
        Ok(())
    }
}

impl Default for InMemoryKnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KnowledgeBase for InMemoryKnowledgeBase {
    async fn search(&self, label: &str) -> Result<Vec<SearchHit>, KbError> {
        self.before_lookup(&self.search_calls, label).await?;
        Ok(self.search.get(label).cloned().unwrap_or_default())
    }

    async fn entity(&self, id: &str) -> Result<EntityDetail, KbError> {
        self.before_lookup(&self.entity_calls, id).await?;
        self.entities
            .get(id)
            .cloned()
            .ok_or_else(|| KbError::MissingEntity(id.to_string()))
    }

    fn language(&self) -> &str {
        &self.language
    }
}
