//! Entity resolution with a run-scoped cache.
//!
//! Maps a raw entity string to the identifier of the first search hit.
//! The cache is shared by every worker of a run:
//!
//! - one remote search per label, even under concurrent requests for it
//! - "no match" is cached as well, so unresolvable labels cost one call
//! - failed lookups are not cached; a later call tries again
//! - entries are never invalidated within a run

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use topic_types::{DocumentEntities, EntityId, LinkedEntity};

use crate::error::KbError;
use crate::KnowledgeBase;

type CacheSlot = Arc<OnceCell<Option<EntityId>>>;

/// Resolves entity strings to knowledge-base identifiers.
pub struct EntityResolver {
    kb: Arc<dyn KnowledgeBase>,
    cache: DashMap<String, CacheSlot>,
}

impl EntityResolver {
    /// Create a resolver with an empty cache.
    pub fn new(kb: Arc<dyn KnowledgeBase>) -> Self {
        Self {
            kb,
            cache: DashMap::new(),
        }
    }

    /// Create a resolver with a pre-seeded cache.
    pub fn with_entries<I>(kb: Arc<dyn KnowledgeBase>, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<EntityId>)>,
    {
        let resolver = Self::new(kb);
        for (label, resolved) in entries {
            resolver
                .cache
                .insert(label, Arc::new(OnceCell::new_with(Some(resolved))));
        }
        resolver
    }

    /// The knowledge base behind this resolver.
    pub fn knowledge_base(&self) -> &Arc<dyn KnowledgeBase> {
        &self.kb
    }

    /// Resolve a label to an identifier.
    ///
    /// Returns `Ok(None)` when the knowledge base has no match. Only the first
    /// search hit is considered.
    #[instrument(skip(self))]
    pub async fn resolve(&self, label: &str) -> Result<Option<EntityId>, KbError> {
        let label = label.trim();
        if label.is_empty() {
            return Ok(None);
        }

        // Clone the slot out so no map guard is held across the remote call
        let slot: CacheSlot = self.cache.entry(label.to_string()).or_default().clone();

        let resolved = slot
            .get_or_try_init(|| async {
                let hits = self.kb.search(label).await?;
                let resolved = hits.first().and_then(|hit| hit.entity_id());
                match &resolved {
                    Some(id) => debug!(entity_id = %id, "Resolved entity"),
                    None => debug!("No knowledge-base match, entity dropped"),
                }
                Ok::<_, KbError>(resolved)
            })
            .await?;

        Ok(resolved.clone())
    }

    /// Resolve every unresolved mention of a document, keeping input order.
    ///
    /// Mentions that already carry an identifier are left untouched.
    pub async fn link(&self, document: &DocumentEntities) -> Result<DocumentEntities, KbError> {
        let mut entities = Vec::with_capacity(document.entities.len());
        for entity in &document.entities {
            let entity_id = match &entity.entity_id {
                Some(id) => Some(id.clone()),
                None => self.resolve(&entity.surface).await?,
            };
            entities.push(LinkedEntity {
                surface: entity.surface.clone(),
                entity_id,
            });
        }
        Ok(DocumentEntities::new(document.document_id.clone(), entities))
    }

    /// Cached outcome for a label, if it has been resolved in this run.
    pub fn cached(&self, label: &str) -> Option<Option<EntityId>> {
        self.cache
            .get(label.trim())
            .and_then(|slot| slot.get().cloned())
    }

    /// Number of labels with a cached outcome.
    pub fn cache_len(&self) -> usize {
        self.cache.iter().filter(|e| e.value().initialized()).count()
    }
}
