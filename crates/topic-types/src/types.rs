//! Domain data types.

use serde::{Deserialize, Serialize};

/// Stable identifier of an entity in the knowledge base (e.g. `Q42`).
pub type EntityId = String;

/// Key of a relation predicate in the knowledge base (e.g. `P31`).
pub type RelationKey = String;

/// Index of a topic in the statistical topic model.
pub type ModelTopicId = usize;

/// A knowledge-base node discovered during a neighbourhood crawl.
///
/// Created the first time the crawl visits the identifier and never updated
/// afterwards within that crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Knowledge-base identifier
    pub id: EntityId,
    /// Display label in the configured language (empty if missing)
    pub label: String,
    /// Display description in the configured language (empty if missing)
    pub description: String,
    /// Hops from the seed along the first-discovered path
    pub hop: u32,
}

impl Entity {
    /// Create a new entity record.
    pub fn new(
        id: impl Into<EntityId>,
        label: impl Into<String>,
        description: impl Into<String>,
        hop: u32,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
            hop,
        }
    }

    /// Seeds are the only entities at hop zero.
    pub fn is_seed(&self) -> bool {
        self.hop == 0
    }
}

/// Where a candidate topic came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TopicSource {
    /// Statistical topic model posterior
    #[serde(rename = "model")]
    Model,
    /// Named-entity linking followed by graph labelling
    #[serde(rename = "ner")]
    EntityLinked,
}

impl std::fmt::Display for TopicSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopicSource::Model => write!(f, "topic-model"),
            TopicSource::EntityLinked => write!(f, "entity-linked"),
        }
    }
}

/// A labelled topic candidate.
///
/// Canonical topic records (e.g. a topic model catalogue) are shared by many
/// documents, so scoring always produces a fresh copy via [`Topic::with_score`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Human-readable label
    pub label: String,
    /// Knowledge-base identifier backing the label, if any
    #[serde(default)]
    pub entity_id: Option<EntityId>,
    /// Description of the backing entity
    #[serde(default)]
    pub description: String,
    /// Raw score on the scale of its source
    #[serde(default)]
    pub score: f64,
    /// Source tag
    pub source: TopicSource,
}

impl Topic {
    /// Create a new topic.
    pub fn new(
        label: impl Into<String>,
        entity_id: Option<EntityId>,
        description: impl Into<String>,
        score: f64,
        source: TopicSource,
    ) -> Self {
        Self {
            label: label.into(),
            entity_id,
            description: description.into(),
            score,
            source,
        }
    }

    /// Build a topic from a crawled entity.
    pub fn from_entity(entity: &Entity, score: f64, source: TopicSource) -> Self {
        Self {
            label: entity.label.clone(),
            entity_id: Some(entity.id.clone()),
            description: entity.description.clone(),
            score,
            source,
        }
    }

    /// Fresh copy carrying a new score.
    pub fn with_score(&self, score: f64) -> Self {
        Self {
            score,
            ..self.clone()
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.entity_id {
            Some(id) => write!(f, "{} ({})", self.label, id),
            None => write!(f, "{}", self.label),
        }
    }
}

/// A raw entity mention together with its knowledge-base resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedEntity {
    /// Surface string produced by entity recognition
    pub surface: String,
    /// Resolved identifier; `None` if not yet resolved or unresolvable
    #[serde(default)]
    pub entity_id: Option<EntityId>,
}

impl LinkedEntity {
    /// An entity mention that still needs resolving.
    pub fn unresolved(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            entity_id: None,
        }
    }

    /// An entity mention with a known identifier.
    pub fn resolved(surface: impl Into<String>, entity_id: impl Into<EntityId>) -> Self {
        Self {
            surface: surface.into(),
            entity_id: Some(entity_id.into()),
        }
    }
}

/// The linked entities of one document, the unit of work for graph labelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntities {
    /// Document identifier
    pub document_id: String,
    /// Entity mentions in document order
    pub entities: Vec<LinkedEntity>,
}

impl DocumentEntities {
    /// Create from linked entities.
    pub fn new(document_id: impl Into<String>, entities: Vec<LinkedEntity>) -> Self {
        Self {
            document_id: document_id.into(),
            entities,
        }
    }

    /// Create from raw surface strings, all unresolved.
    pub fn from_surfaces<I, S>(document_id: impl Into<String>, surfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            document_id: document_id.into(),
            entities: surfaces.into_iter().map(LinkedEntity::unresolved).collect(),
        }
    }

    /// Identifiers already resolved, in order, without duplicates.
    pub fn resolved_ids(&self) -> Vec<EntityId> {
        let mut seen = std::collections::HashSet::new();
        self.entities
            .iter()
            .filter_map(|e| e.entity_id.clone())
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }
}

/// Input document for the labelling pipeline.
///
/// Entity mentions and model posteriors are produced upstream by the entity
/// recogniser and the topic model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier
    pub id: String,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Author names
    #[serde(default)]
    pub authors: Vec<String>,
    /// Where the document text was fetched from
    #[serde(default)]
    pub source_url: Option<String>,
    /// Entity surface strings recognised in the text
    #[serde(default)]
    pub entities: Vec<String>,
    /// Topic model posterior as (topic index, probability)
    #[serde(default)]
    pub model_topics: Vec<(ModelTopicId, f64)>,
}

impl Document {
    /// Create a document with an id and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Entity mentions as unresolved work for the labeller.
    pub fn to_entities(&self) -> DocumentEntities {
        DocumentEntities::from_surfaces(self.id.clone(), self.entities.iter().cloned())
    }
}
