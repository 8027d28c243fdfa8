//! # topic-types
//!
//! Shared domain types for the topic labelling system.
//!
//! This crate defines the data structures passed between the crawl, ranking
//! and combination stages:
//! - Entities: knowledge-base nodes discovered during a neighbourhood crawl
//! - Topics: labelled candidates produced by the topic model or the graph labeller
//! - Documents: the per-document input carried through the pipeline
//! - Settings: layered configuration for every stage
//!
//! ## Usage
//!
//! ```rust
//! use topic_types::{Topic, TopicSource};
//!
//! let topic = Topic::new("Machine learning", Some("Q2539".to_string()), "", 0.8, TopicSource::EntityLinked);
//! assert_eq!(topic.to_string(), "Machine learning (Q2539)");
//! ```

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    CentralityKind, CombinerSettings, CrawlSettings, DispatchSettings, KnowledgeBaseSettings,
    LabelingSettings, Settings, DEFAULT_EXCLUDED_ENTITIES, DEFAULT_RELATIONS,
};
pub use error::ConfigError;
pub use types::{
    Document, DocumentEntities, Entity, EntityId, LinkedEntity, ModelTopicId, RelationKey, Topic,
    TopicSource,
};
