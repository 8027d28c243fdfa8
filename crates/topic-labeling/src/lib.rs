//! # topic-labeling
//!
//! Topic extraction for documents from two sources:
//!
//! - a statistical topic model whose topics carry catalogue labels
//!   ([`LabelledTopicModel`])
//! - the knowledge-base neighbourhood of the document's linked entities
//!   ([`GraphLabeler`])
//!
//! Candidates from both are merged per document by the [`TopicCombiner`].
//! Entity labelling runs on a bounded worker pool ([`LabelDispatcher`])
//! that keeps results in input order and isolates per-document failures.
//!
//! ## Features
//! - Shared, run-scoped entity resolution cache across workers
//! - Pluggable centrality for label ranking
//! - Tunable weights between topic-model and entity-linked topics
//! - Catalogue labelling of model topics from their top terms

pub mod catalog;
pub mod combiner;
pub mod dispatch;
pub mod error;
pub mod labeler;
pub mod model;
pub mod pipeline;

pub use catalog::CatalogLabeler;
pub use combiner::{combine, ScoredTopic, TopicCombiner};
pub use dispatch::{LabelDispatcher, LabelResult};
pub use error::LabelError;
pub use labeler::{DocumentLabeler, GraphLabeler};
pub use model::{LabelledTopicModel, PrecomputedTopicModel, TopicDistribution, TopicModel};
pub use pipeline::{DocumentTopics, TopicPipeline};
