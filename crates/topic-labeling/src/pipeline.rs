//! End-to-end topic extraction for a batch of documents.
//!
//! Topic-model topics and graph-labelled entity topics are gathered for
//! every document and merged by the [`TopicCombiner`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use topic_kb::{EntityResolver, KnowledgeBase};
use topic_types::{Document, Settings};

use crate::combiner::{ScoredTopic, TopicCombiner};
use crate::dispatch::LabelDispatcher;
use crate::error::LabelError;
use crate::labeler::GraphLabeler;
use crate::model::LabelledTopicModel;

/// Final topics of one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentTopics {
    pub document_id: String,
    /// Best first; empty when labelling failed
    pub topics: Vec<ScoredTopic>,
    /// Why labelling failed, if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentTopics {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Topic model, graph labeller and combiner wired together.
pub struct TopicPipeline {
    model: Option<LabelledTopicModel>,
    dispatcher: LabelDispatcher,
    combiner: TopicCombiner,
}

impl TopicPipeline {
    pub fn new(
        model: Option<LabelledTopicModel>,
        dispatcher: LabelDispatcher,
        combiner: TopicCombiner,
    ) -> Self {
        Self {
            model,
            dispatcher,
            combiner,
        }
    }

    /// Build the whole pipeline over a knowledge base from settings.
    pub fn from_settings(
        kb: Arc<dyn KnowledgeBase>,
        settings: &Settings,
        model: Option<LabelledTopicModel>,
    ) -> Self {
        let resolver = Arc::new(EntityResolver::new(kb));
        let labeler = GraphLabeler::from_settings(resolver, settings);
        let dispatcher = LabelDispatcher::new(Arc::new(labeler), settings.dispatch.workers);
        Self::new(model, dispatcher, TopicCombiner::from_settings(&settings.combiner))
    }

    pub fn dispatcher(&self) -> &LabelDispatcher {
        &self.dispatcher
    }

    /// Extract topics for every document, in input order.
    ///
    /// Only a topic-model failure fails the whole batch. A document whose
    /// entity labelling failed gets no topics and an error record.
    pub async fn run(&self, documents: &[Document]) -> Result<Vec<DocumentTopics>, LabelError> {
        let model_topics = match &self.model {
            Some(model) => model.topics_for(documents)?,
            None => vec![Vec::new(); documents.len()],
        };

        let entity_results = self
            .dispatcher
            .label_all(documents.iter().map(Document::to_entities).collect())
            .await;

        let output: Vec<DocumentTopics> = documents
            .iter()
            .zip(model_topics)
            .zip(entity_results)
            .map(|((document, mut candidates), entity_topics)| match entity_topics {
                Ok(entity_topics) => {
                    candidates.extend(entity_topics);
                    DocumentTopics {
                        document_id: document.id.clone(),
                        topics: self.combiner.combine(&candidates),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(document_id = %document.id, error = %e, "Failed to label document");
                    DocumentTopics {
                        document_id: document.id.clone(),
                        topics: Vec::new(),
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect();

        let failed = output.iter().filter(|d| d.is_failed()).count();
        info!(documents = output.len(), failed, "Topic extraction finished");
        Ok(output)
    }
}
