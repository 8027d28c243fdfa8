//! Statistical topic model adapters.
//!
//! The topic model itself is an external collaborator. [`TopicModel`] is the
//! capability it exposes; [`LabelledTopicModel`] maps its topic indices onto
//! a catalogue of labelled topics.

use std::collections::HashMap;
use std::sync::Arc;

use topic_types::{Document, ModelTopicId, Topic, TopicSource};

use crate::error::LabelError;

/// Per-document topic distribution as (topic index, probability).
pub type TopicDistribution = Vec<(ModelTopicId, f64)>;

/// A trained topic model.
pub trait TopicModel: Send + Sync {
    /// Number of topics the model produces.
    fn num_topics(&self) -> usize;

    /// Topic distribution for each document, in input order.
    fn transform(&self, documents: &[Document]) -> Result<Vec<TopicDistribution>, LabelError>;
}

/// Replays distributions that were computed ahead of time.
///
/// Distributions come from each document's `model_topics` unless an explicit
/// entry was registered for its id.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedTopicModel {
    num_topics: usize,
    distributions: HashMap<String, TopicDistribution>,
}

impl PrecomputedTopicModel {
    pub fn new(num_topics: usize) -> Self {
        Self {
            num_topics,
            distributions: HashMap::new(),
        }
    }

    /// Register the distribution for a document id.
    pub fn with_distribution(mut self, document_id: impl Into<String>, distribution: TopicDistribution) -> Self {
        self.distributions.insert(document_id.into(), distribution);
        self
    }
}

impl TopicModel for PrecomputedTopicModel {
    fn num_topics(&self) -> usize {
        self.num_topics
    }

    fn transform(&self, documents: &[Document]) -> Result<Vec<TopicDistribution>, LabelError> {
        Ok(documents
            .iter()
            .map(|doc| {
                self.distributions
                    .get(&doc.id)
                    .cloned()
                    .unwrap_or_else(|| doc.model_topics.clone())
            })
            .collect())
    }
}

/// Topic model whose topics carry human-readable labels.
pub struct LabelledTopicModel {
    model: Arc<dyn TopicModel>,
    catalog: Vec<Topic>,
    num_topics_returned: usize,
}

impl LabelledTopicModel {
    /// Pair a model with one catalogue topic per model topic.
    pub fn new(
        model: Arc<dyn TopicModel>,
        catalog: Vec<Topic>,
        num_topics_returned: usize,
    ) -> Result<Self, LabelError> {
        if model.num_topics() != catalog.len() {
            return Err(LabelError::InvalidConfig(format!(
                "model has {} topics but the catalogue has {}",
                model.num_topics(),
                catalog.len()
            )));
        }
        Ok(Self {
            model,
            catalog,
            num_topics_returned,
        })
    }

    pub fn catalog(&self) -> &[Topic] {
        &self.catalog
    }

    /// Best catalogue topics for each document.
    ///
    /// Each topic is a fresh copy scored with the document's posterior, so
    /// the catalogue entries are never modified.
    pub fn topics_for(&self, documents: &[Document]) -> Result<Vec<Vec<Topic>>, LabelError> {
        let distributions = self.model.transform(documents)?;
        if distributions.len() != documents.len() {
            return Err(LabelError::InvalidInput(format!(
                "topic model returned {} distributions for {} documents",
                distributions.len(),
                documents.len()
            )));
        }

        distributions
            .into_iter()
            .map(|distribution| self.best_topics(distribution))
            .collect()
    }

    fn best_topics(&self, mut distribution: TopicDistribution) -> Result<Vec<Topic>, LabelError> {
        // Stable, so equal posteriors keep the model's order
        distribution.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut topics = Vec::with_capacity(self.num_topics_returned);
        for (index, score) in distribution.into_iter().take(self.num_topics_returned) {
            let canonical = self
                .catalog
                .get(index)
                .ok_or_else(|| LabelError::InvalidInput(format!("unknown model topic {index}")))?;
            topics.push(Topic {
                source: TopicSource::Model,
                ..canonical.with_score(score)
            });
        }
        Ok(topics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Topic> {
        ["virology", "epidemiology", "genomics"]
            .iter()
            .map(|l| Topic::new(*l, None, "", 0.0, TopicSource::Model))
            .collect()
    }

    fn doc(id: &str, model_topics: TopicDistribution) -> Document {
        Document {
            model_topics,
            ..Document::new(id, "")
        }
    }

    #[test]
    fn test_catalogue_size_must_match() {
        let model = Arc::new(PrecomputedTopicModel::new(2));
        let err = LabelledTopicModel::new(model, catalog(), 3).err().unwrap();
        assert!(matches!(err, LabelError::InvalidConfig(_)));
    }

    #[test]
    fn test_best_topics_are_fresh_copies() {
        let model = Arc::new(PrecomputedTopicModel::new(3));
        let labelled = LabelledTopicModel::new(model, catalog(), 2).unwrap();
        let docs = vec![
            doc("a", vec![(0, 0.1), (1, 0.6), (2, 0.3)]),
            doc("b", vec![(2, 0.9), (0, 0.1)]),
        ];

        let topics = labelled.topics_for(&docs).unwrap();

        let first: Vec<(&str, f64)> = topics[0].iter().map(|t| (t.label.as_str(), t.score)).collect();
        assert_eq!(first, vec![("epidemiology", 0.6), ("genomics", 0.3)]);
        assert_eq!(topics[1][0].label, "genomics");
        assert_eq!(topics[1][0].score, 0.9);
        assert!(labelled.catalog().iter().all(|t| t.score == 0.0));
    }

    #[test]
    fn test_explicit_distribution_wins() {
        let model = PrecomputedTopicModel::new(3).with_distribution("a", vec![(2, 1.0)]);
        let labelled = LabelledTopicModel::new(Arc::new(model), catalog(), 1).unwrap();

        let topics = labelled.topics_for(&[doc("a", vec![(0, 1.0)])]).unwrap();
        assert_eq!(topics[0][0].label, "genomics");
    }

    #[test]
    fn test_unknown_topic_index() {
        let labelled = LabelledTopicModel::new(Arc::new(PrecomputedTopicModel::new(3)), catalog(), 3).unwrap();
        let err = labelled.topics_for(&[doc("a", vec![(7, 0.5)])]).unwrap_err();
        assert!(matches!(err, LabelError::InvalidInput(_)));
    }
}
