//! Merging of topic-model and entity-linked topics.

use serde::Serialize;

use topic_types::{CombinerSettings, Topic, TopicSource};

/// A topic with its source-weighted score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTopic {
    /// Copy of the candidate, raw score untouched
    pub topic: Topic,
    pub weighted_score: f64,
}

/// Ranks a document's candidate topics on a common, weighted scale.
#[derive(Debug, Clone)]
pub struct TopicCombiner {
    max_num_topics: usize,
    weight_ner: f64,
    weight_model: f64,
}

impl TopicCombiner {
    pub fn new(max_num_topics: usize, weight_ner: f64, weight_model: f64) -> Self {
        Self {
            max_num_topics,
            weight_ner,
            weight_model,
        }
    }

    pub fn from_settings(settings: &CombinerSettings) -> Self {
        Self::new(settings.max_num_topics, settings.weight_ner, settings.weight_model)
    }

    pub fn max_num_topics(&self) -> usize {
        self.max_num_topics
    }

    /// Multiplier applied to topics from `source`.
    pub fn weight_for(&self, source: TopicSource) -> f64 {
        match source {
            TopicSource::EntityLinked => self.weight_ner,
            TopicSource::Model => self.weight_model,
        }
    }

    /// Weight, sort descending (stable) and keep the best `max_num_topics`.
    pub fn combine(&self, topics: &[Topic]) -> Vec<ScoredTopic> {
        let mut scored: Vec<ScoredTopic> = topics
            .iter()
            .map(|topic| ScoredTopic {
                weighted_score: topic.score * self.weight_for(topic.source),
                topic: topic.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.weighted_score.total_cmp(&a.weighted_score));
        scored.truncate(self.max_num_topics);
        scored
    }
}

impl Default for TopicCombiner {
    fn default() -> Self {
        Self::from_settings(&CombinerSettings::default())
    }
}

/// Combine one document's topics into `(label, weighted_score)` pairs.
pub fn combine(
    topics: &[Topic],
    max_topics: usize,
    weight_ner: f64,
    weight_model: f64,
) -> Vec<(String, f64)> {
    TopicCombiner::new(max_topics, weight_ner, weight_model)
        .combine(topics)
        .into_iter()
        .map(|s| (s.topic.label, s.weighted_score))
        .collect()
}
