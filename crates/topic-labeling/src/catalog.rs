//! Labelling of topic-model topics from their top terms.
//!
//! The top terms of a model topic are treated like the entity mentions of a
//! document: resolved, crawled and ranked. The best label becomes that
//! topic's catalogue entry.

use tracing::warn;

use topic_types::{DocumentEntities, Topic, TopicSource};

use crate::dispatch::LabelDispatcher;

/// Builds a topic catalogue for a topic model.
pub struct CatalogLabeler {
    dispatcher: LabelDispatcher,
}

impl CatalogLabeler {
    pub fn new(dispatcher: LabelDispatcher) -> Self {
        Self { dispatcher }
    }

    /// One catalogue topic per entry of `topic_terms`, in the same order.
    ///
    /// A model topic whose terms yield no label (or whose labelling failed)
    /// falls back to its joined terms with no backing entity.
    pub async fn label_catalog(&self, topic_terms: &[Vec<String>]) -> Vec<Topic> {
        let work: Vec<DocumentEntities> = topic_terms
            .iter()
            .enumerate()
            .map(|(i, terms)| DocumentEntities::from_surfaces(format!("topic-{i}"), terms.iter().cloned()))
            .collect();

        let results = self.dispatcher.label_all(work).await;

        results
            .into_iter()
            .zip(topic_terms)
            .enumerate()
            .map(|(i, (result, terms))| {
                let best = match result {
                    Ok(topics) => topics.into_iter().next(),
                    Err(e) => {
                        warn!(topic = i, error = %e, "Could not label model topic");
                        None
                    }
                };
                match best {
                    Some(topic) => Topic {
                        score: 0.0,
                        source: TopicSource::Model,
                        ..topic
                    },
                    None => Topic::new(terms.join(", "), None, "", 0.0, TopicSource::Model),
                }
            })
            .collect()
    }
}
