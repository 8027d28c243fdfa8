//! Graph-based labelling of a document's linked entities.
//!
//! Resolves the document's entity mentions, crawls their neighbourhood,
//! keeps the largest connected component and returns the most central
//! non-seed nodes as entity-linked topics.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use topic_graph::{
    centrality_for, largest_component, CentralityRanker, CrawlConfig, GraphBuilder, GraphError,
};
use topic_kb::EntityResolver;
use topic_types::{DocumentEntities, EntityId, Settings, Topic, TopicSource};

use crate::error::LabelError;

/// Labels one document at a time.
#[async_trait]
pub trait DocumentLabeler: Send + Sync {
    /// Label a document. Topics are ordered best first.
    async fn label(&self, document: &DocumentEntities) -> Result<Vec<Topic>, LabelError>;
}

/// Labeller backed by the neighbourhood graph of the document's entities.
pub struct GraphLabeler {
    resolver: Arc<EntityResolver>,
    builder: GraphBuilder,
    ranker: CentralityRanker,
}

impl GraphLabeler {
    /// Create a labeller from its parts.
    pub fn new(resolver: Arc<EntityResolver>, builder: GraphBuilder, ranker: CentralityRanker) -> Self {
        Self {
            resolver,
            builder,
            ranker,
        }
    }

    /// Create a labeller from settings, crawling the resolver's knowledge base.
    pub fn from_settings(resolver: Arc<EntityResolver>, settings: &Settings) -> Self {
        let builder = GraphBuilder::new(
            resolver.knowledge_base().clone(),
            CrawlConfig::from(&settings.crawl),
        );
        let stop_set: HashSet<EntityId> = settings.labeling.stop_entities.iter().cloned().collect();
        let ranker = CentralityRanker::new(
            Arc::from(centrality_for(settings.labeling.centrality)),
            stop_set,
            settings.labeling.num_labels_per_topic,
        );
        Self::new(resolver, builder, ranker)
    }

    /// Shared entity resolver.
    pub fn resolver(&self) -> &Arc<EntityResolver> {
        &self.resolver
    }

    #[instrument(skip(self, document), fields(document_id = %document.document_id))]
    async fn label_document(&self, document: &DocumentEntities) -> Result<Vec<Topic>, LabelError> {
        let linked = self.resolver.link(document).await?;
        let seeds = linked.resolved_ids();

        let unresolved = linked.entities.iter().filter(|e| e.entity_id.is_none()).count();
        if unresolved > 0 {
            debug!(unresolved, "Dropped entities with no knowledge-base match");
        }

        let graph = self.builder.build(&seeds).await?;
        let component = match largest_component(&graph) {
            Ok(component) => component,
            Err(GraphError::EmptyGraph) => {
                debug!("Nothing crawlable, no entity topics");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let ranked = self.ranker.rank(&component)?;
        debug!(
            seeds = seeds.len(),
            component_nodes = component.node_count(),
            labels = ranked.len(),
            "Labelled document"
        );

        Ok(ranked
            .iter()
            .map(|r| Topic::from_entity(&r.entity, r.score, TopicSource::EntityLinked))
            .collect())
    }
}

#[async_trait]
impl DocumentLabeler for GraphLabeler {
    async fn label(&self, document: &DocumentEntities) -> Result<Vec<Topic>, LabelError> {
        self.label_document(document).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topic_graph::InformationCentrality;
    use topic_kb::{EntityDetail, InMemoryKnowledgeBase};

    fn kb() -> InMemoryKnowledgeBase {
        InMemoryKnowledgeBase::new()
            .with_search_hit("Douglas Adams", "Q42")
            .with_search_hit("Charles Darwin", "Q1035")
            .with_entity(
                EntityDetail::new("Q42")
                    .with_label("en", "Douglas Adams")
                    .with_relation("P31", "Q5"),
            )
            .with_entity(
                EntityDetail::new("Q1035")
                    .with_label("en", "Charles Darwin")
                    .with_relation("P31", "Q5"),
            )
            .with_entity(
                EntityDetail::new("Q5")
                    .with_label("en", "human")
                    .with_description("en", "species"),
            )
    }

    fn labeler(kb: Arc<InMemoryKnowledgeBase>, stop: &[&str], top_n: usize) -> GraphLabeler {
        let resolver = Arc::new(EntityResolver::new(kb.clone()));
        let builder = GraphBuilder::new(
            kb,
            CrawlConfig {
                max_hops: 1,
                relations: vec!["P31".to_string()],
                excluded: HashSet::new(),
            },
        );
        let ranker = CentralityRanker::new(
            Arc::new(InformationCentrality),
            stop.iter().map(|s| s.to_string()).collect(),
            top_n,
        );
        GraphLabeler::new(resolver, builder, ranker)
    }

    #[tokio::test]
    async fn test_labels_shared_neighbour() {
        let labeler = labeler(Arc::new(kb()), &[], 1);
        let doc = DocumentEntities::from_surfaces("PMC1", ["Douglas Adams", "Charles Darwin"]);

        let topics = labeler.label(&doc).await.unwrap();

        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].label, "human");
        assert_eq!(topics[0].entity_id.as_deref(), Some("Q5"));
        assert_eq!(topics[0].description, "species");
        assert_eq!(topics[0].source, TopicSource::EntityLinked);
        assert!(topics[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_unresolvable_entities_give_no_topics() {
        let labeler = labeler(Arc::new(kb()), &[], 3);
        let doc = DocumentEntities::from_surfaces("PMC2", ["nothing here", "nor here"]);

        assert!(labeler.label(&doc).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stop_set_removes_label() {
        let labeler = labeler(Arc::new(kb()), &["Q5"], 5);
        let doc = DocumentEntities::from_surfaces("PMC3", ["Douglas Adams"]);

        assert!(labeler.label(&doc).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates() {
        let labeler = labeler(Arc::new(kb().failing_on("Q5")), &[], 1);
        let doc = DocumentEntities::from_surfaces("PMC4", ["Douglas Adams"]);

        let err = labeler.label(&doc).await.unwrap_err();
        assert!(err.is_lookup_failure());
    }

    #[tokio::test]
    async fn test_from_settings() {
        let kb = Arc::new(kb());
        let resolver = Arc::new(EntityResolver::new(kb.clone()));
        let mut settings = Settings::default();
        settings.crawl.max_hops = 1;
        settings.labeling.num_labels_per_topic = 2;

        let labeler = GraphLabeler::from_settings(resolver, &settings);
        let doc = DocumentEntities::from_surfaces("PMC5", ["Douglas Adams"]);
        let topics = labeler.label(&doc).await.unwrap();

        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].label, "human");
        assert_eq!(kb.search_calls("Douglas Adams"), 1);
    }
}
