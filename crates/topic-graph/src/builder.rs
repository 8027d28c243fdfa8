//! Bounded neighbourhood crawl over a knowledge base.
//!
//! Starting from a set of seed entities the crawl follows the configured
//! relations depth first, one hop at a time, until `max_hops` is reached.
//! Each visited entity becomes a node and each followed relation an
//! undirected edge. Seeds are processed in input order and every seed runs
//! to completion before the next one starts.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, instrument, trace};

use topic_kb::KnowledgeBase;
use topic_types::{CrawlSettings, Entity, EntityId, RelationKey};

use crate::error::GraphError;
use crate::graph::NeighborhoodGraph;

/// Crawl parameters.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum distance from a seed
    pub max_hops: u32,
    /// Relation predicates to follow, in priority order
    pub relations: Vec<RelationKey>,
    /// Entities never visited (and never looked up)
    pub excluded: HashSet<EntityId>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::from(&CrawlSettings::default())
    }
}

impl From<&CrawlSettings> for CrawlConfig {
    fn from(settings: &CrawlSettings) -> Self {
        Self {
            max_hops: settings.max_hops,
            relations: settings.expanded_relations(),
            excluded: settings.excluded_entities.iter().cloned().collect(),
        }
    }
}

/// A pending visit: entity, the node it was reached from, and its distance.
struct Visit {
    id: EntityId,
    predecessor: Option<EntityId>,
    hop: u32,
}

/// Builds neighbourhood graphs from seed entities.
pub struct GraphBuilder {
    kb: Arc<dyn KnowledgeBase>,
    config: CrawlConfig,
}

impl GraphBuilder {
    pub fn new(kb: Arc<dyn KnowledgeBase>, config: CrawlConfig) -> Self {
        Self { kb, config }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawl the neighbourhood of `seeds`.
    ///
    /// An entity is recorded with the hop of its first visit. Revisiting it
    /// through another path adds the edge from that path and expands it
    /// again at the new depth, but never repeats its detail lookup. Excluded
    /// entities and anything beyond `max_hops` are skipped before any
    /// lookup is made.
    ///
    /// Any lookup failure aborts the crawl; no partial graph is returned.
    #[instrument(skip(self, seeds), fields(seeds = seeds.len(), max_hops = self.config.max_hops))]
    pub async fn build(&self, seeds: &[EntityId]) -> Result<NeighborhoodGraph, GraphError> {
        let language = self.kb.language().to_string();
        let mut graph = NeighborhoodGraph::new();
        // Expansion targets per visited node, so revisits need no lookup
        let mut targets: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
        let mut stack: Vec<Visit> = Vec::new();

        for seed in seeds {
            stack.push(Visit {
                id: seed.clone(),
                predecessor: None,
                hop: 0,
            });

            while let Some(visit) = stack.pop() {
                if visit.hop > self.config.max_hops || self.config.excluded.contains(&visit.id) {
                    trace!(entity_id = %visit.id, hop = visit.hop, "Skipping entity");
                    continue;
                }

                if !graph.contains(&visit.id) {
                    debug!(entity_id = %visit.id, hop = visit.hop, "Visiting entity");
                    let detail = self.kb.entity(&visit.id).await?;
                    graph.add_entity(Entity::new(
                        visit.id.clone(),
                        detail.label(&language),
                        detail.description(&language),
                        visit.hop,
                    ));
                    targets.insert(
                        visit.id.clone(),
                        detail.expansion_targets(&self.config.relations),
                    );
                }

                if let Some(predecessor) = &visit.predecessor {
                    graph.add_edge(predecessor, &visit.id);
                }

                if visit.hop == self.config.max_hops {
                    continue;
                }

                // Reverse push so the first target is expanded first
                if let Some(children) = targets.get(&visit.id) {
                    for child in children.iter().rev() {
                        stack.push(Visit {
                            id: child.clone(),
                            predecessor: Some(visit.id.clone()),
                            hop: visit.hop + 1,
                        });
                    }
                }
            }
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built neighbourhood graph"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topic_kb::{EntityDetail, InMemoryKnowledgeBase};

    fn config(max_hops: u32) -> CrawlConfig {
        CrawlConfig {
            max_hops,
            relations: vec!["P31".to_string(), "P279".to_string()],
            excluded: ["Q4167836".to_string()].into_iter().collect(),
        }
    }

    fn seeds(ids: &[&str]) -> Vec<EntityId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn adams_kb() -> InMemoryKnowledgeBase {
        InMemoryKnowledgeBase::new()
            .with_entity(
                EntityDetail::new("Q42")
                    .with_label("en", "Douglas Adams")
                    .with_description("en", "English writer")
                    .with_relation("P31", "Q5"),
            )
            .with_entity(
                EntityDetail::new("Q5")
                    .with_label("en", "human")
                    .with_relation("P279", "Q215627"),
            )
            .with_entity(EntityDetail::new("Q215627").with_label("en", "person"))
    }

    #[tokio::test]
    async fn test_single_hop_crawl() {
        let kb = Arc::new(adams_kb());
        let builder = GraphBuilder::new(kb, config(1));

        let graph = builder.build(&seeds(&["Q42"])).await.unwrap();

        assert_eq!(graph.ids(), vec!["Q42", "Q5"]);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge("Q42", "Q5"));
        let adams = graph.entity("Q42").unwrap();
        assert_eq!(adams.label, "Douglas Adams");
        assert_eq!(adams.description, "English writer");
        assert_eq!(adams.hop, 0);
        assert_eq!(graph.entity("Q5").unwrap().hop, 1);
    }

    #[tokio::test]
    async fn test_zero_hops_keeps_only_seeds() {
        let kb = Arc::new(adams_kb());
        let builder = GraphBuilder::new(kb.clone(), config(0));

        let graph = builder.build(&seeds(&["Q42", "Q5"])).await.unwrap();

        assert_eq!(graph.ids(), vec!["Q42", "Q5"]);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(kb.entity_calls("Q215627"), 0);
    }

    #[tokio::test]
    async fn test_two_hops_follows_chain() {
        let kb = Arc::new(adams_kb());
        let builder = GraphBuilder::new(kb, config(2));

        let graph = builder.build(&seeds(&["Q42"])).await.unwrap();

        assert_eq!(graph.ids(), vec!["Q42", "Q5", "Q215627"]);
        assert_eq!(graph.entity("Q215627").unwrap().hop, 2);
        assert!(graph.has_edge("Q5", "Q215627"));
        assert!(!graph.has_edge("Q42", "Q215627"));
    }

    #[tokio::test]
    async fn test_excluded_entity_is_never_looked_up() {
        let kb = Arc::new(
            InMemoryKnowledgeBase::new()
                .with_entity(
                    EntityDetail::new("Q1")
                        .with_relation("P31", "Q4167836")
                        .with_relation("P31", "Q2"),
                )
                .with_entity(EntityDetail::new("Q2")),
        );
        let builder = GraphBuilder::new(kb.clone(), config(2));

        let graph = builder.build(&seeds(&["Q1"])).await.unwrap();

        assert!(!graph.contains("Q4167836"));
        assert_eq!(kb.entity_calls("Q4167836"), 0);
        assert_eq!(graph.ids(), vec!["Q1", "Q2"]);
    }

    #[tokio::test]
    async fn test_excluded_seed_is_skipped() {
        let kb = Arc::new(adams_kb());
        let builder = GraphBuilder::new(kb.clone(), config(1));

        let graph = builder.build(&seeds(&["Q4167836"])).await.unwrap();
        assert!(graph.is_empty());
        assert_eq!(kb.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_aborts_crawl() {
        let kb = Arc::new(adams_kb().failing_on("Q5"));
        let builder = GraphBuilder::new(kb, config(2));

        let err = builder.build(&seeds(&["Q42"])).await.unwrap_err();
        assert!(matches!(err, GraphError::Kb(e) if e.is_lookup_failure()));
    }

    #[tokio::test]
    async fn test_unfollowed_relation_is_ignored() {
        let kb = Arc::new(
            InMemoryKnowledgeBase::new()
                .with_entity(
                    EntityDetail::new("Q1")
                        .with_relation("P17", "Q30")
                        .with_relation("P279", "Q2"),
                )
                .with_entity(EntityDetail::new("Q2")),
        );
        let builder = GraphBuilder::new(kb.clone(), config(1));

        let graph = builder.build(&seeds(&["Q1"])).await.unwrap();
        assert_eq!(graph.ids(), vec!["Q1", "Q2"]);
        assert_eq!(kb.entity_calls("Q30"), 0);
    }

    #[tokio::test]
    async fn test_revisit_keeps_first_hop_and_adds_edge() {
        // Q1 -> Q2 -> Q3 and Q1 -> Q3
        let kb = Arc::new(
            InMemoryKnowledgeBase::new()
                .with_entity(
                    EntityDetail::new("Q1")
                        .with_relation("P279", "Q2")
                        .with_relation("P279", "Q3"),
                )
                .with_entity(EntityDetail::new("Q2").with_relation("P279", "Q3"))
                .with_entity(EntityDetail::new("Q3")),
        );
        let builder = GraphBuilder::new(kb.clone(), config(2));

        let graph = builder.build(&seeds(&["Q1"])).await.unwrap();

        // Depth first: Q3 is first reached through Q2 at hop 2
        assert_eq!(graph.ids(), vec!["Q1", "Q2", "Q3"]);
        assert_eq!(graph.entity("Q3").unwrap().hop, 2);
        assert!(graph.has_edge("Q1", "Q3"));
        assert!(graph.has_edge("Q2", "Q3"));
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(kb.entity_calls("Q3"), 1);
    }

    #[tokio::test]
    async fn test_shared_seeds_merge_into_one_graph() {
        let kb = Arc::new(
            adams_kb().with_entity(
                EntityDetail::new("Q1035")
                    .with_label("en", "Charles Darwin")
                    .with_relation("P31", "Q5"),
            ),
        );
        let builder = GraphBuilder::new(kb.clone(), config(1));

        let graph = builder.build(&seeds(&["Q42", "Q1035"])).await.unwrap();

        assert_eq!(graph.ids(), vec!["Q42", "Q5", "Q1035"]);
        assert!(graph.has_edge("Q1035", "Q5"));
        assert_eq!(kb.entity_calls("Q5"), 1);
    }

    #[tokio::test]
    async fn test_build_is_deterministic() {
        let kb = Arc::new(adams_kb());
        let builder = GraphBuilder::new(kb, config(2));

        let first = builder.build(&seeds(&["Q42", "Q5"])).await.unwrap();
        let second = builder.build(&seeds(&["Q42", "Q5"])).await.unwrap();

        assert_eq!(first.ids(), second.ids());
        assert_eq!(first.edges(), second.edges());
    }

    #[tokio::test]
    async fn test_seed_cycle_has_no_self_loop() {
        let kb = Arc::new(
            InMemoryKnowledgeBase::new()
                .with_entity(EntityDetail::new("Q1").with_relation("P279", "Q1")),
        );
        let builder = GraphBuilder::new(kb, config(2));

        let graph = builder.build(&seeds(&["Q1"])).await.unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }
}
