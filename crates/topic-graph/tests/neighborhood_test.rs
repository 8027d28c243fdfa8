//! Crawl, reduce and rank against an in-memory knowledge base.

use std::collections::HashSet;
use std::sync::Arc;

use topic_graph::{
    is_connected, largest_component, rank, CrawlConfig, GraphBuilder, InformationCentrality,
};
use topic_kb::{EntityDetail, InMemoryKnowledgeBase};
use topic_types::{CrawlSettings, EntityId};

fn ids(v: &[&str]) -> Vec<EntityId> {
    v.iter().map(|s| s.to_string()).collect()
}

/// Two seeds about viruses sharing a parent class, plus an unrelated seed.
fn virology_kb() -> InMemoryKnowledgeBase {
    InMemoryKnowledgeBase::new()
        .with_entity(
            EntityDetail::new("Q82069695")
                .with_label("en", "SARS-CoV-2")
                .with_relation("P31", "Q808")
                .with_relation("P31", "Q4167836"),
        )
        .with_entity(
            EntityDetail::new("Q2840")
                .with_label("en", "influenza")
                .with_relation("P279", "Q808"),
        )
        .with_entity(
            EntityDetail::new("Q808")
                .with_label("en", "virus")
                .with_description("en", "infectious agent")
                .with_relation("P279", "Q1463"),
        )
        .with_entity(EntityDetail::new("Q1463").with_label("en", "pathogen"))
        .with_entity(EntityDetail::new("Q11862829").with_label("en", "academic discipline"))
}

#[tokio::test]
async fn test_single_relation_scenario() {
    let kb = Arc::new(
        InMemoryKnowledgeBase::new()
            .with_entity(EntityDetail::new("Q42").with_relation("P31", "Q5"))
            .with_entity(EntityDetail::new("Q5").with_label("en", "human")),
    );
    let config = CrawlConfig {
        max_hops: 1,
        relations: ids(&["P31"]),
        excluded: HashSet::new(),
    };
    let graph = GraphBuilder::new(kb, config)
        .build(&ids(&["Q42"]))
        .await
        .unwrap();

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.entity("Q42").unwrap().hop, 0);
    assert_eq!(graph.entity("Q5").unwrap().hop, 1);

    // The only non-seed node is stopped, nothing is left to rank
    let lcc = largest_component(&graph).unwrap();
    let stop: HashSet<EntityId> = ids(&["Q5"]).into_iter().collect();
    assert!(rank(&lcc, &InformationCentrality, &stop, 5).unwrap().is_empty());
}

#[tokio::test]
async fn test_shared_parent_ranks_first() {
    let kb = Arc::new(virology_kb());
    let settings = CrawlSettings::default();
    let builder = GraphBuilder::new(kb.clone(), CrawlConfig::from(&settings));

    let graph = builder
        .build(&ids(&["Q82069695", "Q2840", "Q11862829"]))
        .await
        .unwrap();
    assert_eq!(graph.node_count(), 5);
    assert_eq!(kb.entity_calls("Q4167836"), 0);

    let lcc = largest_component(&graph).unwrap();
    assert!(is_connected(&lcc));
    assert!(!lcc.contains("Q11862829"));

    let ranked = rank(&lcc, &InformationCentrality, &HashSet::new(), 2).unwrap();
    let labels: Vec<&str> = ranked.iter().map(|r| r.entity.label.as_str()).collect();
    assert_eq!(labels, vec!["virus", "pathogen"]);
    assert_eq!(ranked[0].entity.description, "infectious agent");
    assert!(ranked[0].score > ranked[1].score);
}

#[tokio::test]
async fn test_rebuild_gives_identical_graph() {
    let kb = Arc::new(virology_kb());
    let builder = GraphBuilder::new(kb, CrawlConfig::default());
    let seeds = ids(&["Q2840", "Q82069695"]);

    let a = builder.build(&seeds).await.unwrap();
    let b = builder.build(&seeds).await.unwrap();

    assert_eq!(a.ids(), b.ids());
    assert_eq!(a.edges(), b.edges());
    let hops_a: Vec<u32> = a.entities().map(|e| e.hop).collect();
    let hops_b: Vec<u32> = b.entities().map(|e| e.hop).collect();
    assert_eq!(hops_a, hops_b);
}
