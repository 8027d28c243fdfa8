//! # topic-graph
//!
//! Knowledge-graph side of topic labelling.
//!
//! A document's linked entities seed a bounded neighbourhood crawl
//! ([`GraphBuilder`]). The crawled graph is reduced to its largest connected
//! component ([`largest_component`]) and the non-seed nodes are ranked by a
//! [`Centrality`] algorithm ([`rank`]). The top-ranked nodes are the
//! document's label candidates.

pub mod builder;
pub mod centrality;
pub mod components;
pub mod error;
pub mod graph;
pub mod ranker;

pub use builder::{CrawlConfig, GraphBuilder};
pub use centrality::{
    centrality_for, Centrality, CentralityScores, ClosenessCentrality, DegreeCentrality,
    FnCentrality, InformationCentrality,
};
pub use components::{connected_components, is_connected, largest_component};
pub use error::GraphError;
pub use graph::NeighborhoodGraph;
pub use ranker::{rank, CentralityRanker, RankedNode};
