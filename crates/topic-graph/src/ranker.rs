//! Centrality ranking of crawled nodes.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use topic_types::{Entity, EntityId};

use crate::centrality::Centrality;
use crate::error::GraphError;
use crate::graph::NeighborhoodGraph;

/// A node with its centrality score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedNode {
    pub entity: Entity,
    pub score: f64,
}

/// Rank the non-seed nodes of `graph` by centrality.
///
/// Seeds (hop 0) and stop-set entities are never returned. Ties keep node
/// insertion order. At most `top_n` nodes are returned.
pub fn rank(
    graph: &NeighborhoodGraph,
    algorithm: &dyn Centrality,
    stop_set: &HashSet<EntityId>,
    top_n: usize,
) -> Result<Vec<RankedNode>, GraphError> {
    let scores = algorithm.compute(graph)?;

    let mut ranked: Vec<RankedNode> = scores
        .into_iter()
        .filter_map(|(id, score)| {
            let entity = graph.entity(&id)?;
            if entity.is_seed() || stop_set.contains(&id) {
                return None;
            }
            Some(RankedNode {
                entity: entity.clone(),
                score,
            })
        })
        .collect();

    // Stable sort keeps insertion order among equal scores
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(top_n);

    debug!(
        algorithm = algorithm.name(),
        candidates = graph.node_count(),
        returned = ranked.len(),
        "Ranked graph nodes"
    );
    Ok(ranked)
}

/// Ranking parameters bundled for reuse across documents.
#[derive(Clone)]
pub struct CentralityRanker {
    algorithm: Arc<dyn Centrality>,
    stop_set: HashSet<EntityId>,
    top_n: usize,
}

impl CentralityRanker {
    pub fn new(algorithm: Arc<dyn Centrality>, stop_set: HashSet<EntityId>, top_n: usize) -> Self {
        Self {
            algorithm,
            stop_set,
            top_n,
        }
    }

    pub fn algorithm(&self) -> &dyn Centrality {
        self.algorithm.as_ref()
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Rank with the bundled parameters.
    pub fn rank(&self, graph: &NeighborhoodGraph) -> Result<Vec<RankedNode>, GraphError> {
        rank(graph, self.algorithm.as_ref(), &self.stop_set, self.top_n)
    }
}
