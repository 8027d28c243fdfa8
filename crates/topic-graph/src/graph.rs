//! Undirected neighbourhood graph keyed by entity identifier.

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use topic_types::{Entity, EntityId};

/// Undirected graph of crawled entities.
///
/// At most one edge exists between any pair of nodes and there are no
/// self-loops. Nodes are never removed, so node order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct NeighborhoodGraph {
    graph: UnGraph<Entity, ()>,
    index: HashMap<EntityId, NodeIndex>,
}

impl NeighborhoodGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether an entity is a node.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Entity stored for an identifier.
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&ix| &self.graph[ix])
    }

    /// Insert an entity.
    ///
    /// Returns `false` and leaves the stored entity untouched if the id is
    /// already a node (first insertion wins).
    pub fn add_entity(&mut self, entity: Entity) -> bool {
        if self.index.contains_key(&entity.id) {
            return false;
        }
        let id = entity.id.clone();
        let ix = self.graph.add_node(entity);
        self.index.insert(id, ix);
        true
    }

    /// Insert an edge between two existing nodes.
    ///
    /// Returns `false` when the edge already exists, when `a == b`, or when
    /// either end is not a node.
    pub fn add_edge(&mut self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }
        let (Some(&ia), Some(&ib)) = (self.index.get(a), self.index.get(b)) else {
            return false;
        };
        if self.graph.find_edge(ia, ib).is_some() {
            return false;
        }
        self.graph.add_edge(ia, ib, ());
        true
    }

    /// Whether two nodes are adjacent.
    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&ia), Some(&ib)) => self.graph.find_edge(ia, ib).is_some(),
            _ => false,
        }
    }

    /// Entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.graph.node_indices().map(move |ix| &self.graph[ix])
    }

    /// Identifiers in insertion order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities().map(|e| e.id.clone()).collect()
    }

    /// Edges as identifier pairs, in insertion order.
    pub fn edges(&self) -> Vec<(EntityId, EntityId)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].id.clone(),
                    self.graph[e.target()].id.clone(),
                )
            })
            .collect()
    }

    pub(crate) fn inner(&self) -> &UnGraph<Entity, ()> {
        &self.graph
    }

    /// Subgraph induced by `nodes`, keeping their relative insertion order.
    pub(crate) fn induced(&self, nodes: &[NodeIndex]) -> NeighborhoodGraph {
        let mut sorted = nodes.to_vec();
        sorted.sort_unstable();

        let mut sub = NeighborhoodGraph::new();
        for &ix in &sorted {
            sub.add_entity(self.graph[ix].clone());
        }
        for edge in self.graph.edge_references() {
            let a = &self.graph[edge.source()].id;
            let b = &self.graph[edge.target()].id;
            if sub.contains(a) && sub.contains(b) {
                sub.add_edge(a, b);
            }
        }
        sub
    }
}
