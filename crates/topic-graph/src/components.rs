//! Connected-component reduction.

use petgraph::graph::NodeIndex;
use petgraph::visit::Bfs;

use topic_types::EntityId;

use crate::error::GraphError;
use crate::graph::NeighborhoodGraph;

/// Node sets of each connected component, ordered by their earliest node.
fn component_indices(graph: &NeighborhoodGraph) -> Vec<Vec<NodeIndex>> {
    let inner = graph.inner();
    let mut seen = vec![false; inner.node_count()];
    let mut components = Vec::new();

    for start in inner.node_indices() {
        if seen[start.index()] {
            continue;
        }
        let mut members = Vec::new();
        let mut bfs = Bfs::new(inner, start);
        while let Some(ix) = bfs.next(inner) {
            seen[ix.index()] = true;
            members.push(ix);
        }
        members.sort_unstable();
        components.push(members);
    }
    components
}

/// Connected components as identifier lists, in insertion order.
pub fn connected_components(graph: &NeighborhoodGraph) -> Vec<Vec<EntityId>> {
    let inner = graph.inner();
    component_indices(graph)
        .into_iter()
        .map(|members| members.iter().map(|&ix| inner[ix].id.clone()).collect())
        .collect()
}

/// Whether every node is reachable from every other. An empty graph is not.
pub fn is_connected(graph: &NeighborhoodGraph) -> bool {
    !graph.is_empty() && component_indices(graph).len() == 1
}

/// Induced subgraph on the largest connected component.
///
/// Ties go to the component containing the earliest-inserted node.
pub fn largest_component(graph: &NeighborhoodGraph) -> Result<NeighborhoodGraph, GraphError> {
    let mut largest: Option<Vec<NodeIndex>> = None;
    for members in component_indices(graph) {
        if largest.as_ref().map_or(true, |l| members.len() > l.len()) {
            largest = Some(members);
        }
    }

    let members = largest.ok_or(GraphError::EmptyGraph)?;
    Ok(graph.induced(&members))
}

#[cfg(test)]
mod tests {
    use super::*;
    use topic_types::Entity;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> NeighborhoodGraph {
        let mut g = NeighborhoodGraph::new();
        for id in nodes {
            g.add_entity(Entity::new(*id, *id, "", 0));
        }
        for (a, b) in edges {
            g.add_edge(a, b);
        }
        g
    }

    #[test]
    fn test_empty_graph_is_error() {
        let err = largest_component(&NeighborhoodGraph::new()).unwrap_err();
        assert!(matches!(err, GraphError::EmptyGraph));
    }

    #[test]
    fn test_keeps_largest_component() {
        let g = graph(
            &["A", "B", "C", "D", "E"],
            &[("A", "B"), ("C", "D"), ("D", "E")],
        );
        let lcc = largest_component(&g).unwrap();
        assert_eq!(lcc.ids(), vec!["C", "D", "E"]);
        assert_eq!(lcc.edge_count(), 2);
    }

    #[test]
    fn test_tie_goes_to_first_component() {
        let g = graph(&["A", "B", "C", "D"], &[("C", "D"), ("A", "B")]);
        let lcc = largest_component(&g).unwrap();
        assert_eq!(lcc.ids(), vec!["A", "B"]);
    }

    #[test]
    fn test_isolated_nodes_pick_first() {
        let g = graph(&["Q42", "Q5"], &[]);
        let lcc = largest_component(&g).unwrap();
        assert_eq!(lcc.ids(), vec!["Q42"]);
    }

    #[test]
    fn test_connected_graph_is_unchanged() {
        let g = graph(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let lcc = largest_component(&g).unwrap();
        assert_eq!(lcc.ids(), g.ids());
        assert_eq!(lcc.edges(), g.edges());
    }

    #[test]
    fn test_connected_components_listing() {
        let g = graph(&["A", "B", "C"], &[("A", "C")]);
        assert_eq!(
            connected_components(&g),
            vec![vec!["A".to_string(), "C".to_string()], vec!["B".to_string()]]
        );
        assert!(!is_connected(&g));
        assert!(!is_connected(&NeighborhoodGraph::new()));
    }
}
