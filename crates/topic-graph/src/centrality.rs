//! Node centrality algorithms.
//!
//! Every algorithm maps each node of a graph to a non-negative score, higher
//! meaning more central. The default is information (current-flow
//! closeness) centrality, which is only defined on connected graphs.

use std::collections::VecDeque;

use ndarray::Array2;
use petgraph::visit::EdgeRef;

use topic_types::{CentralityKind, EntityId};

use crate::components::is_connected;
use crate::error::GraphError;
use crate::graph::NeighborhoodGraph;

/// Pivot magnitude below which the grounded Laplacian is treated as singular.
const PIVOT_EPSILON: f64 = 1e-12;

/// Scores keyed by entity id, in node insertion order.
pub type CentralityScores = Vec<(EntityId, f64)>;

/// A centrality algorithm.
pub trait Centrality: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Score every node of `graph`.
    fn compute(&self, graph: &NeighborhoodGraph) -> Result<CentralityScores, GraphError>;
}

/// Build the algorithm selected in configuration.
pub fn centrality_for(kind: CentralityKind) -> Box<dyn Centrality> {
    match kind {
        CentralityKind::Information => Box::new(InformationCentrality),
        CentralityKind::Closeness => Box::new(ClosenessCentrality),
        CentralityKind::Degree => Box::new(DegreeCentrality),
    }
}

/// Adapter turning a plain function into a [`Centrality`].
pub struct FnCentrality<F> {
    name: &'static str,
    f: F,
}

impl<F> FnCentrality<F>
where
    F: Fn(&NeighborhoodGraph) -> Result<CentralityScores, GraphError> + Send + Sync,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> Centrality for FnCentrality<F>
where
    F: Fn(&NeighborhoodGraph) -> Result<CentralityScores, GraphError> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn compute(&self, graph: &NeighborhoodGraph) -> Result<CentralityScores, GraphError> {
        (self.f)(graph)
    }
}

/// Information centrality (Stephenson and Zelen).
///
/// With `C` the inverse of the Laplacian grounded at the first node (zero
/// row and column for that node), the score of `v` is the reciprocal of the
/// sum of effective resistances to every node:
///
/// `score(v) = 1 / (n * C[v][v] + trace(C) - 2 * sum_w C[v][w])`
///
/// A single-node graph scores 0.0. Disconnected graphs are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct InformationCentrality;

impl Centrality for InformationCentrality {
    fn name(&self) -> &'static str {
        "information"
    }

    fn compute(&self, graph: &NeighborhoodGraph) -> Result<CentralityScores, GraphError> {
        let n = graph.node_count();
        if n == 0 {
            return Ok(Vec::new());
        }
        let ids = graph.ids();
        if n == 1 {
            return Ok(vec![(ids[0].clone(), 0.0)]);
        }
        if !is_connected(graph) {
            return Err(GraphError::NotConnected);
        }

        // Laplacian with row and column 0 removed
        let mut reduced = Array2::<f64>::zeros((n - 1, n - 1));
        for edge in graph.inner().edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            if a > 0 {
                reduced[[a - 1, a - 1]] += 1.0;
            }
            if b > 0 {
                reduced[[b - 1, b - 1]] += 1.0;
            }
            if a > 0 && b > 0 {
                reduced[[a - 1, b - 1]] -= 1.0;
                reduced[[b - 1, a - 1]] -= 1.0;
            }
        }

        let inverse = invert(reduced)?;
        let c = |i: usize, j: usize| -> f64 {
            if i == 0 || j == 0 {
                0.0
            } else {
                inverse[[i - 1, j - 1]]
            }
        };

        let trace: f64 = (0..n).map(|w| c(w, w)).sum();
        let scores = ids
            .into_iter()
            .enumerate()
            .map(|(v, id)| {
                let row_sum: f64 = (0..n).map(|w| c(v, w)).sum();
                let resistance = n as f64 * c(v, v) + trace - 2.0 * row_sum;
                let score = if resistance > 0.0 { 1.0 / resistance } else { 0.0 };
                (id, score)
            })
            .collect();
        Ok(scores)
    }
}

/// Gauss-Jordan inversion with partial pivoting.
fn invert(mut a: Array2<f64>) -> Result<Array2<f64>, GraphError> {
    let n = a.nrows();
    let mut inv = Array2::<f64>::eye(n);

    for col in 0..n {
        let mut pivot = col;
        for row in col + 1..n {
            if a[[row, col]].abs() > a[[pivot, col]].abs() {
                pivot = row;
            }
        }
        if a[[pivot, col]].abs() < PIVOT_EPSILON {
            return Err(GraphError::NotConnected);
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
                inv.swap([col, k], [pivot, k]);
            }
        }

        let p = a[[col, col]];
        for k in 0..n {
            a[[col, k]] /= p;
            inv[[col, k]] /= p;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for k in 0..n {
                a[[row, k]] -= factor * a[[col, k]];
                inv[[row, k]] -= factor * inv[[col, k]];
            }
        }
    }
    Ok(inv)
}

/// Closeness centrality with the Wasserman-Faust correction for graphs
/// with several components.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosenessCentrality;

impl Centrality for ClosenessCentrality {
    fn name(&self) -> &'static str {
        "closeness"
    }

    fn compute(&self, graph: &NeighborhoodGraph) -> Result<CentralityScores, GraphError> {
        let inner = graph.inner();
        let n = inner.node_count();
        let mut scores = Vec::with_capacity(n);

        for source in inner.node_indices() {
            let mut dist: Vec<Option<usize>> = vec![None; n];
            dist[source.index()] = Some(0);
            let mut queue = VecDeque::from([source]);
            let mut total = 0usize;
            let mut reached = 1usize;

            while let Some(u) = queue.pop_front() {
                let du = dist[u.index()].unwrap_or(0);
                for v in inner.neighbors(u) {
                    if dist[v.index()].is_none() {
                        dist[v.index()] = Some(du + 1);
                        total += du + 1;
                        reached += 1;
                        queue.push_back(v);
                    }
                }
            }

            let score = if total > 0 && n > 1 {
                let r = (reached - 1) as f64;
                (r / total as f64) * (r / (n - 1) as f64)
            } else {
                0.0
            };
            scores.push((inner[source].id.clone(), score));
        }
        Ok(scores)
    }
}

/// Degree divided by `n - 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DegreeCentrality;

impl Centrality for DegreeCentrality {
    fn name(&self) -> &'static str {
        "degree"
    }

    fn compute(&self, graph: &NeighborhoodGraph) -> Result<CentralityScores, GraphError> {
        let inner = graph.inner();
        let n = inner.node_count();
        let scale = if n > 1 { 1.0 / (n - 1) as f64 } else { 1.0 };
        Ok(inner
            .node_indices()
            .map(|ix| {
                let degree = inner.neighbors(ix).count() as f64;
                (inner[ix].id.clone(), degree * scale)
            })
            .collect())
    }
}
