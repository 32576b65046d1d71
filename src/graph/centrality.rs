//! Centrality engine seam and the built-in engine.
//!
//! The metrics stage only knows the [`CentralityEngine`] trait. The built-in
//! [`BuiltinCentrality`] implements PageRank (Page et al. 1999), Brandes
//! betweenness (Brandes 2001) and BFS closeness over a directed graph with
//! parallel edges collapsed.

use std::collections::{HashMap, HashSet, VecDeque};

use super::types::{Graph, NodeId};
use crate::error::MetricsError;

/// Directed graph handed to a centrality engine. Parallel edges are collapsed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DirectedGraph {
	/// Node ids, in canonical graph order.
	pub nodes: Vec<NodeId>,
	/// Distinct `(source, target)` index pairs into `nodes`.
	pub edges: Vec<(usize, usize)>,
}

impl DirectedGraph {
	/// Project the canonical graph, dropping relation labels and duplicates.
	pub fn from_graph(graph: &Graph) -> Self {
		let index = graph.index_by_id();
		let mut seen = HashSet::new();
		let mut edges = Vec::new();
		for edge in &graph.edges {
			let (Some(&s), Some(&t)) = (
				index.get(edge.source.as_str()),
				index.get(edge.target.as_str()),
			) else {
				continue;
			};
			if seen.insert((s, t)) {
				edges.push((s, t));
			}
		}
		Self {
			nodes: graph.nodes.iter().map(|n| n.id.clone()).collect(),
			edges,
		}
	}

	/// Number of nodes.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Outgoing adjacency lists indexed like `nodes`.
	pub fn adjacency(&self) -> Vec<Vec<usize>> {
		let mut adj = vec![Vec::new(); self.nodes.len()];
		for &(s, t) in &self.edges {
			adj[s].push(t);
		}
		adj
	}

	/// `(in_degree, out_degree)` per node.
	pub fn degrees(&self) -> Vec<(usize, usize)> {
		let mut degrees = vec![(0, 0); self.nodes.len()];
		for &(s, t) in &self.edges {
			degrees[s].1 += 1;
			degrees[t].0 += 1;
		}
		degrees
	}
}

/// Raw (not yet normalized) centrality scores keyed by node id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Centrality {
	/// Raw PageRank per node.
	pub pagerank: HashMap<NodeId, f64>,
	/// Raw betweenness per node.
	pub betweenness: HashMap<NodeId, f64>,
	/// Raw closeness per node.
	pub closeness: HashMap<NodeId, f64>,
}

/// External capability that scores nodes of a directed graph.
pub trait CentralityEngine {
	/// Compute all three centralities, or report that the engine cannot.
	fn compute(&self, graph: &DirectedGraph) -> Result<Centrality, MetricsError>;
}

/// Engine standing in for a missing centrality library. Always fails.
#[derive(Clone, Debug, Default)]
pub struct UnavailableEngine;

impl CentralityEngine for UnavailableEngine {
	fn compute(&self, _graph: &DirectedGraph) -> Result<Centrality, MetricsError> {
		Err(MetricsError::Unavailable("no centrality engine installed".into()))
	}
}

/// In-crate engine with the usual PageRank defaults.
#[derive(Clone, Debug)]
pub struct BuiltinCentrality {
	/// PageRank damping factor.
	pub damping: f64,
	/// Upper bound on power iterations.
	pub max_iterations: usize,
	/// Stop once the L1 change per node drops below this.
	pub tolerance: f64,
}

impl Default for BuiltinCentrality {
	fn default() -> Self {
		Self {
			damping: 0.85,
			max_iterations: 100,
			tolerance: 1e-6,
		}
	}
}

impl CentralityEngine for BuiltinCentrality {
	fn compute(&self, graph: &DirectedGraph) -> Result<Centrality, MetricsError> {
		let keyed = |values: Vec<f64>| -> HashMap<NodeId, f64> {
			graph.nodes.iter().cloned().zip(values).collect()
		};
		Ok(Centrality {
			pagerank: keyed(self.pagerank(graph)),
			betweenness: keyed(betweenness(graph)),
			closeness: keyed(closeness(graph)),
		})
	}
}

impl BuiltinCentrality {
	/// Power iteration; rank from dangling nodes is spread uniformly.
	pub fn pagerank(&self, graph: &DirectedGraph) -> Vec<f64> {
		let n = graph.node_count();
		if n == 0 {
			return Vec::new();
		}

		let adj = graph.adjacency();
		let uniform = 1.0 / n as f64;
		let teleport = (1.0 - self.damping) * uniform;
		let mut ranks = vec![uniform; n];

		for _ in 0..self.max_iterations {
			let dangling: f64 = (0..n).filter(|&v| adj[v].is_empty()).map(|v| ranks[v]).sum();
			let mut next = vec![teleport + self.damping * dangling * uniform; n];
			for (v, targets) in adj.iter().enumerate() {
				if targets.is_empty() {
					continue;
				}
				let share = self.damping * ranks[v] / targets.len() as f64;
				for &t in targets {
					next[t] += share;
				}
			}

			let delta: f64 = next.iter().zip(&ranks).map(|(a, b)| (a - b).abs()).sum();
			ranks = next;
			if delta < self.tolerance * n as f64 {
				break;
			}
		}

		ranks
	}
}

/// Brandes betweenness on unweighted directed edges, unnormalized.
pub fn betweenness(graph: &DirectedGraph) -> Vec<f64> {
	let n = graph.node_count();
	let adj = graph.adjacency();
	let mut centrality = vec![0.0; n];

	for s in 0..n {
		let mut stack = Vec::with_capacity(n);
		let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
		let mut sigma = vec![0.0_f64; n];
		let mut dist: Vec<Option<usize>> = vec![None; n];
		sigma[s] = 1.0;
		dist[s] = Some(0);

		let mut queue = VecDeque::from([s]);
		while let Some(v) = queue.pop_front() {
			stack.push(v);
			let dv = dist[v].unwrap_or(0);
			for &w in &adj[v] {
				if dist[w].is_none() {
					dist[w] = Some(dv + 1);
					queue.push_back(w);
				}
				if dist[w] == Some(dv + 1) {
					sigma[w] += sigma[v];
					preds[w].push(v);
				}
			}
		}

		let mut delta = vec![0.0_f64; n];
		while let Some(w) = stack.pop() {
			for &v in &preds[w] {
				delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
			}
			if w != s {
				centrality[w] += delta[w];
			}
		}
	}

	centrality
}

/// Closeness over outgoing shortest paths: reachable count / total distance.
/// Nodes that reach nothing score 0.
pub fn closeness(graph: &DirectedGraph) -> Vec<f64> {
	let adj = graph.adjacency();
	(0..graph.node_count())
		.map(|source| {
			let mut dist: Vec<Option<usize>> = vec![None; adj.len()];
			dist[source] = Some(0);
			let mut queue = VecDeque::from([source]);
			let (mut reached, mut total) = (0usize, 0usize);
			while let Some(v) = queue.pop_front() {
				let dv = dist[v].unwrap_or(0);
				for &w in &adj[v] {
					if dist[w].is_none() {
						dist[w] = Some(dv + 1);
						reached += 1;
						total += dv + 1;
						queue.push_back(w);
					}
				}
			}
			if total == 0 {
				0.0
			} else {
				reached as f64 / total as f64
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::types::{Edge, Node};

	fn directed(ids: &[&str], edges: &[(&str, &str)]) -> DirectedGraph {
		let graph = Graph::new(
			ids.iter().map(|id| Node::new(*id)).collect(),
			edges.iter().map(|(s, t)| Edge::new(*s, *t, "")).collect(),
		);
		DirectedGraph::from_graph(&graph)
	}

	#[test]
	fn test_projection_collapses_parallel_edges() {
		let graph = Graph::new(
			vec![Node::new("a"), Node::new("b")],
			vec![
				Edge::new("a", "b", "uses"),
				Edge::new("a", "b", "extends"),
				Edge::new("b", "a", "uses"),
			],
		);
		let projected = DirectedGraph::from_graph(&graph);
		assert_eq!(projected.edges, vec![(0, 1), (1, 0)]);
		assert_eq!(projected.degrees(), vec![(1, 1), (1, 1)]);
	}

	#[test]
	fn test_pagerank_sums_to_one_and_favours_hub() {
		let graph = directed(
			&["hub", "a", "b", "c"],
			&[("a", "hub"), ("b", "hub"), ("c", "hub")],
		);
		let ranks = BuiltinCentrality::default().pagerank(&graph);
		let total: f64 = ranks.iter().sum();
		assert!((total - 1.0).abs() < 1e-6);
		assert!(ranks[1..].iter().all(|&r| r < ranks[0]));
	}

	#[test]
	fn test_pagerank_empty_graph() {
		assert!(BuiltinCentrality::default()
			.pagerank(&DirectedGraph::default())
			.is_empty());
	}

	#[test]
	fn test_betweenness_of_chain_middle() {
		let graph = directed(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
		assert_eq!(betweenness(&graph), vec![0.0, 1.0, 0.0]);
	}

	#[test]
	fn test_closeness_of_chain() {
		let graph = directed(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
		let scores = closeness(&graph);
		assert!((scores[0] - 2.0 / 3.0).abs() < 1e-12);
		assert_eq!(scores[1], 1.0);
		assert_eq!(scores[2], 0.0);
	}

	#[test]
	fn test_unavailable_engine_fails() {
		assert!(UnavailableEngine.compute(&DirectedGraph::default()).is_err());
	}
}
