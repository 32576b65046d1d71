//! Attaching centrality metrics to the canonical graph.
//!
//! The adapter projects the graph for a [`CentralityEngine`], min-max
//! normalizes each score independently and stores the result on every node.
//! An engine failure is not an error: the graph comes back untouched with
//! `metrics_calculated == false`, and that state is permanent for the graph.

use std::collections::HashMap;

use log::{debug, warn};

use super::centrality::{BuiltinCentrality, CentralityEngine, DirectedGraph};
use super::types::{Graph, NodeId, NodeMetrics};

/// Hands graphs to a centrality engine and normalizes its answers.
pub struct MetricsAdapter {
	engine: Box<dyn CentralityEngine>,
}

impl Default for MetricsAdapter {
	fn default() -> Self {
		Self::new(BuiltinCentrality::default())
	}
}

impl MetricsAdapter {
	/// Adapter backed by `engine`.
	pub fn new(engine: impl CentralityEngine + 'static) -> Self {
		Self {
			engine: Box::new(engine),
		}
	}

	/// Return `graph` with metrics on every node, or unchanged on failure.
	pub fn compute(&self, mut graph: Graph) -> Graph {
		let directed = DirectedGraph::from_graph(&graph);
		let centrality = match self.engine.compute(&directed) {
			Ok(centrality) => centrality,
			Err(e) => {
				warn!("graph-weave: metrics disabled: {}", e);
				return graph;
			}
		};

		let mut pagerank = centrality.pagerank;
		let mut betweenness = centrality.betweenness;
		let mut closeness = centrality.closeness;
		normalize(&mut pagerank);
		normalize(&mut betweenness);
		normalize(&mut closeness);

		let degrees = directed.degrees();
		let max_degree = degrees.iter().map(|(i, o)| i + o).max().unwrap_or(0);
		let score = |map: &HashMap<NodeId, f64>, id: &str| map.get(id).copied().unwrap_or(0.0);

		for (node, &(in_degree, out_degree)) in graph.nodes.iter_mut().zip(&degrees) {
			let degree = in_degree + out_degree;
			node.metrics = Some(NodeMetrics {
				degree,
				in_degree,
				out_degree,
				normalized_degree: if max_degree == 0 {
					0.0
				} else {
					degree as f64 / max_degree as f64
				},
				pagerank: score(&pagerank, &node.id),
				closeness: score(&closeness, &node.id),
				betweenness: score(&betweenness, &node.id),
			});
		}
		graph.metrics_calculated = true;
		debug!(
			"graph-weave: metrics computed for {} nodes",
			graph.nodes.len()
		);
		graph
	}
}

/// Min-max normalize into [0, 1]. When every value is equal nothing changes.
pub fn normalize(values: &mut HashMap<NodeId, f64>) {
	let (min, max) = values
		.values()
		.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
			(lo.min(v), hi.max(v))
		});
	let range = max - min;
	if range <= 0.0 || !range.is_finite() {
		return;
	}
	for value in values.values_mut() {
		*value = (*value - min) / range;
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;
	use crate::error::MetricsError;
	use crate::graph::centrality::{Centrality, UnavailableEngine};
	use crate::graph::types::{Edge, MetricKey, Node};

	fn star() -> Graph {
		Graph::new(
			vec![
				Node::new("hub"),
				Node::new("a"),
				Node::new("b"),
				Node::new("c"),
			],
			vec![
				Edge::new("a", "hub", "uses"),
				Edge::new("a", "hub", "extends"),
				Edge::new("b", "hub", "uses"),
				Edge::new("c", "hub", "uses"),
			],
		)
	}

	struct FailingEngine;

	impl CentralityEngine for FailingEngine {
		fn compute(&self, _graph: &DirectedGraph) -> Result<Centrality, MetricsError> {
			Err(MetricsError::Unavailable("engine threw".into()))
		}
	}

	#[test]
	fn test_failure_returns_graph_unchanged() {
		let graph = star();
		for adapter in [
			MetricsAdapter::new(UnavailableEngine),
			MetricsAdapter::new(FailingEngine),
		] {
			let out = adapter.compute(graph.clone());
			assert_eq!(out, graph);
			assert!(!out.metrics_calculated);
			assert!(out.nodes.iter().all(|n| n.metrics.is_none()));
		}
	}

	#[test]
	fn test_metrics_attached_to_every_node() {
		let out = MetricsAdapter::default().compute(star());
		assert!(out.metrics_calculated);
		assert!(out.nodes.iter().all(|n| n.metrics.is_some()));

		let hub = out.node("hub").and_then(|n| n.metrics).unwrap();
		assert_eq!(hub.in_degree, 3);
		assert_eq!(hub.out_degree, 0);
		assert_eq!(hub.normalized_degree, 1.0);
		assert_eq!(hub.pagerank, 1.0);

		let a = out.node("a").and_then(|n| n.metrics).unwrap();
		assert_eq!(a.out_degree, 1, "parallel edges collapse");
		assert_eq!(a.pagerank, 0.0);
		assert!((out.node("a").unwrap().metric(MetricKey::Degree).unwrap() - 1.0 / 3.0).abs() < 1e-12);
	}

	#[test]
	fn test_edgeless_graph_gets_zero_degrees() {
		let out = MetricsAdapter::default().compute(Graph::new(vec![Node::new("solo")], vec![]));
		let metrics = out.nodes[0].metrics.unwrap();
		assert_eq!(metrics.degree, 0);
		assert_eq!(metrics.normalized_degree, 0.0);
	}

	#[test]
	fn test_normalize_constant_values_is_noop() {
		let mut values: HashMap<NodeId, f64> =
			[("a".to_string(), 0.25), ("b".to_string(), 0.25)].into();
		let before = values.clone();
		normalize(&mut values);
		assert_eq!(values, before);
	}

	proptest! {
		#[test]
		fn test_normalize_maps_extremes_to_unit_interval(
			raw in prop::collection::vec(-1000.0f64..1000.0, 2..20)
		) {
			let mut values: HashMap<NodeId, f64> =
				raw.iter().enumerate().map(|(i, v)| (i.to_string(), *v)).collect();
			let min = raw.iter().cloned().fold(f64::INFINITY, f64::min);
			let max = raw.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
			prop_assume!(max > min);

			normalize(&mut values);

			for (i, v) in raw.iter().enumerate() {
				let n = values[&i.to_string()];
				prop_assert!((0.0..=1.0).contains(&n));
				if *v == min { prop_assert_eq!(n, 0.0); }
				if *v == max { prop_assert_eq!(n, 1.0); }
			}
		}
	}
}
