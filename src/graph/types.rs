//! Canonical graph data model shared by every pipeline stage.

use std::collections::HashMap;

use indexmap::IndexSet;

/// Node identifier as it appears in the input documents.
pub type NodeId = String;

/// Identity of an edge: `(source, target, relation)`.
pub type EdgeKey = (NodeId, NodeId, String);

/// Description given to nodes synthesized for dangling edge endpoints.
pub const PLACEHOLDER_DESCRIPTION: &str = "Placeholder node (no details provided).";

/// Metric that drives ordering, color, size and threshold dimming.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MetricKey {
	/// Total degree, normalized against the best connected node.
	#[default]
	Degree,
	/// PageRank score.
	PageRank,
	/// Betweenness centrality.
	Betweenness,
	/// Closeness centrality.
	Closeness,
}

impl MetricKey {
	/// Every selectable metric, in selector order.
	pub const ALL: [MetricKey; 4] = [
		MetricKey::Degree,
		MetricKey::PageRank,
		MetricKey::Betweenness,
		MetricKey::Closeness,
	];

	/// Stable key used by selectors.
	pub fn as_str(self) -> &'static str {
		match self {
			MetricKey::Degree => "degree",
			MetricKey::PageRank => "pagerank",
			MetricKey::Betweenness => "betweenness",
			MetricKey::Closeness => "closeness",
		}
	}

	/// Human readable name.
	pub fn label(self) -> &'static str {
		match self {
			MetricKey::Degree => "Degree",
			MetricKey::PageRank => "PageRank",
			MetricKey::Betweenness => "Betweenness",
			MetricKey::Closeness => "Closeness",
		}
	}

	/// Parse a selector value. Unknown keys yield `None`.
	pub fn parse(value: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|key| key.as_str() == value)
	}
}

/// Per-node metric values. Present on every node or on none of them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeMetrics {
	/// In plus out degree.
	pub degree: usize,
	/// Distinct predecessors.
	pub in_degree: usize,
	/// Distinct successors.
	pub out_degree: usize,
	/// Degree divided by the largest degree in the graph, in [0, 1].
	pub normalized_degree: f64,
	/// Min-max normalized PageRank.
	pub pagerank: f64,
	/// Min-max normalized closeness.
	pub closeness: f64,
	/// Min-max normalized betweenness.
	pub betweenness: f64,
}

impl NodeMetrics {
	/// Normalized value for `key`. Degree maps to `normalized_degree`.
	pub fn value(&self, key: MetricKey) -> f64 {
		match key {
			MetricKey::Degree => self.normalized_degree,
			MetricKey::PageRank => self.pagerank,
			MetricKey::Betweenness => self.betweenness,
			MetricKey::Closeness => self.closeness,
		}
	}
}

/// A vertex of the canonical graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
	/// Unique, immutable once merged.
	pub id: NodeId,
	/// Display name; the id is shown when absent.
	pub name: Option<String>,
	/// Free text shown in the tooltip.
	pub description: Option<String>,
	/// Centrality values, set by the metrics adapter.
	pub metrics: Option<NodeMetrics>,
}

impl Node {
	/// Node with only an identifier.
	pub fn new(id: impl Into<NodeId>) -> Self {
		Self {
			id: id.into(),
			..Self::default()
		}
	}

	/// Builder-style name setter.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Builder-style description setter.
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Stand-in for an edge endpoint no fragment described.
	pub fn placeholder(id: &str) -> Self {
		Self::new(id)
			.with_name(id)
			.with_description(PLACEHOLDER_DESCRIPTION)
	}

	/// Name if non-empty, otherwise the id.
	pub fn display_name(&self) -> &str {
		match self.name.as_deref() {
			Some(name) if !name.is_empty() => name,
			_ => &self.id,
		}
	}

	/// Metric value for `key`, if metrics were computed.
	pub fn metric(&self, key: MetricKey) -> Option<f64> {
		self.metrics.map(|m| m.value(key))
	}
}

/// A directed, labelled edge. Endpoints are always identifiers.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	/// Tail node id.
	pub source: NodeId,
	/// Head node id.
	pub target: NodeId,
	/// Edge label; empty when the input had none.
	pub relation: String,
	/// Citations backing the edge. Insertion ordered, compared as a set.
	pub reference: IndexSet<String>,
}

impl Edge {
	/// Edge without references.
	pub fn new(
		source: impl Into<NodeId>,
		target: impl Into<NodeId>,
		relation: impl Into<String>,
	) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			relation: relation.into(),
			reference: IndexSet::new(),
		}
	}

	/// Builder-style reference setter.
	pub fn with_references<I, S>(mut self, references: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.reference = references.into_iter().map(Into::into).collect();
		self
	}

	/// Identity key used for de-duplication.
	pub fn key(&self) -> EdgeKey {
		(
			self.source.clone(),
			self.target.clone(),
			self.relation.clone(),
		)
	}
}

/// Nodes plus edges. `metrics_calculated` is graph wide, never per node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
	/// Nodes, sorted by display name after a merge.
	pub nodes: Vec<Node>,
	/// Edges in first-seen order.
	pub edges: Vec<Edge>,
	/// Whether every node carries metrics.
	pub metrics_calculated: bool,
}

impl Graph {
	/// Graph from parts, without metrics.
	pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
		Self {
			nodes,
			edges,
			metrics_calculated: false,
		}
	}

	/// True when there is nothing to draw.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.edges.is_empty()
	}

	/// Look up a node by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Map from node id to its position in `nodes`.
	pub fn index_by_id(&self) -> HashMap<&str, usize> {
		self.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.as_str(), i))
			.collect()
	}

	/// In plus out degree per node, counted from the raw edge list.
	pub fn total_degrees(&self) -> HashMap<&str, usize> {
		let mut degrees: HashMap<&str, usize> =
			self.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
		for edge in &self.edges {
			*degrees.entry(edge.source.as_str()).or_insert(0) += 1;
			*degrees.entry(edge.target.as_str()).or_insert(0) += 1;
		}
		degrees
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display_name_falls_back_to_id() {
		assert_eq!(Node::new("x").display_name(), "x");
		assert_eq!(Node::new("x").with_name("").display_name(), "x");
		assert_eq!(Node::new("x").with_name("X").display_name(), "X");
	}

	#[test]
	fn test_degree_metric_reads_normalized_degree() {
		let metrics = NodeMetrics {
			degree: 4,
			normalized_degree: 0.5,
			pagerank: 0.25,
			..NodeMetrics::default()
		};
		assert_eq!(metrics.value(MetricKey::Degree), 0.5);
		assert_eq!(metrics.value(MetricKey::PageRank), 0.25);
	}

	#[test]
	fn test_metric_key_parse_round_trips_selector_values() {
		for key in MetricKey::ALL {
			assert_eq!(MetricKey::parse(key.as_str()), Some(key));
		}
		assert_eq!(MetricKey::parse("eigenvector"), None);
	}

	#[test]
	fn test_reference_sets_compare_without_order() {
		let a = Edge::new("a", "b", "r").with_references(["p1", "p2"]);
		let b = Edge::new("a", "b", "r").with_references(["p2", "p1"]);
		assert_eq!(a, b);
	}

	#[test]
	fn test_total_degrees_counts_parallel_edges() {
		let graph = Graph::new(
			vec![Node::new("a"), Node::new("b")],
			vec![Edge::new("a", "b", "uses"), Edge::new("a", "b", "extends")],
		);
		let degrees = graph.total_degrees();
		assert_eq!(degrees["a"], 2);
		assert_eq!(degrees["b"], 2);
	}
}
