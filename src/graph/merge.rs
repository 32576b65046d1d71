//! Folding many fragments into one canonical graph.
//!
//! Nodes de-duplicate by id, edges by `(source, target, relation)`. The first
//! fragment to supply a name or description wins; edge references are unioned
//! so their final set does not depend on fragment order. Endpoints no fragment
//! describes get a placeholder node, so the result never has dangling edges.

use std::cmp::Ordering;

use indexmap::IndexMap;
use indexmap::map::Entry;

use super::types::{Edge, EdgeKey, Graph, Node, NodeId};

/// Merge `fragments` in order into a single graph.
///
/// Output nodes are sorted by display name (then id); edges keep the order in
/// which their key was first seen. Incoming metrics are dropped because the
/// merged graph needs a fresh computation.
pub fn merge(fragments: &[Graph]) -> Graph {
	let mut nodes: IndexMap<NodeId, Node> = IndexMap::new();
	let mut edges: IndexMap<EdgeKey, Edge> = IndexMap::new();

	for fragment in fragments {
		for node in &fragment.nodes {
			match nodes.entry(node.id.clone()) {
				Entry::Vacant(slot) => {
					slot.insert(Node {
						metrics: None,
						..node.clone()
					});
				}
				Entry::Occupied(mut slot) => {
					let existing = slot.get_mut();
					fill_if_absent(&mut existing.description, &node.description);
					fill_if_absent(&mut existing.name, &node.name);
				}
			}
		}

		for edge in &fragment.edges {
			edges
				.entry(edge.key())
				.and_modify(|existing| existing.reference.extend(edge.reference.iter().cloned()))
				.or_insert_with(|| edge.clone());
		}
	}

	for edge in edges.values() {
		for endpoint in [&edge.source, &edge.target] {
			if !nodes.contains_key(endpoint) {
				nodes.insert(endpoint.clone(), Node::placeholder(endpoint));
			}
		}
	}

	let mut nodes: Vec<Node> = nodes.into_values().collect();
	nodes.sort_by(|a, b| {
		locale_compare(a.display_name(), b.display_name()).then_with(|| a.id.cmp(&b.id))
	});

	Graph::new(nodes, edges.into_values().collect())
}

fn fill_if_absent(slot: &mut Option<String>, incoming: &Option<String>) {
	if !slot.as_deref().is_none_or(str::is_empty) {
		return;
	}
	if let Some(value) = incoming.as_deref().filter(|v| !v.is_empty()) {
		*slot = Some(value.to_string());
	}
}

/// Case-insensitive comparison; on a case-only tie lowercase sorts first.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
	let folded = a
		.chars()
		.flat_map(char::to_lowercase)
		.cmp(b.chars().flat_map(char::to_lowercase));
	folded.then_with(|| b.cmp(a))
}
