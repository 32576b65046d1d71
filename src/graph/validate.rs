//! Shape checking for parsed graph fragments.
//!
//! A fragment arrives as loosely typed JSON. [`validate`] either turns it into
//! a typed [`Graph`] or reports the first violation with the file label and
//! offending index. Nothing downstream ever sees unchecked JSON.

use indexmap::IndexSet;
use serde_json::{Map, Value};

use super::types::{Edge, Graph, Node, NodeId};
use crate::error::SchemaError;

/// Check `fragment` and convert it into a typed graph.
///
/// Fails fast on the first problem. Node ids and edge endpoints must be
/// non-empty strings or non-zero numbers; numbers are converted to their
/// decimal text.
pub fn validate(fragment: &Value, label: &str) -> Result<Graph, SchemaError> {
	let Some(object) = fragment.as_object() else {
		return Err(SchemaError::NotAnObject {
			label: label.to_string(),
		});
	};

	let raw_nodes = array_field(object, "nodes", label)?;
	let raw_edges = array_field(object, "edges", label)?;

	let mut nodes = Vec::with_capacity(raw_nodes.len());
	for (index, raw) in raw_nodes.iter().enumerate() {
		let id = identifier(raw.get("id")).ok_or_else(|| SchemaError::NodeMissingId {
			label: label.to_string(),
			index,
		})?;
		nodes.push(Node {
			id,
			name: text(raw.get("name")),
			description: text(raw.get("description")),
			metrics: None,
		});
	}

	let mut edges = Vec::with_capacity(raw_edges.len());
	for (index, raw) in raw_edges.iter().enumerate() {
		let missing = |endpoint| SchemaError::EdgeMissingEndpoint {
			label: label.to_string(),
			index,
			endpoint,
		};
		let source = identifier(raw.get("source")).ok_or_else(|| missing("source"))?;
		let target = identifier(raw.get("target")).ok_or_else(|| missing("target"))?;
		edges.push(Edge {
			source,
			target,
			relation: text(raw.get("relation")).unwrap_or_default(),
			reference: references(raw.get("reference")),
		});
	}

	Ok(Graph::new(nodes, edges))
}

fn array_field<'a>(
	object: &'a Map<String, Value>,
	field: &'static str,
	label: &str,
) -> Result<&'a Vec<Value>, SchemaError> {
	object
		.get(field)
		.and_then(Value::as_array)
		.ok_or_else(|| SchemaError::MissingArray {
			label: label.to_string(),
			field,
		})
}

fn identifier(value: Option<&Value>) -> Option<NodeId> {
	match value? {
		Value::String(s) if !s.is_empty() => Some(s.clone()),
		Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
		_ => None,
	}
}

fn text(value: Option<&Value>) -> Option<String> {
	value.and_then(Value::as_str).map(str::to_owned)
}

fn references(value: Option<&Value>) -> IndexSet<String> {
	match value {
		Some(Value::Array(items)) => items
			.iter()
			.filter_map(Value::as_str)
			.map(str::to_owned)
			.collect(),
		Some(Value::String(single)) if !single.is_empty() => IndexSet::from([single.clone()]),
		_ => IndexSet::new(),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_valid_fragment_becomes_typed_graph() {
		let fragment = json!({
			"nodes": [{"id": "a", "name": "Alpha", "description": "first"}, {"id": 7}],
			"edges": [{"source": "a", "target": 7, "relation": "cites", "reference": ["p1", "p1", "p2"]}]
		});
		let graph = validate(&fragment, "a.json").unwrap();
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.nodes[0].name.as_deref(), Some("Alpha"));
		assert_eq!(graph.nodes[1].id, "7");
		assert_eq!(graph.edges[0].target, "7");
		assert_eq!(graph.edges[0].reference.len(), 2);
		assert!(!graph.metrics_calculated);
	}

	#[test]
	fn test_relation_defaults_to_empty() {
		let fragment = json!({"nodes": [], "edges": [{"source": "a", "target": "b"}]});
		let graph = validate(&fragment, "f").unwrap();
		assert_eq!(graph.edges[0].relation, "");
		assert!(graph.edges[0].reference.is_empty());
	}

	#[test]
	fn test_rejects_non_object() {
		let err = validate(&json!([1, 2]), "list.json").unwrap_err();
		assert_eq!(
			err,
			SchemaError::NotAnObject {
				label: "list.json".into()
			}
		);
		assert!(validate(&Value::Null, "null.json").is_err());
	}

	#[test]
	fn test_rejects_missing_or_mistyped_arrays() {
		let err = validate(&json!({"nodes": []}), "f").unwrap_err();
		assert_eq!(
			err,
			SchemaError::MissingArray {
				label: "f".into(),
				field: "edges"
			}
		);
		let err = validate(&json!({"nodes": {}, "edges": []}), "f").unwrap_err();
		assert!(matches!(err, SchemaError::MissingArray { field: "nodes", .. }));
	}

	#[test]
	fn test_reports_first_node_without_id() {
		let fragment = json!({
			"nodes": [{"id": "ok"}, {"name": "no id"}, {"id": ""}],
			"edges": []
		});
		let err = validate(&fragment, "nodes.json").unwrap_err();
		assert_eq!(
			err,
			SchemaError::NodeMissingId {
				label: "nodes.json".into(),
				index: 1
			}
		);
	}

	#[test]
	fn test_reports_edge_missing_endpoint() {
		let fragment = json!({
			"nodes": [],
			"edges": [{"source": "a", "target": "b"}, {"source": "a", "target": ""}]
		});
		let err = validate(&fragment, "edges.json").unwrap_err();
		assert_eq!(
			err,
			SchemaError::EdgeMissingEndpoint {
				label: "edges.json".into(),
				index: 1,
				endpoint: "target"
			}
		);

		let fragment = json!({"nodes": [], "edges": [{"target": "b"}]});
		let err = validate(&fragment, "edges.json").unwrap_err();
		assert!(matches!(
			err,
			SchemaError::EdgeMissingEndpoint {
				endpoint: "source",
				..
			}
		));
	}

	#[test]
	fn test_zero_is_not_a_usable_id() {
		let fragment = json!({"nodes": [{"id": 0}], "edges": []});
		assert!(validate(&fragment, "f").is_err());
	}
}
