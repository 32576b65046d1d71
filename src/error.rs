//! Error taxonomy for loading graph fragments.
//!
//! Schema, read and parse failures abort a whole upload batch and leave the
//! previously rendered graph untouched. Metric and layout problems are not
//! represented here: they degrade in place and are only logged.

use thiserror::Error;

/// A parsed fragment does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
	/// The document root is not a JSON object.
	#[error("{label}: graph data must be an object")]
	NotAnObject { label: String },
	/// `nodes` or `edges` is missing or not an array.
	#[error("{label}: `{field}` must be an array")]
	MissingArray { label: String, field: &'static str },
	/// A node has no usable `id`.
	#[error("{label}: node at index {index} is missing an id")]
	NodeMissingId { label: String, index: usize },
	/// An edge has no usable `source` or `target`.
	#[error("{label}: edge at index {index} is missing a {endpoint}")]
	EdgeMissingEndpoint {
		label: String,
		index: usize,
		endpoint: &'static str,
	},
}

impl SchemaError {
	/// File label of the fragment that failed validation.
	pub fn label(&self) -> &str {
		match self {
			SchemaError::NotAnObject { label }
			| SchemaError::MissingArray { label, .. }
			| SchemaError::NodeMissingId { label, .. }
			| SchemaError::EdgeMissingEndpoint { label, .. } => label,
		}
	}
}

/// The underlying read of a fragment failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{label}: failed to read file: {message}")]
pub struct ReadError {
	/// File label of the fragment.
	pub label: String,
	/// What the platform reported.
	pub message: String,
}

/// Any failure that aborts a load batch.
#[derive(Debug, Error)]
pub enum GraphError {
	/// Valid JSON with the wrong shape.
	#[error(transparent)]
	Schema(#[from] SchemaError),
	/// The fragment could not be read.
	#[error(transparent)]
	Read(#[from] ReadError),
	/// The fragment is not valid JSON.
	#[error("{label}: invalid JSON: {source}")]
	Parse {
		label: String,
		#[source]
		source: serde_json::Error,
	},
}

/// Failure reported by a centrality engine. Always recovered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricsError {
	/// The engine is not available or failed while computing.
	#[error("centrality engine unavailable: {0}")]
	Unavailable(String),
}
