//! Graph data pipeline: validation, merging, metrics and batch loading.
//!
//! Everything here is independent of the browser. Fragments flow
//! `loader` → `validate` → `merge` → `metrics` and come out as a canonical
//! [`Graph`] ready for layout.

pub mod centrality;
pub mod loader;
pub mod merge;
pub mod metrics;
mod types;
pub mod validate;

pub use centrality::{BuiltinCentrality, Centrality, CentralityEngine, DirectedGraph, UnavailableEngine};
pub use loader::{FragmentSource, parse_batch, read_batch};
pub use merge::merge;
pub use metrics::MetricsAdapter;
pub use types::{
	Edge, EdgeKey, Graph, MetricKey, Node, NodeId, NodeMetrics, PLACEHOLDER_DESCRIPTION,
};
pub use validate::validate;
