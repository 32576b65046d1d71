//! Mapping nodes and edges to draw styles.
//!
//! Pure functions of a node's selected metric and the UI toggles. When a
//! graph has no metrics every node gets the defaults and nothing is dimmed.

use crate::graph::{MetricKey, Node};

use super::theme::Color;

/// User controlled styling switches.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleToggles {
	/// Metric driving color, size and threshold.
	pub metric: MetricKey,
	pub color_by_metric: bool,
	pub size_by_metric: bool,
	/// Nodes whose metric is below this value (0..=1) are dimmed.
	pub threshold: f64,
}

impl Default for StyleToggles {
	fn default() -> Self {
		Self {
			metric: MetricKey::Degree,
			color_by_metric: false,
			size_by_metric: false,
			threshold: 0.0,
		}
	}
}

impl StyleToggles {
	/// Set the threshold from a 0 to 100 percentage control.
	pub fn set_threshold_percent(&mut self, percent: f64) {
		self.threshold = if percent.is_finite() {
			(percent / 100.0).clamp(0.0, 1.0)
		} else {
			0.0
		};
	}
}

/// Fixed sizes and colors used when a toggle is off.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleConfig {
	/// Radius when size-by-metric is off or metrics are missing.
	pub default_radius: f64,
	/// Radius range when sizing by metric.
	pub min_radius: f64,
	pub max_radius: f64,
	/// Fill when color-by-metric is off or metrics are missing.
	pub neutral_fill: Color,
}

impl Default for StyleConfig {
	fn default() -> Self {
		Self {
			default_radius: 22.0,
			min_radius: 10.0,
			max_radius: 40.0,
			neutral_fill: Color::rgb(94, 129, 172),
		}
	}
}

/// Draw style of one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
	pub radius: f64,
	pub fill: Color,
	/// Metric below the threshold.
	pub dimmed: bool,
}

/// Style a node under the current toggles.
pub fn node_style(node: &Node, toggles: &StyleToggles, config: &StyleConfig) -> NodeStyle {
	let Some(value) = node.metric(toggles.metric).filter(|v| v.is_finite()) else {
		return NodeStyle {
			radius: config.default_radius,
			fill: config.neutral_fill,
			dimmed: false,
		};
	};
	let t = value.clamp(0.0, 1.0);

	NodeStyle {
		radius: if toggles.size_by_metric {
			config.min_radius + (config.max_radius - config.min_radius) * t
		} else {
			config.default_radius
		},
		fill: if toggles.color_by_metric {
			colorous::VIRIDIS.eval_continuous(t).into()
		} else {
			config.neutral_fill
		},
		dimmed: value < toggles.threshold,
	}
}

/// An edge is dimmed when either endpoint is.
pub fn edge_dimmed(source: &NodeStyle, target: &NodeStyle) -> bool {
	source.dimmed || target.dimmed
}
