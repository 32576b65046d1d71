//! Session state behind the canvas.
//!
//! [`GraphSession`] is the single controller instance: it owns the current
//! graph, the layout engine with its simulation, the drag controller, the
//! style toggles and the hover target. The canvas component only forwards
//! pointer events and ticks, then draws the [`Frame`] it gets back.

use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};

use super::interaction::{DragOutcome, InteractionController};
use super::layout::{LayoutEngine, LayoutMode, LayoutPhase, Viewport};
use super::presentation::{NodeStyle, StyleConfig, StyleToggles, edge_dimmed, node_style};
use super::theme::Color;
use crate::error::GraphError;
use crate::graph::{FragmentSource, Graph, MetricKey, MetricsAdapter, NodeId, merge, parse_batch};

/// Maximum pointer distance, in pixels, for an edge to count as hovered.
const EDGE_HIT_DISTANCE: f64 = 6.0;

/// Shared handle used by the component's event closures.
pub type SharedSession = Rc<RefCell<GraphSession>>;

/// What the pointer is over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverTarget {
	/// Index into the graph's nodes.
	Node(usize),
	/// Index into the graph's edges.
	Edge(usize),
}

/// One node ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDrawSpec {
	pub id: NodeId,
	/// Name, or the id when the node has none.
	pub label: String,
	pub x: f64,
	pub y: f64,
	pub radius: f64,
	pub fill: Color,
	/// Below the metric threshold.
	pub dimmed: bool,
	pub hovered: bool,
}

/// One edge ready to draw. Endpoints are node centres.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeDrawSpec {
	pub source: (f64, f64),
	pub target: (f64, f64),
	/// Radius of the target node, so the arrow stops at its rim.
	pub target_radius: f64,
	/// Relation type, drawn at the midpoint.
	pub label: String,
	/// Either endpoint is dimmed.
	pub dimmed: bool,
	pub hovered: bool,
}

/// Hover information box anchored at the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	/// Pointer position.
	pub x: f64,
	pub y: f64,
	/// Text rows, top to bottom.
	pub lines: Vec<String>,
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
	pub viewport: Viewport,
	/// Drawn first, beneath the nodes.
	pub edges: Vec<EdgeDrawSpec>,
	pub nodes: Vec<NodeDrawSpec>,
	pub tooltip: Option<Tooltip>,
}

/// Whether centrality metrics are usable for the current graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricsStatus {
	/// No graph loaded.
	Empty,
	/// Metrics computed for every node.
	Available,
	/// The engine failed; styling falls back to defaults.
	Unavailable,
}

/// Snapshot for the status indicator.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionStatus {
	/// Node count of the current graph.
	pub nodes: usize,
	/// Edge count of the current graph.
	pub edges: usize,
	pub metrics: MetricsStatus,
	pub mode: LayoutMode,
	pub phase: LayoutPhase,
	/// Message of the last rejected batch, until the next success.
	pub error: Option<String>,
}

impl SessionStatus {
	/// One line summary.
	pub fn summary(&self) -> String {
		if let Some(error) = &self.error {
			return format!("Error: {}", error);
		}
		let metrics = match self.metrics {
			MetricsStatus::Empty => return "No graph loaded".to_string(),
			MetricsStatus::Available => "metrics: on",
			MetricsStatus::Unavailable => "metrics: unavailable",
		};
		format!(
			"{} nodes, {} edges, {} layout, {}",
			self.nodes,
			self.edges,
			self.mode.label(),
			metrics
		)
	}
}

/// Owns the graph and all state derived from it.
pub struct GraphSession {
	graph: Graph,
	/// Every fragment loaded since the last clear, in load order.
	fragments: Vec<Graph>,
	/// Resolved endpoint indices, parallel to `graph.edges`.
	endpoints: Vec<Option<(usize, usize)>>,
	metrics: MetricsAdapter,
	layout: LayoutEngine,
	interaction: InteractionController,
	toggles: StyleToggles,
	style: StyleConfig,
	hover: Option<HoverTarget>,
	pointer: (f64, f64),
	last_error: Option<String>,
	dirty: bool,
}

impl GraphSession {
	/// Empty session with the built-in centrality engine.
	pub fn new(viewport: Viewport) -> Self {
		Self::with_metrics(MetricsAdapter::default(), viewport)
	}

	/// Empty session using `metrics` for centrality.
	pub fn with_metrics(metrics: MetricsAdapter, viewport: Viewport) -> Self {
		Self {
			graph: Graph::default(),
			fragments: Vec::new(),
			endpoints: Vec::new(),
			metrics,
			layout: LayoutEngine::new(viewport),
			interaction: InteractionController::new(),
			toggles: StyleToggles::default(),
			style: StyleConfig::default(),
			hover: None,
			pointer: (0.0, 0.0),
			last_error: None,
			dirty: true,
		}
	}

	/// Replace the fixed style sizes and colors.
	pub fn with_style(mut self, style: StyleConfig) -> Self {
		self.style = style;
		self
	}

	/// Wrap for sharing between event closures.
	pub fn shared(self) -> SharedSession {
		Rc::new(RefCell::new(self))
	}

	/// The merged graph with metrics.
	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	/// Positions and simulation state.
	pub fn layout(&self) -> &LayoutEngine {
		&self.layout
	}

	/// Current metric overlay settings.
	pub fn toggles(&self) -> &StyleToggles {
		&self.toggles
	}

	/// What the pointer is over, if anything.
	pub fn hover(&self) -> Option<HoverTarget> {
		self.hover
	}

	/// Message of the last rejected batch.
	pub fn last_error(&self) -> Option<&str> {
		self.last_error.as_deref()
	}

	/// Parse a finished batch of reads and merge it into the current graph.
	///
	/// Any read, parse or schema failure rejects the whole batch and leaves
	/// the current graph as it was.
	pub fn load_batch(&mut self, sources: Vec<FragmentSource>) -> Result<(), GraphError> {
		match parse_batch(sources) {
			Ok(fragments) => {
				self.load_fragments(fragments);
				Ok(())
			}
			Err(e) => {
				self.last_error = Some(e.to_string());
				self.dirty = true;
				Err(e)
			}
		}
	}

	/// Merge validated fragments with everything loaded before, recompute
	/// metrics and lay everything out again.
	///
	/// All fragments since the last clear are merged together in load order,
	/// so earlier files win names and descriptions and a placeholder from an
	/// earlier batch gives way to the real node once it arrives.
	pub fn load_fragments(&mut self, fragments: Vec<Graph>) {
		let count = fragments.len();
		self.fragments.extend(fragments);

		let merged = self.metrics.compute(merge(&self.fragments));
		info!(
			"graph-weave: merged {} fragment(s) into {} nodes, {} edges",
			count,
			merged.nodes.len(),
			merged.edges.len()
		);
		self.set_graph(merged);
		self.last_error = None;
	}

	/// Back to an empty graph. Mode, strength and toggles are kept.
	pub fn clear(&mut self) {
		self.release_drag();
		self.graph = Graph::default();
		self.fragments.clear();
		self.endpoints.clear();
		self.layout.clear();
		self.hover = None;
		self.last_error = None;
		self.dirty = true;
		info!("graph-weave: graph cleared");
	}

	fn set_graph(&mut self, graph: Graph) {
		let index = graph.index_by_id();
		self.endpoints = graph
			.edges
			.iter()
			.map(|e| Some((*index.get(e.source.as_str())?, *index.get(e.target.as_str())?)))
			.collect();
		self.graph = graph;
		self.relayout();
	}

	/// Drop any active drag so the node is unpinned and the simulation
	/// cools down before the layout changes underneath it.
	fn release_drag(&mut self) {
		self.interaction.drag_end(&mut self.layout);
	}

	fn relayout(&mut self) {
		self.set_layout_mode(self.layout.mode());
	}

	/// Switch layout mode. Always starts a fresh render cycle, even when
	/// the mode is unchanged.
	pub fn set_layout_mode(&mut self, mode: LayoutMode) {
		self.release_drag();
		self.hover = None;
		let strength = self.layout.force_strength();
		self.layout
			.layout(&self.graph, mode, strength, self.toggles.metric);
		self.dirty = true;
	}

	/// Retune charge strength. Non-finite values are ignored.
	pub fn set_force_strength(&mut self, strength: f64) {
		if !strength.is_finite() {
			warn!("graph-weave: ignoring non-finite force strength");
			return;
		}
		self.layout.set_force_strength(strength);
	}

	/// Select the metric for styling and static ordering. Static layouts
	/// are recomputed.
	pub fn set_metric(&mut self, metric: MetricKey) {
		self.toggles.metric = metric;
		self.release_drag();
		self.layout.set_metric(&self.graph, metric);
		self.dirty = true;
	}

	/// Toggle metric coloring.
	pub fn set_color_by_metric(&mut self, on: bool) {
		self.toggles.color_by_metric = on;
		self.dirty = true;
	}

	/// Toggle metric sizing.
	pub fn set_size_by_metric(&mut self, on: bool) {
		self.toggles.size_by_metric = on;
		self.dirty = true;
	}

	/// Dim nodes below this percentage of the metric maximum.
	pub fn set_threshold_percent(&mut self, percent: f64) {
		self.toggles.set_threshold_percent(percent);
		self.dirty = true;
	}

	/// Follow a canvas size change. Same-size calls are no-ops.
	pub fn resize(&mut self, viewport: Viewport) {
		if viewport == self.layout.viewport() {
			return;
		}
		self.release_drag();
		self.layout.resize(&self.graph, viewport);
		self.dirty = true;
	}

	/// Advance one animation frame. Returns whether a redraw is needed.
	pub fn tick(&mut self) -> bool {
		let moved = self.layout.tick();
		let redraw = moved || self.dirty;
		self.dirty = false;
		redraw
	}

	fn styles(&self) -> Vec<NodeStyle> {
		self.graph
			.nodes
			.iter()
			.map(|n| node_style(n, &self.toggles, &self.style))
			.collect()
	}

	/// Topmost node whose drawn disc contains the point.
	pub fn node_at(&self, x: f64, y: f64) -> Option<usize> {
		let styles = self.styles();
		self.layout
			.bodies()
			.iter()
			.zip(&styles)
			.enumerate()
			.rev()
			.find(|(_, (b, s))| (b.x - x).hypot(b.y - y) <= s.radius)
			.map(|(i, _)| i)
	}

	/// Closest edge within the hit distance of the point.
	pub fn edge_at(&self, x: f64, y: f64) -> Option<usize> {
		let bodies = self.layout.bodies();
		self.endpoints
			.iter()
			.enumerate()
			.filter_map(|(i, ends)| {
				let (s, t) = (*ends)?;
				let (a, b) = (bodies.get(s)?, bodies.get(t)?);
				Some((i, segment_distance((x, y), (a.x, a.y), (b.x, b.y))))
			})
			.filter(|&(_, d)| d <= EDGE_HIT_DISTANCE)
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(i, _)| i)
	}

	/// Press at a point. Starts a drag when a node is under it.
	pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
		self.pointer = (x, y);
		let Some(index) = self.node_at(x, y) else {
			return false;
		};
		self.hover = Some(HoverTarget::Node(index));
		let outcome = self.interaction.drag_start(&mut self.layout, index);
		self.apply(outcome);
		outcome != DragOutcome::Ignored
	}

	/// Pointer motion: drags the held node or updates the hover target.
	pub fn pointer_move(&mut self, x: f64, y: f64) {
		self.pointer = (x, y);
		if self.interaction.dragging().is_some() {
			let outcome = self.interaction.drag_move(&mut self.layout, x, y);
			self.apply(outcome);
			self.dirty = true;
			return;
		}

		let hover = self
			.node_at(x, y)
			.map(HoverTarget::Node)
			.or_else(|| self.edge_at(x, y).map(HoverTarget::Edge));
		if hover != self.hover || hover.is_some() {
			self.dirty = true;
		}
		self.hover = hover;
	}

	/// Release: ends any drag.
	pub fn pointer_up(&mut self) {
		let outcome = self.interaction.drag_end(&mut self.layout);
		self.apply(outcome);
	}

	/// The pointer left the canvas: release any drag and drop the hover.
	pub fn pointer_leave(&mut self) {
		self.pointer_up();
		if self.hover.take().is_some() {
			self.dirty = true;
		}
	}

	/// Whether a node is held.
	pub fn is_dragging(&self) -> bool {
		self.interaction.dragging().is_some()
	}

	fn apply(&mut self, outcome: DragOutcome) {
		if outcome == DragOutcome::NeedsRedraw {
			self.dirty = true;
		}
	}

	/// Draw specs for the current positions, styles and hover.
	pub fn frame(&self) -> Frame {
		let bodies = self.layout.bodies();
		let styles = self.styles();

		let nodes = self
			.graph
			.nodes
			.iter()
			.zip(bodies)
			.zip(&styles)
			.enumerate()
			.map(|(i, ((node, body), style))| NodeDrawSpec {
				id: node.id.clone(),
				label: node.display_name().to_string(),
				x: body.x,
				y: body.y,
				radius: style.radius,
				fill: style.fill,
				dimmed: style.dimmed,
				hovered: self.hover == Some(HoverTarget::Node(i)),
			})
			.collect();

		let edges = self
			.graph
			.edges
			.iter()
			.zip(&self.endpoints)
			.enumerate()
			.filter_map(|(i, (edge, ends))| {
				let (s, t) = (*ends)?;
				let (a, b) = (bodies.get(s)?, bodies.get(t)?);
				Some(EdgeDrawSpec {
					source: (a.x, a.y),
					target: (b.x, b.y),
					target_radius: styles[t].radius,
					label: edge.relation.clone(),
					dimmed: edge_dimmed(&styles[s], &styles[t]),
					hovered: self.hover == Some(HoverTarget::Edge(i)),
				})
			})
			.collect();

		Frame {
			viewport: self.layout.viewport(),
			edges,
			nodes,
			tooltip: self.tooltip(),
		}
	}

	fn tooltip(&self) -> Option<Tooltip> {
		let lines = match self.hover? {
			HoverTarget::Node(i) => {
				let node = self.graph.nodes.get(i)?;
				let mut lines = vec![node.display_name().to_string(), format!("id: {}", node.id)];
				if let Some(description) = node.description.as_deref().filter(|d| !d.is_empty()) {
					lines.push(description.to_string());
				}
				if let Some(m) = node.metrics {
					lines.push(format!(
						"degree: {} (in {}, out {})",
						m.degree, m.in_degree, m.out_degree
					));
					for key in [MetricKey::PageRank, MetricKey::Betweenness, MetricKey::Closeness] {
						lines.push(format!("{}: {:.3}", key.label(), m.value(key)));
					}
				}
				lines
			}
			HoverTarget::Edge(i) => {
				let edge = self.graph.edges.get(i)?;
				let mut lines = vec![format!("{} → {}", edge.source, edge.target)];
				if !edge.relation.is_empty() {
					lines.push(format!("relation: {}", edge.relation));
				}
				if !edge.reference.is_empty() {
					let refs: Vec<&str> = edge.reference.iter().map(String::as_str).collect();
					lines.push(format!("references: {}", refs.join(", ")));
				}
				lines
			}
		};
		let (x, y) = self.pointer;
		Some(Tooltip { x, y, lines })
	}

	/// Snapshot for the status line.
	pub fn status(&self) -> SessionStatus {
		SessionStatus {
			nodes: self.graph.nodes.len(),
			edges: self.graph.edges.len(),
			metrics: if self.graph.is_empty() {
				MetricsStatus::Empty
			} else if self.graph.metrics_calculated {
				MetricsStatus::Available
			} else {
				MetricsStatus::Unavailable
			},
			mode: self.layout.mode(),
			phase: self.layout.phase(),
			error: self.last_error.clone(),
		}
	}
}

/// Distance from `p` to the segment `a`-`b`.
fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	let len2 = dx * dx + dy * dy;
	let t = if len2 == 0.0 {
		0.0
	} else {
		(((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
	};
	(p.0 - (a.0 + t * dx)).hypot(p.1 - (a.1 + t * dy))
}
