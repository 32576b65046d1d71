//! Node positioning under the three layout strategies.
//!
//! [`LayoutEngine`] owns the transient positional state of every node (the
//! [`Body`] list, parallel to `graph.nodes`) and the single live
//! [`ForceSimulation`]. Every full layout discards the previous simulation
//! and all positions, velocities and pins before computing fresh ones, so no
//! state leaks between modes.
//!
//! - **Circular**: evenly spaced on a circle of radius `min(w, h) / 3`.
//! - **Hierarchical**: ⌈√n⌉ rows filled in metric (or degree) order.
//! - **Force**: long running simulation, see [`super::simulation`].

use std::cmp::Ordering;
use std::f64::consts::PI;

use log::{debug, warn};

use super::simulation::{ForceParameters, ForceSimulation, SimulationStatus};
use crate::graph::{Graph, MetricKey};

/// Canvas size in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	/// Width in pixels.
	pub width: f64,
	/// Height in pixels.
	pub height: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Self::new(800.0, 600.0)
	}
}

impl Viewport {
	/// Viewport with negative or non-finite sizes treated as zero.
	pub fn new(width: f64, height: f64) -> Self {
		let sane = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
		Self {
			width: sane(width),
			height: sane(height),
		}
	}

	/// Centre point.
	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}

	/// Clamp into `[padding, dim - padding]` on both axes.
	///
	/// Viewports narrower than twice the padding collapse to their centre
	/// line. Non-finite coordinates are replaced by the centre.
	pub fn clamp_point(&self, x: f64, y: f64, padding: f64) -> (f64, f64) {
		let axis = |v: f64, dim: f64| {
			let (lo, hi) = (padding.min(dim / 2.0), (dim - padding).max(dim / 2.0));
			if v.is_finite() { v.clamp(lo, hi) } else { dim / 2.0 }
		};
		(axis(x, self.width), axis(y, self.height))
	}
}

/// Transient position, velocity and pin of one node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
	pub x: f64,
	pub y: f64,
	/// Velocity, only meaningful while a simulation runs.
	pub vx: f64,
	pub vy: f64,
	/// Pinned x; the simulation holds the node here while set.
	pub fx: Option<f64>,
	/// Pinned y.
	pub fy: Option<f64>,
}

impl Body {
	/// Resting body at a point.
	pub fn at(x: f64, y: f64) -> Self {
		Self {
			x,
			y,
			..Self::default()
		}
	}
}

/// Positioning strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutMode {
	/// Live force simulation.
	#[default]
	Force,
	/// Static circle.
	Circular,
	/// Static rows.
	Hierarchical,
}

impl LayoutMode {
	/// Every mode, in selector order.
	pub const ALL: [LayoutMode; 3] = [
		LayoutMode::Force,
		LayoutMode::Circular,
		LayoutMode::Hierarchical,
	];

	/// Selector value.
	pub fn as_str(self) -> &'static str {
		match self {
			LayoutMode::Force => "force",
			LayoutMode::Circular => "circular",
			LayoutMode::Hierarchical => "hierarchical",
		}
	}

	/// Human readable name.
	pub fn label(self) -> &'static str {
		match self {
			LayoutMode::Force => "Force",
			LayoutMode::Circular => "Circular",
			LayoutMode::Hierarchical => "Hierarchical",
		}
	}

	/// Parse a selector value.
	pub fn parse(value: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|m| m.as_str() == value)
	}

	/// True for modes that never simulate.
	pub fn is_static(self) -> bool {
		!matches!(self, LayoutMode::Force)
	}
}

/// Where the engine is in its render cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutPhase {
	/// No graph laid out.
	Idle,
	/// Static positions computed.
	Positioned,
	/// Force simulation running.
	Simulating,
	/// Force simulation cooled down.
	Settled,
}

/// Computes positions and owns the only mutable simulation state.
pub struct LayoutEngine {
	mode: LayoutMode,
	force_strength: f64,
	metric: MetricKey,
	viewport: Viewport,
	params: ForceParameters,
	bodies: Vec<Body>,
	simulation: Option<ForceSimulation>,
	generation: u64,
}

impl LayoutEngine {
	/// Engine with default force parameters.
	pub fn new(viewport: Viewport) -> Self {
		Self::with_parameters(ForceParameters::default(), viewport)
	}

	/// Engine with custom force parameters.
	pub fn with_parameters(params: ForceParameters, viewport: Viewport) -> Self {
		Self {
			mode: LayoutMode::default(),
			force_strength: params.charge_strength,
			metric: MetricKey::default(),
			viewport,
			params,
			bodies: Vec::new(),
			simulation: None,
			generation: 0,
		}
	}

	/// Mode of the most recent layout.
	pub fn mode(&self) -> LayoutMode {
		self.mode
	}

	/// Charge strength used for the next or current simulation.
	pub fn force_strength(&self) -> f64 {
		self.force_strength
	}

	/// Current canvas size.
	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	/// Margin kept between nodes and the canvas edge.
	pub fn padding(&self) -> f64 {
		self.params.padding
	}

	/// Positions, parallel to the graph's node list.
	pub fn bodies(&self) -> &[Body] {
		&self.bodies
	}

	/// Mutable access for interaction.
	pub fn body_mut(&mut self, index: usize) -> Option<&mut Body> {
		self.bodies.get_mut(index)
	}

	/// The live simulation, if the engine is in Force mode.
	pub fn simulation(&self) -> Option<&ForceSimulation> {
		self.simulation.as_ref()
	}

	/// Live simulation, for drag handling.
	pub fn simulation_mut(&mut self) -> Option<&mut ForceSimulation> {
		self.simulation.as_mut()
	}

	/// Whether a simulation exists and has not cooled down.
	pub fn is_simulating(&self) -> bool {
		self.simulation.as_ref().is_some_and(ForceSimulation::is_running)
	}

	/// Coarse state for the status line.
	pub fn phase(&self) -> LayoutPhase {
		match &self.simulation {
			Some(sim) if sim.is_running() => LayoutPhase::Simulating,
			Some(_) => LayoutPhase::Settled,
			None if self.bodies.is_empty() => LayoutPhase::Idle,
			None => LayoutPhase::Positioned,
		}
	}

	/// Clamp a point with the same bounds the simulation uses.
	pub fn clamp_point(&self, x: f64, y: f64) -> (f64, f64) {
		self.viewport.clamp_point(x, y, self.params.padding)
	}

	/// Start a new render cycle for `graph`.
	///
	/// Stops and discards any previous simulation, resets every body, then
	/// positions nodes under `mode`.
	pub fn layout(&mut self, graph: &Graph, mode: LayoutMode, force_strength: f64, metric: MetricKey) {
		if self.mode != mode {
			debug!(
				"graph-weave: layout mode {} -> {}",
				self.mode.as_str(),
				mode.as_str()
			);
		}
		self.mode = mode;
		self.force_strength = force_strength;
		self.metric = metric;
		self.relayout(graph);
	}

	/// Recompute with the current mode, strength and metric.
	pub fn relayout(&mut self, graph: &Graph) {
		self.discard_simulation();
		self.bodies = vec![Body::default(); graph.nodes.len()];
		if graph.nodes.is_empty() {
			return;
		}

		match self.mode {
			LayoutMode::Circular => self.circular(graph),
			LayoutMode::Hierarchical => self.hierarchical(graph),
			LayoutMode::Force => self.force(graph),
		}
	}

	/// Change the metric used to order static layouts.
	///
	/// Static layouts are recomputed; a running simulation is left alone.
	pub fn set_metric(&mut self, graph: &Graph, metric: MetricKey) {
		self.metric = metric;
		if self.mode.is_static() {
			self.relayout(graph);
		}
	}

	/// Live-tune the charge force. Only the charge is replaced; the
	/// simulation keeps its positions and is reheated.
	pub fn set_force_strength(&mut self, strength: f64) {
		self.force_strength = strength;
		if let Some(sim) = self.simulation.as_mut() {
			sim.set_charge_strength(strength);
			sim.reheat();
		}
	}

	/// Adapt to a new canvas size.
	pub fn resize(&mut self, graph: &Graph, viewport: Viewport) {
		self.viewport = viewport;
		if self.bodies.is_empty() {
			return;
		}
		match self.simulation.as_mut() {
			Some(sim) => {
				sim.set_viewport(viewport);
				for body in &mut self.bodies {
					let (x, y) = viewport.clamp_point(body.x, body.y, self.params.padding);
					body.x = x;
					body.y = y;
				}
				sim.reheat();
			}
			None => self.relayout(graph),
		}
	}

	/// Advance the simulation by one tick. Returns whether anything moved.
	pub fn tick(&mut self) -> bool {
		match self.simulation.as_mut() {
			Some(sim) => sim.tick(&mut self.bodies) == SimulationStatus::Simulating,
			None => false,
		}
	}

	/// Back to idle: no simulation, no positions.
	pub fn clear(&mut self) {
		self.discard_simulation();
		self.bodies.clear();
	}

	fn discard_simulation(&mut self) {
		if let Some(mut sim) = self.simulation.take() {
			sim.stop();
		}
	}

	fn circular(&mut self, graph: &Graph) {
		let order = metric_order(graph, self.metric).unwrap_or_else(|| (0..graph.nodes.len()).collect());
		let n = order.len() as f64;
		let (cx, cy) = self.viewport.center();
		let radius = self.viewport.width.min(self.viewport.height) / 3.0;

		for (rank, &index) in order.iter().enumerate() {
			let angle = 2.0 * PI * rank as f64 / n;
			self.place(index, cx + radius * angle.cos(), cy + radius * angle.sin());
		}
	}

	fn hierarchical(&mut self, graph: &Graph) {
		let order = metric_order(graph, self.metric).unwrap_or_else(|| degree_order(graph));
		let n = order.len();
		let layers = (n as f64).sqrt().ceil() as usize;
		let per_layer = n.div_ceil(layers.max(1));

		let padding = self.params.padding;
		let cell_w = (self.viewport.width - 2.0 * padding) / per_layer as f64;
		let cell_h = (self.viewport.height - 2.0 * padding) / layers as f64;

		for (rank, &index) in order.iter().enumerate() {
			let (layer, slot) = (rank / per_layer, rank % per_layer);
			self.place(
				index,
				padding + (slot as f64 + 0.5) * cell_w,
				padding + (layer as f64 + 0.5) * cell_h,
			);
		}
	}

	fn force(&mut self, graph: &Graph) {
		let index = graph.index_by_id();
		let links: Vec<(usize, usize)> = graph
			.edges
			.iter()
			.filter_map(|e| Some((*index.get(e.source.as_str())?, *index.get(e.target.as_str())?)))
			.collect();

		let params = ForceParameters {
			charge_strength: self.force_strength,
			..self.params.clone()
		};
		self.generation += 1;
		let mut sim = ForceSimulation::new(
			params,
			graph.nodes.len(),
			links,
			self.viewport,
			self.generation,
		);
		sim.seed_positions(&mut self.bodies);
		sim.start();
		self.simulation = Some(sim);
	}

	/// Set a static position, substituting the centre for degenerate values.
	fn place(&mut self, index: usize, x: f64, y: f64) {
		let (cx, cy) = self.viewport.center();
		let (x, y) = if x.is_finite() && y.is_finite() {
			(x, y)
		} else {
			warn!(
				"graph-weave: degenerate position for node {} in {} layout, using centre",
				index,
				self.mode.as_str()
			);
			(cx, cy)
		};
		if let Some(body) = self.bodies.get_mut(index) {
			*body = Body::at(x, y);
		}
	}
}

/// Node indices by descending metric, or `None` when metrics are absent.
fn metric_order(graph: &Graph, metric: MetricKey) -> Option<Vec<usize>> {
	if !graph.metrics_calculated {
		return None;
	}
	let values: Vec<f64> = graph
		.nodes
		.iter()
		.map(|n| n.metric(metric).unwrap_or(0.0))
		.collect();
	Some(descending(&values))
}

/// Node indices by descending total degree, counted from the raw edges.
fn degree_order(graph: &Graph) -> Vec<usize> {
	let degrees = graph.total_degrees();
	let values: Vec<f64> = graph
		.nodes
		.iter()
		.map(|n| degrees.get(n.id.as_str()).copied().unwrap_or(0) as f64)
		.collect();
	descending(&values)
}

/// Stable descending argsort; ties keep input order.
fn descending(values: &[f64]) -> Vec<usize> {
	let mut order: Vec<usize> = (0..values.len()).collect();
	order.sort_by(|&a, &b| values[b].partial_cmp(&values[a]).unwrap_or(Ordering::Equal));
	order
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Edge, MetricsAdapter, Node};

	fn chain(n: usize) -> Graph {
		let nodes = (0..n).map(|i| Node::new(format!("n{i}"))).collect();
		let edges = (1..n)
			.map(|i| Edge::new(format!("n{}", i - 1), format!("n{i}"), "next"))
			.collect();
		Graph::new(nodes, edges)
	}

	fn star() -> Graph {
		Graph::new(
			vec![Node::new("leaf1"), Node::new("leaf2"), Node::new("hub")],
			vec![Edge::new("hub", "leaf1", "r"), Edge::new("hub", "leaf2", "r")],
		)
	}

	#[test]
	fn test_viewport_clamp_handles_tiny_and_degenerate() {
		let vp = Viewport::new(800.0, 600.0);
		assert_eq!(vp.clamp_point(-10.0, 900.0, 50.0), (50.0, 550.0));
		assert_eq!(vp.clamp_point(f64::NAN, 10.0, 50.0), (400.0, 50.0));
		let tiny = Viewport::new(40.0, 40.0);
		assert_eq!(tiny.clamp_point(0.0, 40.0, 50.0), (20.0, 20.0));
	}

	#[test]
	fn test_layout_mode_parse() {
		assert_eq!(LayoutMode::parse("circular"), Some(LayoutMode::Circular));
		assert_eq!(LayoutMode::parse("grid"), None);
		assert!(LayoutMode::Hierarchical.is_static());
		assert!(!LayoutMode::Force.is_static());
	}

	#[test]
	fn test_circular_places_on_circle_in_input_order() {
		let graph = chain(4);
		let mut engine = LayoutEngine::new(Viewport::new(900.0, 600.0));
		engine.layout(&graph, LayoutMode::Circular, -350.0, MetricKey::Degree);

		assert_eq!(engine.phase(), LayoutPhase::Positioned);
		assert!(engine.simulation().is_none());
		let b = engine.bodies();
		for body in b {
			let r = ((body.x - 450.0).powi(2) + (body.y - 300.0).powi(2)).sqrt();
			assert!((r - 200.0).abs() < 1e-9);
		}
		assert!((b[0].x - 650.0).abs() < 1e-9 && (b[0].y - 300.0).abs() < 1e-9);
		assert!((b[1].x - 450.0).abs() < 1e-9 && (b[1].y - 500.0).abs() < 1e-9);
	}

	#[test]
	fn test_circular_orders_by_metric_when_present() {
		let graph = MetricsAdapter::default().compute(star());
		let mut engine = LayoutEngine::new(Viewport::new(600.0, 600.0));
		engine.layout(&graph, LayoutMode::Circular, -350.0, MetricKey::Degree);
		let hub = &engine.bodies()[2];
		assert!((hub.x - 500.0).abs() < 1e-9 && (hub.y - 300.0).abs() < 1e-9);
	}

	#[test]
	fn test_hierarchical_grid_shape() {
		let graph = chain(10);
		let mut engine = LayoutEngine::new(Viewport::new(800.0, 600.0));
		engine.layout(&graph, LayoutMode::Hierarchical, -350.0, MetricKey::Degree);

		let mut rows: Vec<f64> = engine.bodies().iter().map(|b| b.y).collect();
		rows.sort_by(|a, b| a.partial_cmp(b).unwrap());
		rows.dedup();
		assert_eq!(rows.len(), 4, "ceil(sqrt(10)) layers");
		for body in engine.bodies() {
			assert!(body.x.is_finite() && body.y.is_finite());
			assert!(body.x >= 50.0 && body.x <= 750.0);
		}
	}

	#[test]
	fn test_hierarchical_falls_back_to_raw_degree() {
		let graph = star();
		let mut engine = LayoutEngine::new(Viewport::new(800.0, 600.0));
		engine.layout(&graph, LayoutMode::Hierarchical, -350.0, MetricKey::PageRank);
		let bodies = engine.bodies();
		let first_row = bodies.iter().map(|b| b.y).fold(f64::INFINITY, f64::min);
		assert_eq!(bodies[2].y, first_row);
		assert!(bodies[2].x <= bodies[0].x, "hub comes first in its row");
	}

	#[test]
	fn test_static_layouts_are_deterministic() {
		let graph = MetricsAdapter::default().compute(chain(7));
		for mode in [LayoutMode::Circular, LayoutMode::Hierarchical] {
			let mut a = LayoutEngine::new(Viewport::new(640.0, 480.0));
			let mut b = LayoutEngine::new(Viewport::new(640.0, 480.0));
			a.layout(&graph, mode, -350.0, MetricKey::Betweenness);
			b.layout(&graph, LayoutMode::Force, -350.0, MetricKey::Betweenness);
			b.tick();
			b.layout(&graph, mode, -350.0, MetricKey::Betweenness);
			assert_eq!(a.bodies(), b.bodies());
		}
	}

	#[test]
	fn test_single_node_hierarchical_is_centered() {
		let graph = chain(1);
		let mut engine = LayoutEngine::new(Viewport::new(800.0, 600.0));
		engine.layout(&graph, LayoutMode::Hierarchical, -350.0, MetricKey::Degree);
		assert_eq!(engine.bodies()[0], Body::at(400.0, 300.0));
	}

	#[test]
	fn test_force_layout_runs_and_stays_in_bounds() {
		let graph = chain(12);
		let mut engine = LayoutEngine::new(Viewport::new(500.0, 400.0));
		engine.layout(&graph, LayoutMode::Force, -900.0, MetricKey::Degree);
		assert_eq!(engine.phase(), LayoutPhase::Simulating);
		for _ in 0..400 {
			engine.tick();
			for b in engine.bodies() {
				assert!((50.0..=450.0).contains(&b.x));
				assert!((50.0..=350.0).contains(&b.y));
			}
		}
		assert_eq!(engine.phase(), LayoutPhase::Settled);
	}

	#[test]
	fn test_mode_switch_discards_simulation_and_velocity() {
		let graph = chain(5);
		let mut engine = LayoutEngine::new(Viewport::default());
		engine.layout(&graph, LayoutMode::Force, -350.0, MetricKey::Degree);
		for _ in 0..20 {
			engine.tick();
		}
		assert!(engine.bodies().iter().any(|b| b.vx != 0.0 || b.vy != 0.0));
		engine.body_mut(0).unwrap().fx = Some(100.0);

		engine.layout(&graph, LayoutMode::Circular, -350.0, MetricKey::Degree);
		assert!(engine.simulation().is_none());
		assert!(!engine.tick());
		for b in engine.bodies() {
			assert_eq!((b.vx, b.vy, b.fx, b.fy), (0.0, 0.0, None, None));
		}
	}

	#[test]
	fn test_reentering_force_does_not_replay_prior_trajectory() {
		let graph = chain(5);
		let mut engine = LayoutEngine::new(Viewport::default());
		engine.layout(&graph, LayoutMode::Force, -350.0, MetricKey::Degree);
		let first_start = engine.bodies().to_vec();
		for _ in 0..10 {
			engine.tick();
		}
		let first_run = engine.bodies().to_vec();

		engine.layout(&graph, LayoutMode::Circular, -350.0, MetricKey::Degree);
		engine.layout(&graph, LayoutMode::Force, -350.0, MetricKey::Degree);
		let second_start = engine.bodies().to_vec();
		assert!(second_start.iter().all(|b| b.vx == 0.0 && b.vy == 0.0));
		assert_ne!(first_start, second_start);
		for _ in 0..10 {
			engine.tick();
		}
		assert_ne!(engine.bodies(), first_run.as_slice());
	}

	#[test]
	fn test_force_strength_is_live_tuned() {
		let graph = chain(4);
		let mut engine = LayoutEngine::new(Viewport::default());
		engine.layout(&graph, LayoutMode::Force, -350.0, MetricKey::Degree);
		while engine.tick() {}
		let settled = engine.bodies().to_vec();

		engine.set_force_strength(-1200.0);
		assert_eq!(engine.bodies(), settled.as_slice(), "positions kept");
		let sim = engine.simulation().unwrap();
		assert_eq!(sim.parameters().charge_strength, -1200.0);
		assert!(sim.is_running());
		assert_eq!(sim.alpha(), 0.3);
	}

	#[test]
	fn test_resize_recomputes_static_and_retargets_force() {
		let graph = chain(6);
		let mut engine = LayoutEngine::new(Viewport::new(800.0, 600.0));
		engine.layout(&graph, LayoutMode::Circular, -350.0, MetricKey::Degree);
		engine.resize(&graph, Viewport::new(400.0, 400.0));
		let mut expected = LayoutEngine::new(Viewport::new(400.0, 400.0));
		expected.layout(&graph, LayoutMode::Circular, -350.0, MetricKey::Degree);
		assert_eq!(engine.bodies(), expected.bodies());

		engine.layout(&graph, LayoutMode::Force, -350.0, MetricKey::Degree);
		while engine.tick() {}
		engine.resize(&graph, Viewport::new(300.0, 200.0));
		assert!(engine.is_simulating());
		for b in engine.bodies() {
			assert!((50.0..=250.0).contains(&b.x));
			assert!((50.0..=150.0).contains(&b.y));
		}
	}

	#[test]
	fn test_degenerate_static_position_falls_back_to_centre() {
		let graph = chain(3);
		let mut engine = LayoutEngine::new(Viewport::new(800.0, 600.0));
		engine.layout(&graph, LayoutMode::Circular, -350.0, MetricKey::Degree);
		let others = (engine.bodies()[0], engine.bodies()[2]);

		engine.place(1, f64::NAN, 10.0);
		assert_eq!(engine.bodies()[1], Body::at(400.0, 300.0));
		engine.place(1, 10.0, f64::INFINITY);
		assert_eq!(engine.bodies()[1], Body::at(400.0, 300.0));
		engine.place(1, 120.0, 80.0);
		assert_eq!(engine.bodies()[1], Body::at(120.0, 80.0));
		assert_eq!((engine.bodies()[0], engine.bodies()[2]), others);

		engine.place(7, f64::NAN, f64::NAN);
		assert_eq!(engine.bodies().len(), 3);
	}

	#[test]
	fn test_clear_returns_to_idle() {
		let graph = chain(3);
		let mut engine = LayoutEngine::new(Viewport::default());
		engine.layout(&graph, LayoutMode::Force, -350.0, MetricKey::Degree);
		engine.clear();
		assert_eq!(engine.phase(), LayoutPhase::Idle);
		assert!(engine.bodies().is_empty());
	}
}
