//! Pointer dragging of single nodes.
//!
//! In Force mode a drag pins the node (`fx`/`fy`) and keeps the simulation
//! warm; releasing unpins it so it rejoins the simulation. In the static
//! modes the node simply follows the pointer and stays where it is dropped.

use log::trace;

use super::layout::{LayoutEngine, LayoutMode};

/// What the caller should do after a drag event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragOutcome {
	/// Nothing changed.
	Ignored,
	/// The simulation will move things on its next tick.
	SimulationDriven,
	/// No simulation is running; redraw now.
	NeedsRedraw,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActiveDrag {
	index: usize,
	mode: LayoutMode,
}

/// Tracks the node under the pointer between press and release.
#[derive(Clone, Debug, Default)]
pub struct InteractionController {
	active: Option<ActiveDrag>,
}

impl InteractionController {
	/// Controller with no drag in progress.
	pub fn new() -> Self {
		Self::default()
	}

	/// Index of the node being dragged.
	pub fn dragging(&self) -> Option<usize> {
		self.active.map(|d| d.index)
	}

	/// Pin `index` where it currently is.
	pub fn drag_start(&mut self, layout: &mut LayoutEngine, index: usize) -> DragOutcome {
		let mode = layout.mode();
		let Some(body) = layout.body_mut(index) else {
			return DragOutcome::Ignored;
		};
		body.fx = Some(body.x);
		body.fy = Some(body.y);
		self.active = Some(ActiveDrag { index, mode });
		trace!("graph-weave: drag start on node {}", index);

		match layout.simulation_mut() {
			Some(sim) => {
				let target = sim.parameters().drag_alpha_target;
				sim.set_alpha_target(target);
				DragOutcome::SimulationDriven
			}
			None => DragOutcome::NeedsRedraw,
		}
	}

	/// Move the dragged node to the pointer, clamped into the viewport.
	pub fn drag_move(&mut self, layout: &mut LayoutEngine, x: f64, y: f64) -> DragOutcome {
		let Some(drag) = self.active else {
			return DragOutcome::Ignored;
		};
		let (x, y) = layout.clamp_point(x, y);
		let Some(body) = layout.body_mut(drag.index) else {
			self.active = None;
			return DragOutcome::Ignored;
		};
		body.fx = Some(x);
		body.fy = Some(y);
		if drag.mode.is_static() {
			body.x = x;
			body.y = y;
			DragOutcome::NeedsRedraw
		} else {
			DragOutcome::SimulationDriven
		}
	}

	/// Release the dragged node.
	pub fn drag_end(&mut self, layout: &mut LayoutEngine) -> DragOutcome {
		let Some(drag) = self.active.take() else {
			return DragOutcome::Ignored;
		};
		if let Some(body) = layout.body_mut(drag.index) {
			body.fx = None;
			body.fy = None;
		}
		trace!("graph-weave: drag end on node {}", drag.index);

		match layout.simulation_mut() {
			Some(sim) => {
				sim.set_alpha_target(0.0);
				DragOutcome::SimulationDriven
			}
			None => DragOutcome::NeedsRedraw,
		}
	}
}
