//! Cooperative force simulation.
//!
//! Mirrors the classic velocity-Verlet force model: every tick cools `alpha`
//! towards `alpha_target`, accumulates link, charge, centering, collision and
//! axis forces into node velocities, damps and integrates them, then clamps
//! every node into the padded viewport. There is no timer here; an external
//! tick source calls [`ForceSimulation::tick`] once per frame.

use log::debug;

use super::layout::{Body, Viewport};

/// Tunable constants of the force model.
#[derive(Clone, Debug, PartialEq)]
pub struct ForceParameters {
	/// Rest length of every link.
	pub link_distance: f64,
	/// Fraction of the length error corrected per tick.
	pub link_strength: f64,
	/// Many-body strength. Negative values repel.
	pub charge_strength: f64,
	/// Per-node collision radius.
	pub collision_radius: f64,
	/// Strength of the weak springs pulling each axis to the centre.
	pub axis_strength: f64,
	/// Minimum distance kept between any node and the viewport edge.
	pub padding: f64,
	/// The simulation settles once alpha drops below this.
	pub alpha_min: f64,
	/// Fraction of the distance to the alpha target covered per tick.
	pub alpha_decay: f64,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
	/// Alpha target held while a node is dragged.
	pub drag_alpha_target: f64,
	/// Alpha a reheat jumps to.
	pub reheat_alpha: f64,
}

impl Default for ForceParameters {
	fn default() -> Self {
		let alpha_min: f64 = 0.001;
		Self {
			link_distance: 130.0,
			link_strength: 0.2,
			charge_strength: -350.0,
			collision_radius: 60.0,
			axis_strength: 0.05,
			padding: 50.0,
			alpha_min,
			// Cools from 1 to alpha_min in ~300 ticks.
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			velocity_decay: 0.4,
			drag_alpha_target: 0.3,
			reheat_alpha: 0.3,
		}
	}
}

/// Whether the last tick moved anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationStatus {
	/// Nodes moved and the simulation wants more ticks.
	Simulating,
	/// Cooled below `alpha_min` or stopped; nothing moved.
	Settled,
}

/// Linear congruential generator used for initial jitter and tie breaking.
#[derive(Clone, Debug)]
struct Lcg(u64);

impl Lcg {
	const A: u64 = 1_664_525;
	const C: u64 = 1_013_904_223;
	const M: u64 = 1 << 32;

	fn next(&mut self) -> f64 {
		self.0 = (Self::A.wrapping_mul(self.0).wrapping_add(Self::C)) % Self::M;
		self.0 as f64 / Self::M as f64
	}

	/// Tiny non-zero offset for coincident nodes.
	fn jiggle(&mut self) -> f64 {
		let j = (self.next() - 0.5) * 1e-6;
		if j == 0.0 { 1e-7 } else { j }
	}
}

/// Handle to the single live force simulation.
///
/// Node bodies stay owned by the layout engine and are lent to every tick.
#[derive(Clone, Debug)]
pub struct ForceSimulation {
	params: ForceParameters,
	links: Vec<(usize, usize)>,
	/// Share of a link correction applied to the target, by link.
	bias: Vec<f64>,
	viewport: Viewport,
	alpha: f64,
	alpha_target: f64,
	running: bool,
	random: Lcg,
}

impl ForceSimulation {
	/// Build a stopped simulation over `node_count` bodies.
	///
	/// Self loops and links to unknown indices are ignored. `seed` feeds the
	/// initial jitter, so two simulations with different seeds never share a
	/// trajectory.
	pub fn new(
		params: ForceParameters,
		node_count: usize,
		links: impl IntoIterator<Item = (usize, usize)>,
		viewport: Viewport,
		seed: u64,
	) -> Self {
		let links: Vec<(usize, usize)> = links
			.into_iter()
			.filter(|&(s, t)| s != t && s < node_count && t < node_count)
			.collect();

		let mut count = vec![0usize; node_count];
		for &(s, t) in &links {
			count[s] += 1;
			count[t] += 1;
		}
		let bias = links
			.iter()
			.map(|&(s, t)| count[s] as f64 / (count[s] + count[t]) as f64)
			.collect();

		Self {
			params,
			links,
			bias,
			viewport,
			alpha: 1.0,
			alpha_target: 0.0,
			running: false,
			random: Lcg(seed.wrapping_add(1)),
		}
	}

	/// Place bodies on a jittered phyllotaxis spiral around the centre.
	pub fn seed_positions(&mut self, bodies: &mut [Body]) {
		let (cx, cy) = self.viewport.center();
		let angle_step = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
		for (i, body) in bodies.iter_mut().enumerate() {
			let radius = 10.0 * (0.5 + i as f64).sqrt();
			let angle = i as f64 * angle_step;
			let jitter_x = (self.random.next() - 0.5) * 10.0;
			let jitter_y = (self.random.next() - 0.5) * 10.0;
			*body = Body::at(
				cx + radius * angle.cos() + jitter_x,
				cy + radius * angle.sin() + jitter_y,
			);
			self.clamp(body);
		}
	}

	/// Start from full energy.
	pub fn start(&mut self) {
		self.alpha = 1.0;
		self.running = true;
		debug!("graph-weave: simulation started");
	}

	/// Stop ticking. Positions stay where they are.
	pub fn stop(&mut self) {
		if self.running {
			debug!("graph-weave: simulation stopped");
		}
		self.running = false;
	}

	/// Raise the energy back to `reheat_alpha` and resume.
	pub fn reheat(&mut self) {
		self.alpha = self.params.reheat_alpha;
		self.running = true;
	}

	/// Alpha the simulation converges to. A positive target keeps it alive.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
		if target > 0.0 {
			self.running = true;
		}
	}

	/// Replace the charge force without touching positions or velocities.
	pub fn set_charge_strength(&mut self, strength: f64) {
		self.params.charge_strength = strength;
	}

	/// Retarget centering forces and bounds to a new viewport.
	pub fn set_viewport(&mut self, viewport: Viewport) {
		self.viewport = viewport;
	}

	/// Current parameters.
	pub fn parameters(&self) -> &ForceParameters {
		&self.params
	}

	/// Current energy.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Current alpha target.
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	/// True until the simulation cools down or is stopped.
	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Advance one tick if running.
	pub fn tick(&mut self, bodies: &mut [Body]) -> SimulationStatus {
		if !self.running {
			return SimulationStatus::Settled;
		}
		self.step(bodies);
		if self.alpha < self.params.alpha_min {
			self.running = false;
			debug!("graph-weave: simulation settled");
		}
		SimulationStatus::Simulating
	}

	/// One unconditional integration step.
	pub fn step(&mut self, bodies: &mut [Body]) {
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;

		self.apply_links(bodies);
		self.apply_charge(bodies);
		self.apply_center(bodies);
		self.apply_collision(bodies);
		self.apply_axes(bodies);

		let keep = 1.0 - self.params.velocity_decay;
		for body in bodies.iter_mut() {
			match body.fx {
				Some(fx) => {
					body.x = fx;
					body.vx = 0.0;
				}
				None => {
					body.vx *= keep;
					body.x += body.vx;
				}
			}
			match body.fy {
				Some(fy) => {
					body.y = fy;
					body.vy = 0.0;
				}
				None => {
					body.vy *= keep;
					body.y += body.vy;
				}
			}
			self.clamp(body);
		}
	}

	fn apply_links(&mut self, bodies: &mut [Body]) {
		let strength = self.params.link_strength * self.alpha;
		for (&(s, t), &bias) in self.links.iter().zip(&self.bias) {
			let (src, tgt) = (bodies[s], bodies[t]);
			let mut dx = tgt.x + tgt.vx - src.x - src.vx;
			let mut dy = tgt.y + tgt.vy - src.y - src.vy;
			if dx == 0.0 {
				dx = self.random.jiggle();
			}
			if dy == 0.0 {
				dy = self.random.jiggle();
			}
			let len = (dx * dx + dy * dy).sqrt();
			let k = (len - self.params.link_distance) / len * strength;
			let (dx, dy) = (dx * k, dy * k);
			bodies[t].vx -= dx * bias;
			bodies[t].vy -= dy * bias;
			bodies[s].vx += dx * (1.0 - bias);
			bodies[s].vy += dy * (1.0 - bias);
		}
	}

	fn apply_charge(&mut self, bodies: &mut [Body]) {
		let strength = self.params.charge_strength * self.alpha;
		let n = bodies.len();
		for i in 0..n {
			let (mut ax, mut ay) = (0.0, 0.0);
			for j in 0..n {
				if i == j {
					continue;
				}
				let mut dx = bodies[j].x - bodies[i].x;
				let mut dy = bodies[j].y - bodies[i].y;
				let mut dist2 = dx * dx + dy * dy;
				if dx == 0.0 {
					dx = self.random.jiggle();
					dist2 += dx * dx;
				}
				if dy == 0.0 {
					dy = self.random.jiggle();
					dist2 += dy * dy;
				}
				// Soften very close pairs instead of exploding.
				if dist2 < 1.0 {
					dist2 = dist2.sqrt();
				}
				let w = strength / dist2;
				ax += dx * w;
				ay += dy * w;
			}
			bodies[i].vx += ax;
			bodies[i].vy += ay;
		}
	}

	fn apply_center(&self, bodies: &mut [Body]) {
		if bodies.is_empty() {
			return;
		}
		let n = bodies.len() as f64;
		let (cx, cy) = self.viewport.center();
		let mean_x = bodies.iter().map(|b| b.x).sum::<f64>() / n;
		let mean_y = bodies.iter().map(|b| b.y).sum::<f64>() / n;
		let (sx, sy) = (mean_x - cx, mean_y - cy);
		for body in bodies.iter_mut() {
			body.x -= sx;
			body.y -= sy;
		}
	}

	fn apply_collision(&mut self, bodies: &mut [Body]) {
		let min_dist = self.params.collision_radius * 2.0;
		let n = bodies.len();
		for i in 0..n {
			let xi = bodies[i].x + bodies[i].vx;
			let yi = bodies[i].y + bodies[i].vy;
			for j in (i + 1)..n {
				let mut dx = xi - bodies[j].x - bodies[j].vx;
				let mut dy = yi - bodies[j].y - bodies[j].vy;
				let mut dist2 = dx * dx + dy * dy;
				if dist2 >= min_dist * min_dist {
					continue;
				}
				if dx == 0.0 {
					dx = self.random.jiggle();
					dist2 += dx * dx;
				}
				if dy == 0.0 {
					dy = self.random.jiggle();
					dist2 += dy * dy;
				}
				let dist = dist2.sqrt();
				let k = (min_dist - dist) / dist;
				// Equal radii: each body takes half the correction.
				let (px, py) = (dx * k * 0.5, dy * k * 0.5);
				bodies[i].vx += px;
				bodies[i].vy += py;
				bodies[j].vx -= px;
				bodies[j].vy -= py;
			}
		}
	}

	fn apply_axes(&self, bodies: &mut [Body]) {
		let (cx, cy) = self.viewport.center();
		let k = self.params.axis_strength * self.alpha;
		for body in bodies.iter_mut() {
			body.vx += (cx - body.x) * k;
			body.vy += (cy - body.y) * k;
		}
	}

	fn clamp(&self, body: &mut Body) {
		let (x, y) = self
			.viewport
			.clamp_point(body.x, body.y, self.params.padding);
		body.x = x;
		body.y = y;
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	fn viewport() -> Viewport {
		Viewport::new(800.0, 600.0)
	}

	fn seeded(n: usize, links: Vec<(usize, usize)>, seed: u64) -> (ForceSimulation, Vec<Body>) {
		let mut sim = ForceSimulation::new(ForceParameters::default(), n, links, viewport(), seed);
		let mut bodies = vec![Body::default(); n];
		sim.seed_positions(&mut bodies);
		sim.start();
		(sim, bodies)
	}

	#[test]
	fn test_default_parameters() {
		let p = ForceParameters::default();
		assert_eq!(p.link_distance, 130.0);
		assert_eq!(p.link_strength, 0.2);
		assert_eq!(p.charge_strength, -350.0);
		assert_eq!(p.collision_radius, 60.0);
		assert_eq!(p.axis_strength, 0.05);
		assert_eq!(p.padding, 50.0);
		assert!((p.alpha_decay - 0.0228).abs() < 1e-3);
	}

	#[test]
	fn test_simulation_cools_and_settles() {
		let (mut sim, mut bodies) = seeded(6, vec![(0, 1), (1, 2), (2, 3)], 1);
		let mut ticks = 0;
		while sim.tick(&mut bodies) == SimulationStatus::Simulating {
			ticks += 1;
			assert!(ticks < 1000, "never settled");
		}
		assert!(!sim.is_running());
		assert!(sim.alpha() < sim.parameters().alpha_min);
		assert_eq!(sim.tick(&mut bodies), SimulationStatus::Settled);
	}

	#[test]
	fn test_linked_pair_approaches_link_distance() {
		let (mut sim, mut bodies) = seeded(2, vec![(0, 1)], 3);
		sim.set_charge_strength(0.0);
		for _ in 0..300 {
			sim.tick(&mut bodies);
		}
		let d = ((bodies[0].x - bodies[1].x).powi(2) + (bodies[0].y - bodies[1].y).powi(2)).sqrt();
		assert!((d - 130.0).abs() < 30.0, "distance {d}");
	}

	#[test]
	fn test_pinned_body_stays_put() {
		let (mut sim, mut bodies) = seeded(4, vec![(0, 1), (0, 2), (0, 3)], 5);
		bodies[0].fx = Some(200.0);
		bodies[0].fy = Some(150.0);
		for _ in 0..50 {
			sim.tick(&mut bodies);
		}
		assert_eq!((bodies[0].x, bodies[0].y), (200.0, 150.0));
		assert_eq!((bodies[0].vx, bodies[0].vy), (0.0, 0.0));
	}

	#[test]
	fn test_charge_change_keeps_state() {
		let (mut sim, mut bodies) = seeded(3, vec![(0, 1)], 2);
		for _ in 0..10 {
			sim.tick(&mut bodies);
		}
		let before = bodies.clone();
		let alpha = sim.alpha();
		sim.set_charge_strength(-50.0);
		assert_eq!(bodies, before);
		assert_eq!(sim.alpha(), alpha);
		assert_eq!(sim.parameters().charge_strength, -50.0);
		sim.reheat();
		assert_eq!(sim.alpha(), 0.3);
		assert!(sim.is_running());
	}

	#[test]
	fn test_alpha_target_keeps_simulation_warm() {
		let (mut sim, mut bodies) = seeded(3, vec![], 4);
		sim.set_alpha_target(0.3);
		for _ in 0..2000 {
			sim.tick(&mut bodies);
		}
		assert!(sim.is_running());
		assert!((sim.alpha() - 0.3).abs() < 1e-3);
	}

	#[test]
	fn test_different_seeds_diverge() {
		let (_, a) = seeded(5, vec![], 1);
		let (_, b) = seeded(5, vec![], 2);
		assert_ne!(a, b);
	}

	proptest! {
		#[test]
		fn test_bodies_stay_inside_padding_for_any_strength(
			strength in -20000.0f64..5000.0,
			n in 1usize..25,
			seed in 0u64..1000,
		) {
			let links: Vec<(usize, usize)> = (1..n).map(|i| (i - 1, i)).collect();
			let (mut sim, mut bodies) = seeded(n, links, seed);
			sim.set_charge_strength(strength);
			for _ in 0..60 {
				sim.tick(&mut bodies);
				for b in &bodies {
					prop_assert!(b.x >= 50.0 && b.x <= 750.0, "x = {}", b.x);
					prop_assert!(b.y >= 50.0 && b.y <= 550.0, "y = {}", b.y);
				}
			}
		}
	}
}
