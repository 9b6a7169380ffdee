//! Node network simulation.
//!
//! A handful of points drift at constant speed and bounce off the viewport
//! edges. Pairs closer than the connection distance are linked, with line
//! opacity fading linearly with distance. There is no spatial index; the pair
//! scan is O(n²) and node counts stay small.

/// Viewport bounds in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// Inner size of the browser window, if there is one.
	pub fn of_window() -> Option<Self> {
		let window = web_sys::window()?;
		Some(Self::new(
			window.inner_width().ok()?.as_f64()?,
			window.inner_height().ok()?.as_f64()?,
		))
	}
}

/// A moving point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
}

impl Node {
	pub fn new(x: f64, y: f64, vx: f64, vy: f64) -> Self {
		Self { x, y, vx, vy }
	}

	pub fn distance_to(&self, other: &Node) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}

/// One axis of motion with elastic reflection at `0` and `max`.
///
/// A step that crosses a bound mirrors the overshoot back inside and inverts
/// the velocity. A position already outside (after the viewport shrank) is
/// left alone and only the velocity is turned inward.
fn advance_axis(pos: &mut f64, vel: &mut f64, max: f64) {
	let outside = *pos < 0.0 || *pos > max;
	if outside {
		if *pos < 0.0 {
			*vel = vel.abs();
		} else {
			*vel = -vel.abs();
		}
		*pos += *vel;
		return;
	}

	*pos += *vel;
	if *pos <= 0.0 {
		*pos = (-*pos).min(max);
		*vel = -*vel;
	} else if *pos >= max {
		*pos = (2.0 * max - *pos).max(0.0);
		*vel = -*vel;
	}
}

/// Line opacity for two nodes `distance` apart.
///
/// `max_alpha` at distance zero, falling linearly to zero at `threshold`.
/// Returns `None` at or beyond the threshold, where no line is drawn.
pub fn connection_alpha(distance: f64, threshold: f64, max_alpha: f64) -> Option<f64> {
	if distance.is_nan() || distance >= threshold {
		return None;
	}
	Some((1.0 - distance / threshold) * max_alpha)
}

/// A line between two nodes, ready to stroke.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
	pub from: (f64, f64),
	pub to: (f64, f64),
	pub alpha: f64,
}

/// The node collection for one mount.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeGraph {
	nodes: Vec<Node>,
	bounds: Viewport,
}

impl NodeGraph {
	/// Scatters `count` nodes uniformly over `bounds` with per-axis speeds in
	/// `[-max_speed, max_speed)`.
	pub fn scatter(count: usize, bounds: Viewport, max_speed: f64, rng: &mut fastrand::Rng) -> Self {
		let nodes = (0..count)
			.map(|_| {
				Node::new(
					rng.f64() * bounds.width,
					rng.f64() * bounds.height,
					(rng.f64() - 0.5) * 2.0 * max_speed,
					(rng.f64() - 0.5) * 2.0 * max_speed,
				)
			})
			.collect();

		Self { nodes, bounds }
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn bounds(&self) -> Viewport {
		self.bounds
	}

	/// Positions are kept as they are; nodes outside the new bounds drift back.
	pub fn set_bounds(&mut self, bounds: Viewport) {
		self.bounds = bounds;
	}

	/// Advances every node by one frame.
	pub fn step(&mut self) {
		let Viewport { width, height } = self.bounds;
		for node in &mut self.nodes {
			advance_axis(&mut node.x, &mut node.vx, width);
			advance_axis(&mut node.y, &mut node.vy, height);
		}
	}

	/// Visible links for the current positions, each unordered pair once.
	pub fn links(&self, threshold: f64, max_alpha: f64) -> Vec<Link> {
		let mut links = Vec::new();
		for (i, a) in self.nodes.iter().enumerate() {
			for b in &self.nodes[i + 1..] {
				if let Some(alpha) = connection_alpha(a.distance_to(b), threshold, max_alpha) {
					links.push(Link {
						from: (a.x, a.y),
						to: (b.x, b.y),
						alpha,
					});
				}
			}
		}
		links
	}
}

#[cfg(test)]
impl NodeGraph {
	pub fn from_nodes(nodes: Vec<Node>, bounds: Viewport) -> Self {
		Self { nodes, bounds }
	}
}

#[cfg(test)]
impl Viewport {
	pub fn contains(&self, x: f64, y: f64) -> bool {
		(0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
	}
}
