//! Decorative particle field rendered as DOM elements.
//!
//! Particles are generated once per mount and never touched again; their
//! motion is a looping CSS keyframe animation, not part of the canvas loop.

use super::theme::{Color, Palette};

/// Name of the keyframes every particle runs.
pub const DRIFT_KEYFRAMES: &str = "dyn-bg-drift";

/// A single floating particle.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
	/// Stable key for list rendering.
	pub id: usize,
	/// Horizontal position, percent of the viewport.
	pub x: f64,
	/// Vertical position, percent of the viewport.
	pub y: f64,
	/// Diameter in CSS pixels.
	pub size: f64,
	/// Fill and glow color.
	pub color: Color,
	/// Seconds per animation loop.
	pub duration: f64,
	/// Seconds before the first loop starts.
	pub delay: f64,
	/// Horizontal drift.
	pub vx: f64,
	/// Vertical drift.
	pub vy: f64,
}

impl Particle {
	/// Inline style positioning the particle and attaching its animation.
	pub fn style(&self) -> String {
		let color = self.color.to_css_rgb();
		format!(
			"left: {:.3}%; top: {:.3}%; width: {:.2}px; height: {:.2}px; \
			 background-color: {color}; box-shadow: 0 0 {:.2}px {color}; \
			 animation: {DRIFT_KEYFRAMES} {:.2}s ease-in-out {:.2}s infinite;",
			self.x,
			self.y,
			self.size,
			self.size,
			self.size * 2.0,
			self.duration,
			self.delay,
		)
	}
}

/// The generated set of particles for one mount.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleField {
	/// Particles in generation order.
	pub particles: Vec<Particle>,
}

impl ParticleField {
	/// Generates exactly `count` particles from `rng`.
	pub fn generate(count: usize, palette: &Palette, rng: &mut fastrand::Rng) -> Self {
		let particles = (0..count)
			.map(|id| Particle {
				id,
				x: rng.f64() * 100.0,
				y: rng.f64() * 100.0,
				size: rng.f64() * 1.5 + 0.5,
				color: palette.get(rng.usize(..palette.len().max(1))),
				duration: rng.f64() * 8.0 + 6.0,
				delay: rng.f64() * 2.0,
				vx: (rng.f64() - 0.5) * 0.2,
				vy: (rng.f64() - 0.5) * 0.2,
			})
			.collect();

		Self { particles }
	}

	/// The field shown when animation is disabled.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Number of particles.
	pub fn len(&self) -> usize {
		self.particles.len()
	}
}
