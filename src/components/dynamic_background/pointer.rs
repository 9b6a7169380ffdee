//! Pointer tracking for the follow glow.
//!
//! Moves are throttled, and each accepted move marks the pointer as moving
//! and pushes out an idle deadline. The owning component arms a timer for that
//! deadline and calls [`PointerTracker::on_idle`] when it fires.

use super::network::Viewport;
use super::timing::{IdleTimeout, Throttle};

const GLOW_MOVING: &str = "radial-gradient(circle, rgba(99, 102, 241, 0.3) 0%, \
	rgba(6, 182, 212, 0.1) 50%, transparent 100%)";
const GLOW_IDLE: &str = "radial-gradient(circle, rgba(99, 102, 241, 0.1) 0%, \
	rgba(6, 182, 212, 0.05) 50%, transparent 100%)";

/// Where the pointer is, as percentages of the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerState {
	pub x: f64,
	pub y: f64,
	pub is_moving: bool,
}

impl PointerState {
	/// Viewport center, not moving.
	pub const CENTERED: Self = Self {
		x: 50.0,
		y: 50.0,
		is_moving: false,
	};

	/// Inline style for the glow overlay.
	pub fn glow_style(&self) -> String {
		let background = if self.is_moving { GLOW_MOVING } else { GLOW_IDLE };
		format!(
			"left: {:.2}%; top: {:.2}%; background: {background};",
			self.x, self.y
		)
	}
}

impl Default for PointerState {
	fn default() -> Self {
		Self::CENTERED
	}
}

/// Single writer of [`PointerState`].
#[derive(Clone, Debug)]
pub struct PointerTracker {
	state: PointerState,
	throttle: Throttle,
	idle: IdleTimeout,
}

impl PointerTracker {
	pub fn new(throttle_ms: f64, idle_timeout_ms: f64) -> Self {
		Self {
			state: PointerState::CENTERED,
			throttle: Throttle::new(throttle_ms),
			idle: IdleTimeout::new(idle_timeout_ms),
		}
	}

	pub fn idle_timeout_ms(&self) -> f64 {
		self.idle.timeout_ms()
	}

	/// Feeds a move at client coordinates. Returns the new state when the
	/// sample gets through the throttle, `None` when it is dropped.
	pub fn on_move(
		&mut self,
		client_x: f64,
		client_y: f64,
		viewport: Viewport,
		now: f64,
	) -> Option<PointerState> {
		if viewport.width <= 0.0 || viewport.height <= 0.0 || !self.throttle.ready(now) {
			return None;
		}
		self.state = PointerState {
			x: (client_x / viewport.width * 100.0).clamp(0.0, 100.0),
			y: (client_y / viewport.height * 100.0).clamp(0.0, 100.0),
			is_moving: true,
		};
		self.idle.touch(now);
		Some(self.state)
	}

	/// Time at which the pointer turns idle unless it moves again.
	pub fn idle_deadline(&self) -> Option<f64> {
		self.idle.deadline()
	}

	/// Flips `is_moving` off once the idle deadline has passed. Returns the
	/// new state on that edge only.
	pub fn on_idle(&mut self, now: f64) -> Option<PointerState> {
		if !self.idle.expire(now) {
			return None;
		}
		self.state.is_moving = false;
		Some(self.state)
	}

	/// Back to the centered default with nothing pending.
	pub fn reset(&mut self) -> PointerState {
		self.idle.reset();
		self.state = PointerState::CENTERED;
		self.state
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const HD: Viewport = Viewport {
		width: 1920.0,
		height: 1080.0,
	};

	#[test]
	fn starts_with_nothing_pending() {
		let mut tracker = PointerTracker::new(16.0, 500.0);
		assert_eq!(tracker.idle_deadline(), None);
		assert!(tracker.on_idle(10_000.0).is_none());
	}

	#[test]
	fn converts_client_coordinates_to_percent() {
		let mut tracker = PointerTracker::new(16.0, 500.0);
		let state = tracker.on_move(480.0, 810.0, HD, 0.0).unwrap();
		assert_eq!(state.x, 25.0);
		assert_eq!(state.y, 75.0);
		assert!(state.is_moving);
	}

	#[test]
	fn drops_moves_inside_throttle_window() {
		let mut tracker = PointerTracker::new(16.0, 500.0);
		assert!(tracker.on_move(0.0, 0.0, HD, 0.0).is_some());
		assert!(tracker.on_move(960.0, 540.0, HD, 8.0).is_none());
		assert_eq!(tracker.idle_deadline(), Some(500.0));
		let state = tracker.on_move(960.0, 540.0, HD, 16.0).unwrap();
		assert_eq!(state.x, 50.0);
	}

	#[test]
	fn goes_idle_once_after_timeout() {
		let mut tracker = PointerTracker::new(16.0, 500.0);
		tracker.on_move(960.0, 540.0, HD, 1_000.0).unwrap();
		assert_eq!(tracker.idle_deadline(), Some(1_500.0));

		let mut transitions = Vec::new();
		for now in (1_000..=2_500).step_by(50) {
			if let Some(state) = tracker.on_idle(now as f64) {
				transitions.push((now, state));
			}
		}

		assert_eq!(transitions.len(), 1);
		let (at, state) = transitions[0];
		assert!(at as f64 >= 1_000.0 + tracker.idle_timeout_ms());
		assert_eq!((state.x, state.y, state.is_moving), (50.0, 50.0, false));
	}

	#[test]
	fn new_move_restarts_idle_timeout() {
		let mut tracker = PointerTracker::new(16.0, 500.0);
		tracker.on_move(10.0, 10.0, HD, 0.0).unwrap();
		tracker.on_move(20.0, 20.0, HD, 400.0).unwrap();

		assert!(tracker.on_idle(500.0).is_none());
		let idle = tracker.on_idle(900.0).unwrap();
		assert_eq!((idle.x, idle.is_moving), (20.0 / 1920.0 * 100.0, false));
	}

	#[test]
	fn degenerate_viewport_is_ignored() {
		let mut tracker = PointerTracker::new(16.0, 500.0);
		assert!(tracker.on_move(10.0, 10.0, Viewport::default(), 0.0).is_none());
	}

	#[test]
	fn reset_recenters_and_cancels_idle() {
		let mut tracker = PointerTracker::new(16.0, 500.0);
		tracker.on_move(10.0, 10.0, HD, 0.0).unwrap();
		assert_eq!(tracker.reset(), PointerState::CENTERED);
		assert!(tracker.on_idle(10_000.0).is_none());
	}

	#[test]
	fn glow_style_switches_with_motion() {
		let idle = PointerState::CENTERED.glow_style();
		let moving = PointerState {
			is_moving: true,
			..PointerState::CENTERED
		}
		.glow_style();
		assert!(idle.starts_with("left: 50.00%; top: 50.00%;"));
		assert!(idle.contains("0.1) 0%"));
		assert!(moving.contains("0.3) 0%"));
	}
}
