//! Timestamp-driven throttle and idle detection.
//!
//! Both take the current time (milliseconds, e.g. `performance.now()`) as an
//! argument instead of reading a clock, so they can be driven by hand.

/// Leading-edge throttle: the first call in a window passes, the rest are
/// dropped until `interval_ms` has elapsed.
#[derive(Clone, Debug)]
pub struct Throttle {
	interval_ms: f64,
	last: Option<f64>,
}

impl Throttle {
	pub fn new(interval_ms: f64) -> Self {
		Self {
			interval_ms,
			last: None,
		}
	}

	/// Returns `true` and opens a new window if the previous one has closed.
	pub fn ready(&mut self, now: f64) -> bool {
		match self.last {
			Some(last) if now - last < self.interval_ms => false,
			_ => {
				self.last = Some(now);
				true
			}
		}
	}

	/// Milliseconds until the current window closes; zero when already open.
	pub fn remaining(&self, now: f64) -> f64 {
		self.last
			.map(|last| (self.interval_ms - (now - last)).max(0.0))
			.unwrap_or(0.0)
	}

	/// Opens a new window at `now` regardless of the previous one.
	pub fn restart(&mut self, now: f64) {
		self.last = Some(now);
	}
}

/// What to do with an event seen by a [`TrailingThrottle`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pace {
	/// Handle it now.
	Apply,
	/// Handle it after this many milliseconds, then call
	/// [`TrailingThrottle::fire_trailing`].
	Defer(f64),
	/// A trailing call is already pending; ignore it.
	Drop,
}

/// Leading-edge throttle that also schedules one trailing call, so the last
/// event of a burst is never lost.
#[derive(Clone, Debug)]
pub struct TrailingThrottle {
	throttle: Throttle,
	trailing: bool,
}

impl TrailingThrottle {
	pub fn new(interval_ms: f64) -> Self {
		Self {
			throttle: Throttle::new(interval_ms),
			trailing: false,
		}
	}

	pub fn on_event(&mut self, now: f64) -> Pace {
		if self.throttle.ready(now) {
			self.trailing = false;
			Pace::Apply
		} else if self.trailing {
			Pace::Drop
		} else {
			self.trailing = true;
			Pace::Defer(self.throttle.remaining(now))
		}
	}

	/// The deferred call ran; it counts as the start of a new window.
	pub fn fire_trailing(&mut self, now: f64) {
		self.trailing = false;
		self.throttle.restart(now);
	}
}

/// Debounce-style idle detector.
///
/// Every [`touch`](Self::touch) pushes the deadline out to `now + timeout`.
/// [`expire`](Self::expire) reports the busy-to-idle edge exactly once.
#[derive(Clone, Debug)]
pub struct IdleTimeout {
	timeout_ms: f64,
	deadline: Option<f64>,
}

impl IdleTimeout {
	pub fn new(timeout_ms: f64) -> Self {
		Self {
			timeout_ms,
			deadline: None,
		}
	}

	pub fn timeout_ms(&self) -> f64 {
		self.timeout_ms
	}

	pub fn touch(&mut self, now: f64) {
		self.deadline = Some(now + self.timeout_ms);
	}

	pub fn deadline(&self) -> Option<f64> {
		self.deadline
	}

	/// `true` only on the first call at or after the deadline.
	pub fn expire(&mut self, now: f64) -> bool {
		match self.deadline {
			Some(deadline) if now >= deadline => {
				self.deadline = None;
				true
			}
			_ => false,
		}
	}

	pub fn reset(&mut self) {
		self.deadline = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn throttle_drops_calls_inside_window() {
		let mut throttle = Throttle::new(16.0);
		assert!(throttle.ready(0.0));
		assert!(!throttle.ready(5.0));
		assert!(!throttle.ready(15.9));
		assert!(throttle.ready(16.0));
		assert!(!throttle.ready(20.0));
		assert!(throttle.ready(40.0));
	}

	#[test]
	fn throttle_reports_remaining_window() {
		let mut throttle = Throttle::new(500.0);
		assert_eq!(throttle.remaining(0.0), 0.0);
		throttle.ready(100.0);
		assert_eq!(throttle.remaining(300.0), 300.0);
		assert_eq!(throttle.remaining(700.0), 0.0);
	}

	#[test]
	fn idle_fires_once_after_quiet_period() {
		let mut idle = IdleTimeout::new(500.0);
		assert!(!idle.expire(1_000.0));

		idle.touch(0.0);
		idle.touch(100.0);
		assert!(!idle.expire(550.0));
		assert!(idle.expire(600.0));
		assert!(!idle.expire(700.0));
		assert_eq!(idle.deadline(), None);
	}

	#[test]
	fn reset_cancels_pending_deadline() {
		let mut idle = IdleTimeout::new(500.0);
		idle.touch(0.0);
		idle.reset();
		assert!(!idle.expire(10_000.0));
	}

	#[test]
	fn burst_applies_first_and_defers_one_trailing_call() {
		let mut pacer = TrailingThrottle::new(500.0);
		assert_eq!(pacer.on_event(0.0), Pace::Apply);
		assert_eq!(pacer.on_event(100.0), Pace::Defer(400.0));
		assert_eq!(pacer.on_event(200.0), Pace::Drop);
		assert_eq!(pacer.on_event(450.0), Pace::Drop);

		pacer.fire_trailing(500.0);
		assert_eq!(pacer.on_event(700.0), Pace::Defer(300.0));
	}

	#[test]
	fn event_after_window_applies_and_supersedes_trailing() {
		let mut pacer = TrailingThrottle::new(500.0);
		assert_eq!(pacer.on_event(0.0), Pace::Apply);
		assert_eq!(pacer.on_event(10.0), Pace::Defer(490.0));
		// The timer was late; a fresh event wins and the trailing call is dropped.
		assert_eq!(pacer.on_event(600.0), Pace::Apply);
		assert_eq!(pacer.on_event(650.0), Pace::Defer(450.0));
	}

	#[test]
	fn quiet_periods_always_apply() {
		let mut pacer = TrailingThrottle::new(500.0);
		for t in [0.0, 500.0, 1_200.0, 5_000.0] {
			assert_eq!(pacer.on_event(t), Pace::Apply);
		}
	}
}
