//! Frame loop for the node network.
//!
//! [`NodeGraphRenderer`] owns the simulation, the drawing surface and the
//! pending frame request. The surrounding component only calls `start`,
//! `set_tab_visible` / `set_in_viewport`, `resize` and `stop`.
//!
//! While paused the frame callback keeps being rescheduled but does no work,
//! so resuming needs no setup.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use super::network::NodeGraph;
use super::render::{DrawingSurface, SurfaceSize, draw_network};
use super::theme::NetworkStyle;
use super::timing::Throttle;

/// Requests and cancels frame callbacks.
pub trait FrameScheduler {
	/// Schedules the next frame callback. `None` if the host refused.
	fn request(&mut self) -> Option<i32>;
	fn cancel(&mut self, handle: i32);
}

/// Where the renderer is in its life.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RendererPhase {
	#[default]
	NotStarted,
	Running,
	Paused,
	Stopped,
}

/// Per-mount drawing parameters.
#[derive(Clone, Debug)]
pub struct RendererSettings {
	pub style: NetworkStyle,
	pub connection_distance: f64,
	pub frame_interval_ms: f64,
}

pub struct NodeGraphRenderer<S, F> {
	graph: NodeGraph,
	surface: S,
	scheduler: F,
	style: NetworkStyle,
	connection_distance: f64,
	throttle: Throttle,
	phase: RendererPhase,
	tab_visible: bool,
	in_viewport: bool,
	pending: Option<i32>,
	frames_drawn: u64,
}

impl<S: DrawingSurface, F: FrameScheduler> NodeGraphRenderer<S, F> {
	pub fn new(graph: NodeGraph, surface: S, scheduler: F, settings: RendererSettings) -> Self {
		Self {
			graph,
			surface,
			scheduler,
			style: settings.style,
			connection_distance: settings.connection_distance,
			throttle: Throttle::new(settings.frame_interval_ms),
			phase: RendererPhase::NotStarted,
			tab_visible: true,
			in_viewport: true,
			pending: None,
			frames_drawn: 0,
		}
	}

	/// Begins the frame loop. Starts paused when the tab is hidden or the
	/// container is off screen. Only has an effect once.
	pub fn start(&mut self) {
		if self.phase != RendererPhase::NotStarted {
			return;
		}
		self.phase = self.active_phase();
		info!(
			"dyn-backdrop: node network started ({} nodes, {:?})",
			self.graph.nodes().len(),
			self.phase
		);
		self.schedule();
	}

	pub fn set_tab_visible(&mut self, visible: bool) {
		self.tab_visible = visible;
		self.refresh_phase();
	}

	pub fn set_in_viewport(&mut self, in_viewport: bool) {
		self.in_viewport = in_viewport;
		self.refresh_phase();
	}

	fn active_phase(&self) -> RendererPhase {
		if self.tab_visible && self.in_viewport {
			RendererPhase::Running
		} else {
			RendererPhase::Paused
		}
	}

	fn refresh_phase(&mut self) {
		if matches!(self.phase, RendererPhase::Running | RendererPhase::Paused) {
			let next = self.active_phase();
			if next != self.phase {
				debug!("dyn-backdrop: {:?} -> {:?}", self.phase, next);
				self.phase = next;
			}
		}
	}

	/// Frame callback. Returns `true` if this frame was drawn.
	pub fn on_frame(&mut self, timestamp_ms: f64) -> bool {
		self.pending = None;
		let drawn = match self.phase {
			RendererPhase::NotStarted | RendererPhase::Stopped => return false,
			RendererPhase::Paused => false,
			RendererPhase::Running => {
				if self.throttle.ready(timestamp_ms) {
					self.draw();
					true
				} else {
					false
				}
			}
		};
		self.schedule();
		drawn
	}

	fn draw(&mut self) {
		self.surface.clear(self.graph.bounds());
		self.graph.step();
		draw_network(
			&self.graph,
			&mut self.surface,
			&self.style,
			self.connection_distance,
		);
		self.frames_drawn += 1;
	}

	fn schedule(&mut self) {
		if self.pending.is_some() {
			return;
		}
		self.pending = self.scheduler.request();
		if self.pending.is_none() {
			warn!("dyn-backdrop: frame request refused, node network halted");
		}
	}

	/// Resizes the backing store and the simulation bounds. Node positions are
	/// kept.
	pub fn resize(&mut self, size: SurfaceSize) {
		if self.phase == RendererPhase::Stopped {
			return;
		}
		debug!(
			"dyn-backdrop: surface {}x{} @{}x",
			size.css.width, size.css.height, size.pixel_ratio
		);
		self.surface.resize(size);
		self.graph.set_bounds(size.css);
	}

	/// Cancels the pending frame and releases the surface. Idempotent.
	pub fn stop(&mut self) {
		if self.phase == RendererPhase::Stopped {
			return;
		}
		if let Some(handle) = self.pending.take() {
			self.scheduler.cancel(handle);
		}
		self.surface.release();
		self.phase = RendererPhase::Stopped;
		info!(
			"dyn-backdrop: node network stopped after {} frames",
			self.frames_drawn
		);
	}
}

#[cfg(test)]
impl<S, F> NodeGraphRenderer<S, F> {
	pub fn phase(&self) -> RendererPhase {
		self.phase
	}

	pub fn graph(&self) -> &NodeGraph {
		&self.graph
	}

	pub fn frames_drawn(&self) -> u64 {
		self.frames_drawn
	}

	pub fn has_pending_frame(&self) -> bool {
		self.pending.is_some()
	}
}

/// Frame callback slot shared between the scheduler and its owner.
pub type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// [`FrameScheduler`] backed by `requestAnimationFrame`.
pub struct RafScheduler {
	callback: FrameCallback,
}

impl RafScheduler {
	pub fn new(callback: FrameCallback) -> Self {
		Self { callback }
	}
}

impl FrameScheduler for RafScheduler {
	fn request(&mut self) -> Option<i32> {
		let window = web_sys::window()?;
		let callback = self.callback.borrow();
		window
			.request_animation_frame(callback.as_ref()?.as_ref().unchecked_ref())
			.ok()
	}

	fn cancel(&mut self, handle: i32) {
		if let Some(window) = web_sys::window() {
			let _ = window.cancel_animation_frame(handle);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;
	use crate::components::dynamic_background::network::{Node, Viewport};
	use crate::components::dynamic_background::render::recording::{DrawCall, RecordingSurface};

	/// Hands out increasing handles and counts cancellations.
	#[derive(Clone, Default)]
	struct ManualScheduler {
		next: Rc<Cell<i32>>,
		requested: Rc<Cell<u32>>,
		cancelled: Rc<RefCell<Vec<i32>>>,
	}

	impl FrameScheduler for ManualScheduler {
		fn request(&mut self) -> Option<i32> {
			self.requested.set(self.requested.get() + 1);
			let handle = self.next.get() + 1;
			self.next.set(handle);
			Some(handle)
		}

		fn cancel(&mut self, handle: i32) {
			self.cancelled.borrow_mut().push(handle);
		}
	}

	const HD: Viewport = Viewport {
		width: 1920.0,
		height: 1080.0,
	};

	fn renderer(
		interval_ms: f64,
	) -> (
		NodeGraphRenderer<RecordingSurface, ManualScheduler>,
		RecordingSurface,
		ManualScheduler,
	) {
		let graph = NodeGraph::from_nodes(
			(0..6)
				.map(|i| Node::new(200.0 + 50.0 * i as f64, 300.0, 1.0, 1.0))
				.collect(),
			HD,
		);
		let surface = RecordingSurface::default();
		let scheduler = ManualScheduler::default();
		let renderer = NodeGraphRenderer::new(
			graph,
			surface.clone(),
			scheduler.clone(),
			RendererSettings {
				style: NetworkStyle::default(),
				connection_distance: 100.0,
				frame_interval_ms: interval_ms,
			},
		);
		(renderer, surface, scheduler)
	}

	#[test]
	fn does_nothing_before_start() {
		let (mut r, surface, scheduler) = renderer(16.0);
		assert!(!r.on_frame(100.0));
		assert_eq!(scheduler.requested.get(), 0);
		assert!(surface.take().is_empty());
	}

	#[test]
	fn running_frame_clears_steps_and_draws() {
		let (mut r, surface, _) = renderer(16.0);
		r.start();
		assert_eq!(r.phase(), RendererPhase::Running);

		assert!(r.on_frame(100.0));
		let calls = surface.take();
		assert_eq!(calls[0], DrawCall::Clear);
		assert_eq!(
			calls.iter().filter(|c| matches!(c, DrawCall::Circle { .. })).count(),
			6
		);
		assert!(calls.iter().any(|c| matches!(c, DrawCall::Line(_))));
		assert_eq!(r.graph().nodes()[0], Node::new(201.0, 301.0, 1.0, 1.0));
		assert!(r.has_pending_frame());
	}

	#[test]
	fn frames_inside_interval_are_skipped() {
		let (mut r, _, scheduler) = renderer(16.0);
		r.start();
		assert!(r.on_frame(100.0));
		assert!(!r.on_frame(108.0));
		assert!(r.on_frame(116.0));
		assert_eq!(r.frames_drawn(), 2);
		// start + one per frame callback
		assert_eq!(scheduler.requested.get(), 4);
	}

	#[test]
	fn paused_keeps_scheduling_without_drawing() {
		let (mut r, surface, scheduler) = renderer(16.0);
		r.start();
		r.set_tab_visible(false);
		assert_eq!(r.phase(), RendererPhase::Paused);

		for t in 0..10 {
			assert!(!r.on_frame(100.0 + 20.0 * t as f64));
		}
		assert_eq!(surface.count(|c| *c == DrawCall::Clear), 0);
		assert!(surface.take().is_empty());
		assert_eq!(scheduler.requested.get(), 11);

		r.set_tab_visible(true);
		assert_eq!(r.phase(), RendererPhase::Running);
		assert!(r.on_frame(400.0));
	}

	#[test]
	fn leaving_viewport_pauses() {
		let (mut r, _, _) = renderer(16.0);
		r.start();
		r.set_in_viewport(false);
		assert_eq!(r.phase(), RendererPhase::Paused);
		r.set_in_viewport(true);
		assert_eq!(r.phase(), RendererPhase::Running);
	}

	#[test]
	fn starts_paused_when_hidden() {
		let (mut r, _, _) = renderer(16.0);
		r.set_tab_visible(false);
		assert_eq!(r.phase(), RendererPhase::NotStarted);
		r.start();
		assert_eq!(r.phase(), RendererPhase::Paused);
	}

	#[test]
	fn stop_cancels_pending_frame_once_and_silences_drawing() {
		let (mut r, surface, scheduler) = renderer(16.0);
		r.start();
		assert!(r.on_frame(100.0));
		surface.take();

		r.stop();
		r.stop();
		assert_eq!(*scheduler.cancelled.borrow(), vec![2]);
		assert_eq!(surface.take(), vec![DrawCall::Release]);

		let requested = scheduler.requested.get();
		assert!(!r.on_frame(200.0));
		r.set_tab_visible(true);
		assert!(surface.take().is_empty());
		assert_eq!(scheduler.requested.get(), requested);
		assert_eq!(r.phase(), RendererPhase::Stopped);
	}

	#[test]
	fn resize_updates_bounds_but_not_positions() {
		let (mut r, surface, _) = renderer(16.0);
		let size = SurfaceSize::new(Viewport::new(800.0, 600.0), 2.0, 2.0);
		r.resize(size);
		assert_eq!(r.graph().bounds(), Viewport::new(800.0, 600.0));
		assert_eq!(r.graph().nodes()[5].x, 450.0);
		assert_eq!(surface.take(), vec![DrawCall::Resize(size)]);

		r.stop();
		surface.take();
		r.resize(size);
		assert!(surface.take().is_empty());
	}
}
