//! Leptos component wrapping the animated background.
//!
//! The component renders a fixed, full-viewport layer. Until the client has
//! mounted and the gate has decided on [`RenderMode::Full`], only the static
//! gradient backdrop is shown. In full mode it adds the node network canvas,
//! the particle field, the pointer glow and the ambient layers.
//!
//! Every listener, timer and frame request is registered with a
//! [`CleanupRegistry`]: one for the mount, and one per animation session so a
//! live switch to reduced motion can tear the animation down on its own.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use leptos_meta::Style;
use log::{debug, info, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
	Element, HtmlCanvasElement, IntersectionObserver, IntersectionObserverEntry,
	IntersectionObserverInit, MouseEvent,
};

use super::cleanup::{CleanupRegistry, SessionSlot, TimerSlot};
use super::config::{BackgroundConfig, Tunables};
use super::engine::{FrameCallback, NodeGraphRenderer, RafScheduler, RendererSettings};
use super::gate::{DeviceProfile, REDUCED_MOTION_QUERY, RenderMode};
use super::network::{NodeGraph, Viewport};
use super::particles::{Particle, ParticleField};
use super::pointer::{PointerState, PointerTracker};
use super::render::{CanvasSurface, SurfaceSize};
use super::timing::{Pace, TrailingThrottle};

type CanvasRenderer = NodeGraphRenderer<CanvasSurface, RafScheduler>;

/// Share of the container that must be on screen to count as visible.
const INTERSECTION_THRESHOLD: f64 = 0.1;

const BACKGROUND_CSS: &str = r#"
.dyn-bg { position: fixed; inset: 0; z-index: -10; overflow: hidden; pointer-events: none; }
.dyn-bg__wash { position: absolute; inset: 0; }
.dyn-bg__wash--static { background: linear-gradient(135deg, #111827 0%, #1f2937 50%, #111827 100%); }
.dyn-bg__wash--dim { background: linear-gradient(135deg, rgba(17, 24, 39, 0.95) 0%, rgba(17, 24, 39, 0.8) 50%, rgba(17, 24, 39, 0.95) 100%); }
.dyn-bg__wash--tint { background: linear-gradient(45deg, rgba(49, 46, 129, 0.2) 0%, transparent 50%, rgba(22, 78, 99, 0.2) 100%); }
.dyn-bg__canvas { position: absolute; inset: 0; opacity: 0.3; mix-blend-mode: screen; }
.dyn-bg__particle { position: absolute; border-radius: 9999px; opacity: 0.2; filter: blur(4px); }
.dyn-bg__glow { position: absolute; width: 15rem; height: 15rem; border-radius: 9999px; opacity: 0.1; filter: blur(64px); transform: translate(-50%, -50%); }
.dyn-bg__glow--moving { animation: dyn-bg-pulse 2s ease-in-out infinite; }
.dyn-bg__orb { position: absolute; border-radius: 9999px; }
.dyn-bg__orb--static-a { top: 5rem; left: 5rem; width: 8rem; height: 8rem; background: rgba(99, 102, 241, 0.05); filter: blur(64px); }
.dyn-bg__orb--static-b { bottom: 5rem; right: 5rem; width: 10rem; height: 10rem; background: rgba(6, 182, 212, 0.05); filter: blur(64px); }
.dyn-bg__orb--primary { top: 25%; left: 25%; width: 6rem; height: 6rem; background: radial-gradient(circle, rgba(99, 102, 241, 0.35) 0%, rgba(6, 182, 212, 0.15) 70%, transparent 100%); filter: blur(24px); animation: dyn-bg-breathe 10s ease-in-out infinite; }
.dyn-bg__orb--secondary { top: 75%; right: 25%; width: 4rem; height: 4rem; background: linear-gradient(135deg, rgba(6, 182, 212, 0.1), rgba(245, 158, 11, 0.1)); filter: blur(64px); animation: dyn-bg-swell 8s ease-in-out 3s infinite; }
.dyn-bg__ambient { position: absolute; inset: 0; opacity: 0.05; background: radial-gradient(circle, rgba(99, 102, 241, 0.05) 0%, rgba(6, 182, 212, 0.05) 25%, transparent 50%); background-size: 200% 200%; animation: dyn-bg-sweep 15s ease-in-out infinite; }
@keyframes dyn-bg-drift {
	0%, 100% { transform: translate(-15px, -20px) scale(0.8); opacity: 0.1; }
	50% { transform: translate(15px, 20px) scale(1.1); opacity: 0.3; }
}
@keyframes dyn-bg-pulse {
	0%, 100% { transform: translate(-50%, -50%) scale(1); }
	50% { transform: translate(-50%, -50%) scale(1.05); }
}
@keyframes dyn-bg-breathe {
	0%, 100% { transform: scale(1) rotate(0deg); opacity: 0.2; }
	33% { transform: scale(1.03) rotate(2deg); opacity: 0.33; }
	50% { transform: scale(1.05) rotate(0deg); opacity: 0.4; }
	66% { transform: scale(1.03) rotate(-2deg); opacity: 0.33; }
}
@keyframes dyn-bg-swell {
	0%, 100% { transform: scale(1); opacity: 0.05; }
	50% { transform: scale(1.2); opacity: 0.15; }
}
@keyframes dyn-bg-sweep {
	0%, 100% { background-position: 0% 0%; }
	50% { background-position: 100% 100%; }
}
"#;

fn now() -> f64 {
	web_sys::window()
		.and_then(|w| w.performance())
		.map(|p| p.now())
		.unwrap_or(0.0)
}

fn glow_class(is_moving: bool) -> &'static str {
	if is_moving {
		"dyn-bg__glow dyn-bg__glow--moving"
	} else {
		"dyn-bg__glow"
	}
}

/// State that exists only while the mode is `Full`. Its listeners and
/// timers live on the owning [`SessionSlot`]'s registry.
struct AnimationSession {
	tracker: Rc<RefCell<PointerTracker>>,
	renderer: Option<Rc<RefCell<CanvasRenderer>>>,
	/// The canvas is set up at most once per session, even if it failed.
	canvas_attempted: bool,
}

impl AnimationSession {
	fn new(tracker: Rc<RefCell<PointerTracker>>) -> Self {
		Self {
			tracker,
			renderer: None,
			canvas_attempted: false,
		}
	}
}

/// Tears down the active session, if any, and returns the pointer state to
/// publish afterwards.
fn end_session(slot: &mut SessionSlot<AnimationSession>) -> Option<PointerState> {
	let ended = slot.end()?;
	info!("dyn-backdrop: animation disabled");
	let centered = ended.tracker.borrow_mut().reset();
	Some(centered)
}

/// Renders the page background as a fixed layer behind all content.
///
/// Mount it once near the root; remounting regenerates particles and nodes.
/// Pass `config` to override the defaults.
#[component]
pub fn DynamicBackground(#[prop(optional)] config: Option<BackgroundConfig>) -> impl IntoView {
	let config = Arc::new(config.unwrap_or_default().sanitized());
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

	let mounted = RwSignal::new(false);
	let profile = RwSignal::new(DeviceProfile::default());
	let reduced_motion = RwSignal::new(false);
	let in_viewport = RwSignal::new(false);
	let tab_visible = RwSignal::new(true);
	let pointer = RwSignal::new(PointerState::CENTERED);

	let cfg = config.clone();
	let mode = Memo::new(move |_| {
		if !mounted.get() {
			return RenderMode::Disabled;
		}
		let mut snapshot = profile.get();
		snapshot.reduced_motion = reduced_motion.get();
		RenderMode::evaluate(&snapshot, &cfg)
	});

	let cfg = config.clone();
	let device_class = Memo::new(move |_| profile.with(|p| p.device_class(&cfg)));

	let cfg = config.clone();
	let particles = Memo::new(move |_| match mode.get() {
		RenderMode::Full => {
			let tier = cfg.tunables(device_class.get());
			let field =
				ParticleField::generate(tier.particle_count, &cfg.theme.palette, &mut cfg.rng());
			debug!("dyn-backdrop: generated {} particles", field.len());
			field
		}
		RenderMode::Disabled => ParticleField::empty(),
	});

	let mount_cleanup = CleanupRegistry::new();
	let session: Rc<RefCell<SessionSlot<AnimationSession>>> = Rc::default();

	{
		let session = session.clone();
		mount_cleanup.add(move || {
			session.borrow_mut().end();
		});
	}

	// Client-side mount: detect the device and start watching the browser.
	let cleanup_init = mount_cleanup.clone();
	Effect::new(move |_| {
		let Some(container) = container_ref.get() else {
			return;
		};
		if mounted.get_untracked() {
			return;
		}
		let detected = DeviceProfile::detect();
		debug!("dyn-backdrop: detected {:?}", detected);
		reduced_motion.set(detected.reduced_motion);
		profile.set(detected);

		watch_reduced_motion(&cleanup_init, reduced_motion);
		watch_tab_visibility(&cleanup_init, tab_visible);
		observe_intersection(&cleanup_init, &container, in_viewport);
		mounted.set(true);
	});

	// Start or tear down the animation session as the mode changes.
	let session_fx = session.clone();
	let cfg = config.clone();
	Effect::new(move |_| {
		let full = mode.get().is_full();
		let visible = in_viewport.get();
		let canvas = canvas_ref.get();
		let class = device_class.get();

		let mut slot = session_fx.borrow_mut();
		if !full {
			let centered = end_session(&mut slot);
			drop(slot);
			if let Some(centered) = centered {
				pointer.set(centered);
			}
			return;
		}

		let (cleanup, active) = slot.begin_with(|cleanup| {
			info!("dyn-backdrop: animation enabled ({:?})", class);
			let tier = cfg.tunables(class);
			let tracker = Rc::new(RefCell::new(PointerTracker::new(
				tier.pointer_throttle_ms,
				cfg.idle_timeout_ms,
			)));
			track_pointer(cleanup, &tracker, pointer, in_viewport);
			AnimationSession::new(tracker)
		});

		if active.canvas_attempted || !visible {
			return;
		}
		let Some(canvas) = canvas else {
			return;
		};
		active.canvas_attempted = true;
		active.renderer = start_renderer(
			canvas,
			&cfg,
			cfg.tunables(class),
			tab_visible.get_untracked(),
			cleanup,
		);
	});

	// Pause and resume the frame loop.
	let session_vis = session.clone();
	Effect::new(move |_| {
		let tab = tab_visible.get();
		let visible = in_viewport.get();
		let renderer = session_vis
			.borrow()
			.state()
			.and_then(|s| s.renderer.clone());
		if let Some(renderer) = renderer {
			let mut renderer = renderer.borrow_mut();
			renderer.set_tab_visible(tab);
			renderer.set_in_viewport(visible);
		}
	});

	on_cleanup({
		let cleanup = SendWrapper::new(mount_cleanup);
		move || {
			let released = cleanup.run();
			debug!("dyn-backdrop: released {} resources", released);
		}
	});

	view! {
		<Style>{BACKGROUND_CSS}</Style>
		<div node_ref=container_ref class="dyn-bg" aria-hidden="true">
			<Show when=move || mode.get().is_full() fallback=|| view! { <StaticBackdrop /> }>
				<div class="dyn-bg__wash dyn-bg__wash--dim" />
				<div class="dyn-bg__wash dyn-bg__wash--tint" />
				<canvas node_ref=canvas_ref class="dyn-bg__canvas" />
				<Show when=move || in_viewport.get()>
					<For
						each=move || particles.get().particles
						key=|particle| particle.id
						children=|particle: Particle| {
							view! { <div class="dyn-bg__particle" style=particle.style() /> }
						}
					/>
					<div
						class=move || glow_class(pointer.get().is_moving)
						style=move || pointer.get().glow_style()
					/>
					<AmbientLayers />
				</Show>
			</Show>
		</div>
	}
}

/// Gradient-only background for reduced motion, small screens and the
/// pre-mount render.
#[component]
fn StaticBackdrop() -> impl IntoView {
	view! {
		<div class="dyn-bg__wash dyn-bg__wash--static" />
		<div class="dyn-bg__wash dyn-bg__wash--tint" />
		<div class="dyn-bg__orb dyn-bg__orb--static-a" />
		<div class="dyn-bg__orb dyn-bg__orb--static-b" />
	}
}

/// Slow ambient light sweep and two breathing accent orbs.
#[component]
fn AmbientLayers() -> impl IntoView {
	view! {
		<div class="dyn-bg__orb dyn-bg__orb--primary" />
		<div class="dyn-bg__orb dyn-bg__orb--secondary" />
		<div class="dyn-bg__ambient" />
	}
}

fn watch_reduced_motion(cleanup: &CleanupRegistry, reduced_motion: RwSignal<bool>) {
	let Some(query) = web_sys::window().and_then(|w| w.match_media(REDUCED_MOTION_QUERY).ok().flatten())
	else {
		return;
	};
	let list = query.clone();
	cleanup.listen(&query, "change", move |_| {
		let reduce = list.matches();
		debug!("dyn-backdrop: reduced motion -> {}", reduce);
		reduced_motion.set(reduce);
	});
}

fn watch_tab_visibility(cleanup: &CleanupRegistry, tab_visible: RwSignal<bool>) {
	let Some(document) = web_sys::window().and_then(|w| w.document()) else {
		return;
	};
	tab_visible.set(!document.hidden());
	let doc = document.clone();
	cleanup.listen(&document, "visibilitychange", move |_| {
		tab_visible.set(!doc.hidden());
	});
}

fn observe_intersection(cleanup: &CleanupRegistry, element: &Element, in_viewport: RwSignal<bool>) {
	let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
		move |entries: js_sys::Array, _: IntersectionObserver| {
			let latest = entries
				.iter()
				.last()
				.and_then(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok());
			if let Some(entry) = latest {
				in_viewport.set(entry.is_intersecting());
			}
		},
	);
	let options = IntersectionObserverInit::new();
	options.set_threshold(&JsValue::from_f64(INTERSECTION_THRESHOLD));

	match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options) {
		Ok(observer) => {
			observer.observe(element);
			cleanup.add(move || {
				observer.disconnect();
				drop(callback);
			});
		}
		Err(e) => {
			warn!("dyn-backdrop: no IntersectionObserver ({e:?}), assuming visible");
			in_viewport.set(true);
		}
	}
}

fn track_pointer(
	cleanup: &CleanupRegistry,
	tracker: &Rc<RefCell<PointerTracker>>,
	pointer: RwSignal<PointerState>,
	in_viewport: RwSignal<bool>,
) {
	let Some(window) = web_sys::window() else {
		return;
	};
	let idle_timer = TimerSlot::default();

	{
		let tracker = tracker.clone();
		let idle_timer = idle_timer.clone();
		cleanup.listen_passive(&window, "mousemove", move |event| {
			if !in_viewport.get_untracked() {
				return;
			}
			let Ok(event) = event.dyn_into::<MouseEvent>() else {
				return;
			};
			let Some(viewport) = Viewport::of_window() else {
				return;
			};
			let (sample, deadline, idle_ms) = {
				let mut tracker = tracker.borrow_mut();
				let sample = tracker.on_move(
					event.client_x() as f64,
					event.client_y() as f64,
					viewport,
					now(),
				);
				(sample, tracker.idle_deadline(), tracker.idle_timeout_ms())
			};
			let (Some(sample), Some(deadline)) = (sample, deadline) else {
				return;
			};
			pointer.set(sample);

			let tracker = tracker.clone();
			idle_timer.arm(idle_ms, move || {
				let idle = tracker.borrow_mut().on_idle(deadline);
				if let Some(idle) = idle {
					pointer.set(idle);
				}
			});
		});
	}

	cleanup.add(move || idle_timer.clear());
}

fn start_renderer(
	canvas: HtmlCanvasElement,
	config: &BackgroundConfig,
	tier: &Tunables,
	tab_visible: bool,
	cleanup: &CleanupRegistry,
) -> Option<Rc<RefCell<CanvasRenderer>>> {
	let Some(surface) = CanvasSurface::acquire(canvas) else {
		warn!("dyn-backdrop: 2D context unavailable, skipping node network");
		return None;
	};
	let size = SurfaceSize::of_window(config.max_pixel_ratio)?;
	let graph = NodeGraph::scatter(
		tier.node_count,
		size.css,
		config.node_max_speed,
		&mut config.rng(),
	);

	let frame_callback: FrameCallback = Rc::default();
	let renderer = Rc::new(RefCell::new(NodeGraphRenderer::new(
		graph,
		surface,
		RafScheduler::new(frame_callback.clone()),
		RendererSettings {
			style: config.theme.network.clone(),
			connection_distance: tier.connection_distance,
			frame_interval_ms: tier.frame_interval_ms,
		},
	)));

	{
		let renderer = renderer.clone();
		*frame_callback.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			renderer.borrow_mut().on_frame(timestamp);
		}));
	}

	{
		let mut r = renderer.borrow_mut();
		r.resize(size);
		r.set_tab_visible(tab_visible);
		r.start();
	}

	watch_resize(cleanup, &renderer, config);

	{
		let renderer = renderer.clone();
		cleanup.add(move || {
			renderer.borrow_mut().stop();
			// Dropping the closure breaks the renderer <-> callback cycle.
			frame_callback.borrow_mut().take();
		});
	}

	Some(renderer)
}

fn apply_window_size(renderer: &RefCell<CanvasRenderer>, max_pixel_ratio: f64) {
	if let Some(size) = SurfaceSize::of_window(max_pixel_ratio) {
		renderer.borrow_mut().resize(size);
	}
}

/// Throttled resize with a trailing update, so the last size always lands.
fn watch_resize(
	cleanup: &CleanupRegistry,
	renderer: &Rc<RefCell<CanvasRenderer>>,
	config: &BackgroundConfig,
) {
	let Some(window) = web_sys::window() else {
		return;
	};
	let max_ratio = config.max_pixel_ratio;
	let pacer = Rc::new(RefCell::new(TrailingThrottle::new(config.resize_throttle_ms)));
	let trailing = TimerSlot::default();

	{
		let renderer = renderer.clone();
		let trailing = trailing.clone();
		cleanup.listen(&window, "resize", move |_| {
			let pace = pacer.borrow_mut().on_event(now());
			match pace {
				Pace::Apply => {
					trailing.clear();
					apply_window_size(&renderer, max_ratio);
				}
				Pace::Defer(wait) => {
					let pacer = pacer.clone();
					let renderer = renderer.clone();
					trailing.arm(wait, move || {
						pacer.borrow_mut().fire_trailing(now());
						apply_window_size(&renderer, max_ratio);
					});
				}
				Pace::Drop => {}
			}
		});
	}

	cleanup.add(move || trailing.clear());
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::dynamic_background::particles::DRIFT_KEYFRAMES;

	#[test]
	fn stylesheet_defines_particle_keyframes() {
		assert!(BACKGROUND_CSS.contains(&format!("@keyframes {DRIFT_KEYFRAMES} ")));
	}

	#[test]
	fn glow_pulses_only_while_moving() {
		assert_eq!(glow_class(false), "dyn-bg__glow");
		assert!(glow_class(true).contains("dyn-bg__glow--moving"));
		assert!(BACKGROUND_CSS.contains(".dyn-bg__glow--moving"));
	}

	fn moved_tracker() -> Rc<RefCell<PointerTracker>> {
		let mut tracker = PointerTracker::new(16.0, 500.0);
		tracker.on_move(100.0, 100.0, Viewport::new(1000.0, 1000.0), 0.0);
		Rc::new(RefCell::new(tracker))
	}

	#[test]
	fn leaving_full_mode_releases_session_once_and_recenters() {
		let mut slot = SessionSlot::default();
		let released = Rc::new(std::cell::Cell::new(0));
		for _ in 0..2 {
			slot.begin_with(|cleanup| {
				for _ in 0..3 {
					let released = released.clone();
					cleanup.add(move || released.set(released.get() + 1));
				}
				AnimationSession::new(moved_tracker())
			});
		}

		assert_eq!(end_session(&mut slot), Some(PointerState::CENTERED));
		assert_eq!(released.get(), 3);
		assert_eq!(end_session(&mut slot), None);
		assert_eq!(released.get(), 3);
	}

	#[test]
	fn recentred_tracker_has_no_idle_pending() {
		let mut slot = SessionSlot::default();
		let tracker = moved_tracker();
		slot.begin_with(|_| AnimationSession::new(tracker.clone()));
		end_session(&mut slot);
		assert_eq!(tracker.borrow().idle_deadline(), None);
	}
}
