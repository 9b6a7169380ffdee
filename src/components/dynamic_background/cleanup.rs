//! Teardown bookkeeping for everything a mount acquires.
//!
//! Listeners, timers and frame requests register an undo action with a
//! [`CleanupRegistry`]. Running the registry performs every action once, in
//! reverse registration order; running it again does nothing.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::{TimeoutHandle, set_timeout_with_handle};
use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Event, EventTarget};

type Task = Box<dyn FnOnce()>;

#[derive(Default)]
struct Tasks {
	pending: Vec<Task>,
	closed: bool,
}

/// Shared list of undo actions. Clones refer to the same list.
#[derive(Clone, Default)]
pub struct CleanupRegistry {
	tasks: Rc<RefCell<Tasks>>,
}

impl CleanupRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `task`. After [`run`](Self::run) the owner is gone, so a late
	/// task is executed immediately instead of being kept.
	pub fn add(&self, task: impl FnOnce() + 'static) {
		let mut tasks = self.tasks.borrow_mut();
		if tasks.closed {
			drop(tasks);
			task();
			return;
		}
		tasks.pending.push(Box::new(task));
	}

	/// Runs all pending tasks and closes the registry. Returns how many ran.
	pub fn run(&self) -> usize {
		let pending = {
			let mut tasks = self.tasks.borrow_mut();
			tasks.closed = true;
			std::mem::take(&mut tasks.pending)
		};
		let count = pending.len();
		for task in pending.into_iter().rev() {
			task();
		}
		count
	}

	/// Number of tasks still pending.
	pub fn len(&self) -> usize {
		self.tasks.borrow().pending.len()
	}

	/// Attaches an event listener and registers its removal.
	/// Returns `false` if the browser refused the listener.
	pub fn listen(
		&self,
		target: &EventTarget,
		event: &'static str,
		callback: impl FnMut(Event) + 'static,
	) -> bool {
		self.register(Listener::attach(target, event, false, callback))
	}

	/// Like [`listen`](Self::listen) with `{ passive: true }`.
	pub fn listen_passive(
		&self,
		target: &EventTarget,
		event: &'static str,
		callback: impl FnMut(Event) + 'static,
	) -> bool {
		self.register(Listener::attach(target, event, true, callback))
	}

	fn register(&self, listener: Option<Listener>) -> bool {
		match listener {
			Some(listener) => {
				self.add(move || listener.detach());
				true
			}
			None => false,
		}
	}
}

/// An attached DOM listener; keeps its closure alive until detached.
struct Listener {
	target: EventTarget,
	event: &'static str,
	callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
	fn attach(
		target: &EventTarget,
		event: &'static str,
		passive: bool,
		callback: impl FnMut(Event) + 'static,
	) -> Option<Self> {
		let callback = Closure::<dyn FnMut(Event)>::new(callback);
		let options = AddEventListenerOptions::new();
		options.set_passive(passive);
		if let Err(e) = target.add_event_listener_with_callback_and_add_event_listener_options(
			event,
			callback.as_ref().unchecked_ref(),
			&options,
		) {
			warn!("dyn-backdrop: could not listen for {event}: {e:?}");
			return None;
		}
		Some(Self {
			target: target.clone(),
			event,
			callback,
		})
	}

	fn detach(self) {
		let _ = self
			.target
			.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
	}
}

/// Holds at most one session: state plus the registry that undoes it.
///
/// Beginning is idempotent while a session is active; ending runs the
/// registry exactly once and hands the state back.
pub struct SessionSlot<T> {
	current: Option<(CleanupRegistry, T)>,
}

impl<T> Default for SessionSlot<T> {
	fn default() -> Self {
		Self { current: None }
	}
}

impl<T> SessionSlot<T> {
	/// Returns the active session, starting one with `start` if none is
	/// active. `start` registers its teardown on the registry it is given.
	pub fn begin_with(
		&mut self,
		start: impl FnOnce(&CleanupRegistry) -> T,
	) -> (&CleanupRegistry, &mut T) {
		let (cleanup, state) = self.current.get_or_insert_with(|| {
			let cleanup = CleanupRegistry::new();
			let state = start(&cleanup);
			debug!("dyn-backdrop: session started with {} cleanup tasks", cleanup.len());
			(cleanup, state)
		});
		(&*cleanup, state)
	}

	pub fn state(&self) -> Option<&T> {
		self.current.as_ref().map(|(_, state)| state)
	}

	/// Tears the active session down. `None` if there was none.
	pub fn end(&mut self) -> Option<T> {
		let (cleanup, state) = self.current.take()?;
		let released = cleanup.run();
		debug!("dyn-backdrop: session ended, released {} resources", released);
		Some(state)
	}
}

/// One re-armable timeout. Arming replaces the previous timeout.
#[derive(Clone, Default)]
pub struct TimerSlot {
	handle: Rc<Cell<Option<TimeoutHandle>>>,
}

impl TimerSlot {
	pub fn arm(&self, delay_ms: f64, callback: impl FnOnce() + 'static) {
		self.clear();
		let slot = self.handle.clone();
		let delay = Duration::from_secs_f64(delay_ms.max(0.0) / 1000.0);
		match set_timeout_with_handle(
			move || {
				slot.set(None);
				callback();
			},
			delay,
		) {
			Ok(handle) => self.handle.set(Some(handle)),
			Err(e) => warn!("dyn-backdrop: could not arm timer: {e:?}"),
		}
	}

	pub fn is_armed(&self) -> bool {
		self.handle.get().is_some()
	}

	pub fn clear(&self) {
		if let Some(handle) = self.handle.take() {
			handle.clear();
		}
	}
}
