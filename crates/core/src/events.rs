//! Local input events and the injected event source.
//!
//! Sessions never register against process-global state (the classic leaked
//! `window` blur handler). Instead every [`DisplaySurface`] carries its own
//! [`InputEventHub`], and the embedding layer feeds local UI events into it.
//! This keeps concurrent sessions fully independent and makes listener
//! lifecycles testable without a real windowing system.
//!
//! [`DisplaySurface`]: crate::surface::DisplaySurface

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use rdc_protocol::{MouseButton, Viewport};

use crate::handlers::{ListenerEntry, ListenerFn, ListenerGuard, ListenerMap, next_listener_id};

/// A local input event delivered to a console session.
///
/// Pointer coordinates are logical (CSS) pixels relative to the display
/// surface; capabilities perform physical scaling before anything goes on
/// the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
	/// Key pressed, X11 keysym encoded.
	KeyDown { keysym: u32 },
	/// Key released.
	KeyUp { keysym: u32 },
	/// Pointer moved to a logical position.
	PointerMove { x: f64, y: f64 },
	/// Pointer button pressed.
	PointerDown { button: MouseButton },
	/// Pointer button released.
	PointerUp { button: MouseButton },
	/// Vertical scroll; negative is away from the user.
	Wheel { delta_y: f64 },
	/// The surface lost input focus (window blur, tab switch).
	FocusLost,
	/// The surface was resized to a new logical viewport.
	Resized { viewport: Viewport },
	/// The local clipboard changed while the surface was focused.
	ClipboardChanged { data: String },
}

/// Source of local input events for one session.
///
/// Implemented by [`InputEventHub`]; capabilities depend only on the trait
/// so tests can observe registration counts directly.
pub trait EventSource: Send + Sync {
	/// Registers a listener; it stays attached until the guard drops.
	fn add_listener(&self, listener: ListenerFn<InputEvent>) -> ListenerGuard;

	/// Returns the number of currently attached listeners.
	fn listener_count(&self) -> usize;
}

/// Default [`EventSource`]: a per-surface fan-out of input events.
///
/// Dispatch is synchronous and snapshot-based: the listener set is copied
/// out before invocation, so a listener may release itself (or register
/// others) without deadlocking.
pub struct InputEventHub {
	listeners: ListenerMap<InputEvent>,
}

impl InputEventHub {
	/// Creates an empty hub.
	pub fn new() -> Self {
		Self {
			listeners: Arc::new(Mutex::new(IndexMap::new())),
		}
	}

	/// Delivers an event to every attached listener, in registration order.
	pub fn emit(&self, event: InputEvent) {
		let listeners: Vec<_> = self.listeners.lock().values().cloned().collect();
		for entry in listeners {
			(entry.listener)(&event);
		}
	}

	/// Returns the number of currently attached listeners.
	pub fn listener_count(&self) -> usize {
		self.listeners.lock().len()
	}
}

impl Default for InputEventHub {
	fn default() -> Self {
		Self::new()
	}
}

impl EventSource for InputEventHub {
	fn add_listener(&self, listener: ListenerFn<InputEvent>) -> ListenerGuard {
		let id = next_listener_id();
		self.listeners.lock().insert(id, ListenerEntry { id, listener });
		ListenerGuard::from_listener_map(id, &self.listeners)
	}

	fn listener_count(&self) -> usize {
		InputEventHub::listener_count(self)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	#[test]
	fn emit_reaches_all_listeners() {
		let hub = InputEventHub::new();
		let hits = Arc::new(AtomicUsize::new(0));

		let hits_a = Arc::clone(&hits);
		let _guard_a = hub.add_listener(Arc::new(move |_: &InputEvent| {
			hits_a.fetch_add(1, Ordering::SeqCst);
		}));
		let hits_b = Arc::clone(&hits);
		let _guard_b = hub.add_listener(Arc::new(move |_: &InputEvent| {
			hits_b.fetch_add(1, Ordering::SeqCst);
		}));

		hub.emit(InputEvent::FocusLost);
		assert_eq!(hits.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn dropped_guard_detaches_listener() {
		let hub = InputEventHub::new();
		let hits = Arc::new(AtomicUsize::new(0));

		let hits_clone = Arc::clone(&hits);
		let guard = hub.add_listener(Arc::new(move |_: &InputEvent| {
			hits_clone.fetch_add(1, Ordering::SeqCst);
		}));
		assert_eq!(hub.listener_count(), 1);

		drop(guard);
		assert_eq!(hub.listener_count(), 0);

		hub.emit(InputEvent::FocusLost);
		assert_eq!(hits.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn listener_may_release_itself_during_dispatch() {
		let hub = Arc::new(InputEventHub::new());
		let slot: Arc<Mutex<Option<ListenerGuard>>> = Arc::new(Mutex::new(None));

		let slot_clone = Arc::clone(&slot);
		let guard = hub.add_listener(Arc::new(move |_: &InputEvent| {
			// Self-release mid-dispatch must not deadlock.
			slot_clone.lock().take();
		}));
		*slot.lock() = Some(guard);

		hub.emit(InputEvent::FocusLost);
		assert_eq!(hub.listener_count(), 0);
	}
}
