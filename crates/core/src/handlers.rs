//! Generic listener infrastructure.
//!
//! Unified types for input listeners using [`ListenerEntry<E>`] with
//! [`IndexMap`] storage for O(1) removal and stable insertion order.
//! Dispatch is synchronous: listeners run on the emitting call stack, which
//! keeps session mutation on a single logical thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

/// Unique identifier for registered listeners.
pub type ListenerId = u64;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique listener ID.
pub fn next_listener_id() -> ListenerId {
	NEXT_LISTENER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Listener function over events of type `E`.
pub type ListenerFn<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Registered listener entry.
pub struct ListenerEntry<E> {
	pub id: ListenerId,
	pub listener: ListenerFn<E>,
}

impl<E> Clone for ListenerEntry<E> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			listener: Arc::clone(&self.listener),
		}
	}
}

/// Listener storage: [`IndexMap`] for O(1) removal with stable insertion order.
pub type ListenerMap<E> = Arc<Mutex<IndexMap<ListenerId, ListenerEntry<E>>>>;

/// RAII handle that unregisters a listener on drop.
///
/// Holds a weak reference to the listener map, so dropping after the owning
/// event source is gone is safe (becomes a no-op). Capability deactivation
/// releases listeners by dropping these guards, which guarantees a released
/// listener can never fire again.
pub struct ListenerGuard {
	id: ListenerId,
	dropper: Option<Arc<dyn Fn(ListenerId) + Send + Sync>>,
}

impl ListenerGuard {
	/// Creates a guard with a custom dropper function.
	pub fn new(id: ListenerId, dropper: Arc<dyn Fn(ListenerId) + Send + Sync>) -> Self {
		Self {
			id,
			dropper: Some(dropper),
		}
	}

	/// Creates a guard from a listener map using a weak reference.
	pub fn from_listener_map<E>(id: ListenerId, listeners: &ListenerMap<E>) -> Self
	where
		E: Send + Sync + 'static,
	{
		let weak: Weak<Mutex<IndexMap<ListenerId, ListenerEntry<E>>>> = Arc::downgrade(listeners);
		let dropper = Arc::new(move |id: ListenerId| {
			if let Some(map) = weak.upgrade() {
				map.lock().shift_remove(&id);
			}
		});
		Self::new(id, dropper)
	}

	/// Returns this guard's listener ID.
	pub fn id(&self) -> ListenerId {
		self.id
	}

	/// Explicitly releases the listener. Equivalent to dropping.
	pub fn release(mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl Drop for ListenerGuard {
	fn drop(&mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl std::fmt::Debug for ListenerGuard {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ListenerGuard")
			.field("id", &self.id)
			.field("active", &self.dropper.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_listener_id_increments() {
		let id1 = next_listener_id();
		let id2 = next_listener_id();
		let id3 = next_listener_id();
		assert!(id2 > id1);
		assert!(id3 > id2);
	}

	#[test]
	fn test_guard_release() {
		use std::sync::atomic::{AtomicBool, Ordering};

		let called = Arc::new(AtomicBool::new(false));
		let called_clone = Arc::clone(&called);

		let dropper = Arc::new(move |_id: ListenerId| {
			called_clone.store(true, Ordering::SeqCst);
		});

		let guard = ListenerGuard::new(1, dropper);
		assert!(!called.load(Ordering::SeqCst));

		guard.release();
		assert!(called.load(Ordering::SeqCst));
	}

	#[test]
	fn test_guard_drop() {
		use std::sync::atomic::{AtomicBool, Ordering};

		let called = Arc::new(AtomicBool::new(false));
		let called_clone = Arc::clone(&called);

		let dropper = Arc::new(move |_id: ListenerId| {
			called_clone.store(true, Ordering::SeqCst);
		});

		{
			let _guard = ListenerGuard::new(1, dropper);
			assert!(!called.load(Ordering::SeqCst));
		}
		// Guard dropped here
		assert!(called.load(Ordering::SeqCst));
	}

	#[test]
	fn test_guard_from_listener_map() {
		let map: ListenerMap<String> = Arc::new(Mutex::new(IndexMap::new()));

		let id = next_listener_id();
		map.lock().insert(
			id,
			ListenerEntry {
				id,
				listener: Arc::new(|_: &String| {}),
			},
		);
		assert_eq!(map.lock().len(), 1);

		{
			let _guard = ListenerGuard::from_listener_map(id, &map);
		}

		// Listener should be removed
		assert_eq!(map.lock().len(), 0);
	}

	#[test]
	fn test_guard_weak_reference() {
		let map: ListenerMap<String> = Arc::new(Mutex::new(IndexMap::new()));

		let id = next_listener_id();
		map.lock().insert(
			id,
			ListenerEntry {
				id,
				listener: Arc::new(|_: &String| {}),
			},
		);

		let guard = ListenerGuard::from_listener_map(id, &map);

		// Drop the map before the guard
		drop(map);

		// Dropping the guard should not panic (weak ref is dead)
		drop(guard);
	}
}
