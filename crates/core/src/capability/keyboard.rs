//! Keyboard capability: keysym forwarding and pressed-key tracking.

use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::Mutex;

use rdc_runtime::{Error, Result};

use super::{Capability, CapabilityFragment, CapabilityPlugin, Capabilities, SessionContext};
use crate::events::{EventSource, InputEvent};
use crate::handlers::ListenerGuard;
use crate::surface::DisplaySurface;

pub(crate) const NAME: &str = "keyboard";

/// Installs the [`KeyboardCapability`].
///
/// Requires the display capability: the keyboard listener binds to the
/// display surface's event hub.
#[derive(Default)]
pub struct KeyboardPlugin;

impl KeyboardPlugin {
	pub fn new() -> Self {
		Self
	}
}

impl CapabilityPlugin for KeyboardPlugin {
	fn name(&self) -> &'static str {
		NAME
	}

	fn install(
		&self,
		_ctx: &Arc<SessionContext>,
		current: &Capabilities,
	) -> Result<CapabilityFragment> {
		let display = current.display().ok_or(Error::MissingCapability {
			plugin: NAME,
			requires: super::display::NAME,
		})?;
		Ok(CapabilityFragment::keyboard(Arc::new(
			KeyboardCapability::new(Arc::clone(display.surface())),
		)))
	}
}

/// Forwards key events to the remote side and tracks which keysyms are
/// held, so focus loss can release them.
///
/// Without the focus-loss release, a key held across a window blur (the
/// classic Alt of Alt-Tab) stays pressed on the remote machine forever.
pub struct KeyboardCapability {
	surface: Arc<DisplaySurface>,
	pressed: Arc<Mutex<IndexSet<u32>>>,
	client: Mutex<Option<Arc<dyn rdc_runtime::ConsoleClient>>>,
	guard: Mutex<Option<ListenerGuard>>,
}

impl KeyboardCapability {
	fn new(surface: Arc<DisplaySurface>) -> Self {
		Self {
			surface,
			pressed: Arc::new(Mutex::new(IndexSet::new())),
			client: Mutex::new(None),
			guard: Mutex::new(None),
		}
	}

	/// Injects a synthetic key event (e.g. Ctrl-Alt-Del from a menu).
	///
	/// # Errors
	///
	/// Returns [`Error::SessionClosed`] while the capability is inactive.
	pub fn send_key(&self, pressed: bool, keysym: u32) -> Result<()> {
		let client = self.client.lock().clone().ok_or(Error::SessionClosed {
			context: "keyboard capability is not active".to_string(),
		})?;
		client.send_key_event(pressed, keysym)
	}

	/// Returns the currently held keysyms, in press order.
	pub fn pressed_keys(&self) -> Vec<u32> {
		self.pressed.lock().iter().copied().collect()
	}
}

impl Capability for KeyboardCapability {
	fn name(&self) -> &'static str {
		NAME
	}

	fn activate(&self, ctx: &SessionContext) -> Result<()> {
		let mut guard = self.guard.lock();
		if guard.is_some() {
			return Ok(());
		}
		let Some(client) = ctx.client() else {
			tracing::debug!(session = %ctx.id(), capability = NAME, "Client not ready, deferring");
			return Ok(());
		};

		*self.client.lock() = Some(Arc::clone(&client));
		let pressed = Arc::clone(&self.pressed);
		*guard = Some(self.surface.events().add_listener(Arc::new(move |event: &InputEvent| {
			match event {
				InputEvent::KeyDown { keysym } => {
					pressed.lock().insert(*keysym);
					if let Err(e) = client.send_key_event(true, *keysym) {
						tracing::debug!(error = %e, "Key press dropped, session closing");
					}
				}
				InputEvent::KeyUp { keysym } => {
					pressed.lock().shift_remove(keysym);
					if let Err(e) = client.send_key_event(false, *keysym) {
						tracing::debug!(error = %e, "Key release dropped, session closing");
					}
				}
				InputEvent::FocusLost => {
					// Drain, don't iterate: a second focus loss must find an
					// empty set and release nothing.
					let held: Vec<u32> = pressed.lock().drain(..).collect();
					for keysym in held {
						if let Err(e) = client.send_key_event(false, keysym) {
							tracing::debug!(error = %e, "Blur release dropped, session closing");
						}
					}
				}
				_ => {}
			}
		})));
		Ok(())
	}

	fn deactivate(&self) -> Result<()> {
		self.guard.lock().take();
		self.client.lock().take();
		self.pressed.lock().clear();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use rdc_protocol::Viewport;

	use super::super::testing::recording_context;
	use super::*;

	const XK_A: u32 = 0x61;
	const XK_SHIFT_L: u32 = 0xffe1;

	fn keyboard() -> (Arc<DisplaySurface>, KeyboardCapability) {
		let surface = Arc::new(DisplaySurface::new(Viewport::new(800.0, 600.0), 1.0));
		let capability = KeyboardCapability::new(Arc::clone(&surface));
		(surface, capability)
	}

	#[test]
	fn forwards_key_events_and_tracks_pressed() {
		let (ctx, client) = recording_context();
		let (surface, capability) = keyboard();
		capability.activate(&ctx).unwrap();

		surface.events().emit(InputEvent::KeyDown { keysym: XK_SHIFT_L });
		surface.events().emit(InputEvent::KeyDown { keysym: XK_A });
		assert_eq!(capability.pressed_keys(), vec![XK_SHIFT_L, XK_A]);

		surface.events().emit(InputEvent::KeyUp { keysym: XK_A });
		assert_eq!(capability.pressed_keys(), vec![XK_SHIFT_L]);

		assert_eq!(
			client.sent(),
			vec!["key:true:0xffe1", "key:true:0x61", "key:false:0x61"]
		);
	}

	#[test]
	fn no_registration_while_inactive() {
		let (ctx, client) = recording_context();
		ctx.close();
		let (surface, capability) = keyboard();

		capability.activate(&ctx).unwrap();
		assert_eq!(surface.events().listener_count(), 0);

		// Input before activation goes nowhere.
		surface.events().emit(InputEvent::KeyDown { keysym: XK_A });
		assert!(client.sent().is_empty());
	}

	#[test]
	fn exactly_one_registration_across_repeated_activation() {
		let (ctx, _client) = recording_context();
		let (surface, capability) = keyboard();

		capability.activate(&ctx).unwrap();
		capability.activate(&ctx).unwrap();
		capability.activate(&ctx).unwrap();
		assert_eq!(surface.events().listener_count(), 1);
	}

	#[test]
	fn focus_loss_releases_held_keys_exactly_once() {
		let (ctx, client) = recording_context();
		let (surface, capability) = keyboard();
		capability.activate(&ctx).unwrap();

		surface.events().emit(InputEvent::KeyDown { keysym: XK_SHIFT_L });
		surface.events().emit(InputEvent::KeyDown { keysym: XK_A });

		surface.events().emit(InputEvent::FocusLost);
		surface.events().emit(InputEvent::FocusLost);

		let releases: Vec<_> = client
			.sent()
			.into_iter()
			.filter(|s| s.starts_with("key:false"))
			.collect();
		assert_eq!(releases, vec!["key:false:0xffe1", "key:false:0x61"]);
		assert!(capability.pressed_keys().is_empty());
	}

	#[test]
	fn deactivate_releases_listener_and_client() {
		let (ctx, client) = recording_context();
		let (surface, capability) = keyboard();
		capability.activate(&ctx).unwrap();
		assert_eq!(surface.events().listener_count(), 1);

		capability.deactivate().unwrap();
		assert_eq!(surface.events().listener_count(), 0);
		assert!(capability.send_key(true, XK_A).is_err());

		// Events after deactivation are not forwarded.
		surface.events().emit(InputEvent::KeyDown { keysym: XK_A });
		assert!(client.sent().is_empty());
	}
}
