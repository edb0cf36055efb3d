//! Mouse capability: pointer state forwarding with physical scaling.

use std::sync::Arc;

use parking_lot::Mutex;

use rdc_protocol::{MouseButton, MouseState};
use rdc_runtime::{ConsoleClient, Error, Result};

use super::{Capability, CapabilityFragment, CapabilityPlugin, Capabilities, SessionContext};
use crate::events::{EventSource, InputEvent};
use crate::handlers::ListenerGuard;
use crate::surface::DisplaySurface;

pub(crate) const NAME: &str = "mouse";

/// Installs the [`MouseCapability`].
///
/// Requires the display capability: pointer coordinates are scaled by the
/// display surface's device pixel ratio before going on the wire.
#[derive(Default)]
pub struct MousePlugin;

impl MousePlugin {
	pub fn new() -> Self {
		Self
	}
}

impl CapabilityPlugin for MousePlugin {
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
		Ok(CapabilityFragment::mouse(Arc::new(MouseCapability::new(
			Arc::clone(display.surface()),
		))))
	}
}

/// Maintains the pointer state and sends it on every change.
///
/// The remote framebuffer is physical pixels, so logical pointer positions
/// are scaled by the device pixel ratio - the same scaling the connection
/// geometry uses.
pub struct MouseCapability {
	surface: Arc<DisplaySurface>,
	state: Arc<Mutex<MouseState>>,
	guard: Mutex<Option<ListenerGuard>>,
}

impl MouseCapability {
	fn new(surface: Arc<DisplaySurface>) -> Self {
		Self {
			surface,
			state: Arc::new(Mutex::new(MouseState::default())),
			guard: Mutex::new(None),
		}
	}

	/// Returns the pointer state as last sent.
	pub fn state(&self) -> MouseState {
		*self.state.lock()
	}
}

fn send(client: &Arc<dyn ConsoleClient>, state: MouseState) {
	if let Err(e) = client.send_mouse_state(state) {
		tracing::debug!(error = %e, "Pointer state dropped, session closing");
	}
}

impl Capability for MouseCapability {
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

		let surface = Arc::clone(&self.surface);
		let state = Arc::clone(&self.state);
		*guard = Some(self.surface.events().add_listener(Arc::new(move |event: &InputEvent| {
			match event {
				InputEvent::PointerMove { x, y } => {
					let ratio = surface.device_pixel_ratio();
					let next = {
						let mut state = state.lock();
						state.x = (x * ratio).round() as i32;
						state.y = (y * ratio).round() as i32;
						*state
					};
					send(&client, next);
				}
				InputEvent::PointerDown { button } => {
					let next = {
						let mut state = state.lock();
						*state = state.press(*button);
						*state
					};
					send(&client, next);
				}
				InputEvent::PointerUp { button } => {
					let next = {
						let mut state = state.lock();
						*state = state.release(*button);
						*state
					};
					send(&client, next);
				}
				InputEvent::Wheel { delta_y } => {
					// Scroll is a button pulse: press then release.
					let button = if *delta_y < 0.0 {
						MouseButton::ScrollUp
					} else {
						MouseButton::ScrollDown
					};
					let at_rest = *state.lock();
					send(&client, at_rest.press(button));
					send(&client, at_rest);
				}
				_ => {}
			}
		})));
		Ok(())
	}

	fn deactivate(&self) -> Result<()> {
		self.guard.lock().take();
		*self.state.lock() = MouseState::default();
		Ok(())
	}
}
