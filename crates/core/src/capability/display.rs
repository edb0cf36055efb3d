//! Display capability: surface ownership and resize propagation.

use std::sync::Arc;

use parking_lot::Mutex;

use rdc_protocol::DisplayGeometry;
use rdc_runtime::Result;

use super::{Capability, CapabilityFragment, CapabilityPlugin, Capabilities, SessionContext};
use crate::events::{EventSource, InputEvent};
use crate::handlers::ListenerGuard;
use crate::surface::DisplaySurface;

pub(crate) const NAME: &str = "display";

/// Installs the [`DisplayCapability`].
///
/// This is the mandatory first plugin of every composition pass: later
/// plugins read the surface it exposes.
pub struct DisplayPlugin {
	surface: Arc<DisplaySurface>,
}

impl DisplayPlugin {
	/// Creates the plugin for the given surface.
	pub fn new(surface: Arc<DisplaySurface>) -> Self {
		Self { surface }
	}
}

impl CapabilityPlugin for DisplayPlugin {
	fn name(&self) -> &'static str {
		NAME
	}

	fn install(
		&self,
		_ctx: &Arc<SessionContext>,
		_current: &Capabilities,
	) -> Result<CapabilityFragment> {
		Ok(CapabilityFragment::display(Arc::new(
			DisplayCapability::new(Arc::clone(&self.surface)),
		)))
	}
}

/// Owns the display surface reference and, while active, forwards surface
/// resizes to the remote side as size instructions.
pub struct DisplayCapability {
	surface: Arc<DisplaySurface>,
	guard: Mutex<Option<ListenerGuard>>,
}

impl DisplayCapability {
	fn new(surface: Arc<DisplaySurface>) -> Self {
		Self {
			surface,
			guard: Mutex::new(None),
		}
	}

	/// Returns the display surface.
	pub fn surface(&self) -> &Arc<DisplaySurface> {
		&self.surface
	}

	/// Returns the current physical geometry.
	pub fn geometry(&self) -> DisplayGeometry {
		self.surface.geometry()
	}
}

impl Capability for DisplayCapability {
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
		*guard = Some(self.surface.events().add_listener(Arc::new(move |event: &InputEvent| {
			if let InputEvent::Resized { viewport } = event {
				let geometry =
					DisplayGeometry::from_viewport(*viewport, surface.device_pixel_ratio());
				if let Err(e) = client.send_resize(geometry) {
					tracing::debug!(error = %e, "Resize dropped, session closing");
				}
			}
		})));
		Ok(())
	}

	fn deactivate(&self) -> Result<()> {
		self.guard.lock().take();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use rdc_protocol::Viewport;

	use super::super::testing::recording_context;
	use super::*;

	#[test]
	fn forwards_resizes_in_physical_pixels() {
		let (ctx, client) = recording_context();
		let surface = Arc::new(DisplaySurface::new(Viewport::new(800.0, 600.0), 2.0));
		let capability = DisplayCapability::new(Arc::clone(&surface));

		capability.activate(&ctx).unwrap();
		surface.resize(Viewport::new(640.0, 480.0));

		assert_eq!(client.sent(), vec!["size:1280:960"]);
	}

	#[test]
	fn activation_is_idempotent() {
		let (ctx, _client) = recording_context();
		let surface = Arc::new(DisplaySurface::new(Viewport::new(800.0, 600.0), 1.0));
		let capability = DisplayCapability::new(Arc::clone(&surface));

		capability.activate(&ctx).unwrap();
		capability.activate(&ctx).unwrap();
		assert_eq!(surface.events().listener_count(), 1);

		capability.deactivate().unwrap();
		capability.deactivate().unwrap();
		assert_eq!(surface.events().listener_count(), 0);
	}

	#[test]
	fn defers_without_client() {
		let (ctx, _client) = recording_context();
		ctx.close();

		let surface = Arc::new(DisplaySurface::new(Viewport::new(800.0, 600.0), 1.0));
		let capability = DisplayCapability::new(Arc::clone(&surface));

		capability.activate(&ctx).unwrap();
		assert_eq!(surface.events().listener_count(), 0);
	}
}
