//! Clipboard capability: local-to-remote clipboard forwarding.
//!
//! The remote-to-local direction does not need a capability: the connection
//! controller broadcasts gateway clipboard pushes, surfaced through
//! [`Session::clipboard_events`].
//!
//! [`Session::clipboard_events`]: crate::session::Session::clipboard_events

use std::sync::Arc;

use parking_lot::Mutex;

use rdc_runtime::{Error, Result};

use super::{Capability, CapabilityFragment, CapabilityPlugin, Capabilities, SessionContext};
use crate::events::{EventSource, InputEvent};
use crate::handlers::ListenerGuard;
use crate::surface::DisplaySurface;

pub(crate) const NAME: &str = "clipboard";

/// Installs the [`ClipboardCapability`].
///
/// Requires the display capability: clipboard change events arrive through
/// the display surface's event hub.
#[derive(Default)]
pub struct ClipboardPlugin;

impl ClipboardPlugin {
	pub fn new() -> Self {
		Self
	}
}

impl CapabilityPlugin for ClipboardPlugin {
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
		Ok(CapabilityFragment::clipboard(Arc::new(
			ClipboardCapability::new(Arc::clone(display.surface())),
		)))
	}
}

/// Forwards local clipboard changes to the remote side.
pub struct ClipboardCapability {
	surface: Arc<DisplaySurface>,
	client: Mutex<Option<Arc<dyn rdc_runtime::ConsoleClient>>>,
	guard: Mutex<Option<ListenerGuard>>,
}

impl ClipboardCapability {
	fn new(surface: Arc<DisplaySurface>) -> Self {
		Self {
			surface,
			client: Mutex::new(None),
			guard: Mutex::new(None),
		}
	}

	/// Pushes clipboard contents to the remote side programmatically.
	///
	/// # Errors
	///
	/// Returns [`Error::SessionClosed`] while the capability is inactive.
	pub fn send(&self, data: &str) -> Result<()> {
		let client = self.client.lock().clone().ok_or(Error::SessionClosed {
			context: "clipboard capability is not active".to_string(),
		})?;
		client.send_clipboard(data)
	}
}

impl Capability for ClipboardCapability {
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
		*guard = Some(self.surface.events().add_listener(Arc::new(move |event: &InputEvent| {
			if let InputEvent::ClipboardChanged { data } = event {
				if let Err(e) = client.send_clipboard(data) {
					tracing::debug!(error = %e, "Clipboard push dropped, session closing");
				}
			}
		})));
		Ok(())
	}

	fn deactivate(&self) -> Result<()> {
		self.guard.lock().take();
		self.client.lock().take();
		Ok(())
	}
}
