//! Typed capability composition.
//!
//! A capability is one interaction channel of a live console session
//! (display, keyboard, mouse, clipboard). Plugins install capabilities into
//! a session during a composition pass; the session's lifecycle then
//! activates and deactivates them as the connection comes and goes.
//!
//! # Lifecycle contract
//!
//! - `activate` is level-triggered: the session calls it on every observation
//!   of the connected state, so it must be idempotent (one listener
//!   registration total, not one per call).
//! - A capability must not fail when the client is absent; it treats a
//!   missing client as "not yet ready" and defers.
//! - `deactivate` unconditionally releases every listener registered by
//!   `activate` and drops all client references, and must also be
//!   idempotent: both the state watcher and an explicit disconnect may run
//!   teardown.

pub mod clipboard;
pub mod display;
pub mod keyboard;
pub mod mouse;

use std::sync::Arc;

use parking_lot::Mutex;

use rdc_protocol::SessionId;
use rdc_runtime::{ConsoleClient, Result};

pub use clipboard::{ClipboardCapability, ClipboardPlugin};
pub use display::{DisplayCapability, DisplayPlugin};
pub use keyboard::{KeyboardCapability, KeyboardPlugin};
pub use mouse::{MouseCapability, MousePlugin};

/// Per-session state shared with capabilities: identity and the gate to the
/// transport client.
///
/// The client slot empties on teardown, so a capability activation that
/// races a disconnect observes "no client" and defers instead of attaching
/// listeners to a dead session.
pub struct SessionContext {
	id: SessionId,
	client: Mutex<Option<Arc<dyn ConsoleClient>>>,
}

impl SessionContext {
	pub(crate) fn new(id: SessionId, client: Arc<dyn ConsoleClient>) -> Arc<Self> {
		Arc::new(Self {
			id,
			client: Mutex::new(Some(client)),
		})
	}

	/// Returns the session this context belongs to.
	pub fn id(&self) -> SessionId {
		self.id
	}

	/// Returns the transport client, or `None` once the session is torn
	/// down (or not yet wired).
	pub fn client(&self) -> Option<Arc<dyn ConsoleClient>> {
		self.client.lock().clone()
	}

	/// Empties the client slot. After this, activations defer.
	pub(crate) fn close(&self) {
		self.client.lock().take();
	}
}

/// Lifecycle contract of an installed capability. See the module docs.
pub trait Capability: Send + Sync {
	/// Capability slot name ("display", "keyboard", ...).
	fn name(&self) -> &'static str;

	/// Attaches listeners and wires callbacks into the client.
	fn activate(&self, ctx: &SessionContext) -> Result<()>;

	/// Releases everything `activate` registered.
	fn deactivate(&self) -> Result<()>;
}

/// The typed aggregate of capabilities merged onto one session.
#[derive(Default)]
pub struct Capabilities {
	display: Option<Arc<DisplayCapability>>,
	keyboard: Option<Arc<KeyboardCapability>>,
	mouse: Option<Arc<MouseCapability>>,
	clipboard: Option<Arc<ClipboardCapability>>,
}

impl Capabilities {
	/// Returns the display capability, if installed.
	pub fn display(&self) -> Option<&Arc<DisplayCapability>> {
		self.display.as_ref()
	}

	/// Returns the keyboard capability, if installed.
	pub fn keyboard(&self) -> Option<&Arc<KeyboardCapability>> {
		self.keyboard.as_ref()
	}

	/// Returns the mouse capability, if installed.
	pub fn mouse(&self) -> Option<&Arc<MouseCapability>> {
		self.mouse.as_ref()
	}

	/// Returns the clipboard capability, if installed.
	pub fn clipboard(&self) -> Option<&Arc<ClipboardCapability>> {
		self.clipboard.as_ref()
	}

	/// Returns the names of the filled capability slots.
	pub fn slots(&self) -> Vec<&'static str> {
		let mut slots = Vec::new();
		if self.display.is_some() {
			slots.push(display::NAME);
		}
		if self.keyboard.is_some() {
			slots.push(keyboard::NAME);
		}
		if self.mouse.is_some() {
			slots.push(mouse::NAME);
		}
		if self.clipboard.is_some() {
			slots.push(clipboard::NAME);
		}
		slots
	}
}

/// The capability slots one plugin contributes in a composition pass.
///
/// Merging a fragment overwrites any slot it fills, which is how a later
/// plugin overrides an earlier one.
#[derive(Default)]
pub struct CapabilityFragment {
	pub display: Option<Arc<DisplayCapability>>,
	pub keyboard: Option<Arc<KeyboardCapability>>,
	pub mouse: Option<Arc<MouseCapability>>,
	pub clipboard: Option<Arc<ClipboardCapability>>,
}

impl CapabilityFragment {
	/// Fragment contributing a display capability.
	pub fn display(capability: Arc<DisplayCapability>) -> Self {
		Self {
			display: Some(capability),
			..Self::default()
		}
	}

	/// Fragment contributing a keyboard capability.
	pub fn keyboard(capability: Arc<KeyboardCapability>) -> Self {
		Self {
			keyboard: Some(capability),
			..Self::default()
		}
	}

	/// Fragment contributing a mouse capability.
	pub fn mouse(capability: Arc<MouseCapability>) -> Self {
		Self {
			mouse: Some(capability),
			..Self::default()
		}
	}

	/// Fragment contributing a clipboard capability.
	pub fn clipboard(capability: Arc<ClipboardCapability>) -> Self {
		Self {
			clipboard: Some(capability),
			..Self::default()
		}
	}

	pub(crate) fn merge_into(self, capabilities: &mut Capabilities) -> Vec<Arc<dyn Capability>> {
		let mut installed: Vec<Arc<dyn Capability>> = Vec::new();
		if let Some(display) = self.display {
			installed.push(Arc::clone(&display) as Arc<dyn Capability>);
			capabilities.display = Some(display);
		}
		if let Some(keyboard) = self.keyboard {
			installed.push(Arc::clone(&keyboard) as Arc<dyn Capability>);
			capabilities.keyboard = Some(keyboard);
		}
		if let Some(mouse) = self.mouse {
			installed.push(Arc::clone(&mouse) as Arc<dyn Capability>);
			capabilities.mouse = Some(mouse);
		}
		if let Some(clipboard) = self.clipboard {
			installed.push(Arc::clone(&clipboard) as Arc<dyn Capability>);
			capabilities.clipboard = Some(clipboard);
		}
		installed
	}
}

/// A composable unit adding interaction channels to a session.
///
/// Install order matters: a plugin sees the aggregate as accumulated so far
/// and may depend on capabilities installed before it (the mouse plugin
/// reads the display plugin's surface). Installation itself is side-effect
/// free; listeners attach only on activation.
pub trait CapabilityPlugin: Send + Sync {
	/// Plugin name, used in composition diagnostics.
	fn name(&self) -> &'static str;

	/// Invoked once per composition pass with the current aggregate.
	fn install(
		&self,
		ctx: &Arc<SessionContext>,
		current: &Capabilities,
	) -> Result<CapabilityFragment>;
}

#[cfg(test)]
pub(crate) mod testing {
	use std::sync::Arc;

	use parking_lot::Mutex;

	use rdc_protocol::{ConsoleKind, DisplayGeometry, MouseState, SessionId};
	use rdc_runtime::{ConsoleClient, Result};

	use super::SessionContext;

	/// Client double that records every call for assertion.
	#[derive(Default)]
	pub struct RecordingClient {
		pub sent: Mutex<Vec<String>>,
	}

	impl RecordingClient {
		pub fn sent(&self) -> Vec<String> {
			self.sent.lock().clone()
		}
	}

	impl ConsoleClient for RecordingClient {
		fn send_key_event(&self, pressed: bool, keysym: u32) -> Result<()> {
			self.sent.lock().push(format!("key:{pressed}:{keysym:#x}"));
			Ok(())
		}

		fn send_mouse_state(&self, state: MouseState) -> Result<()> {
			self.sent
				.lock()
				.push(format!("mouse:{}:{}:{:#04x}", state.x, state.y, state.buttons));
			Ok(())
		}

		fn send_clipboard(&self, data: &str) -> Result<()> {
			self.sent.lock().push(format!("clipboard:{data}"));
			Ok(())
		}

		fn send_resize(&self, geometry: DisplayGeometry) -> Result<()> {
			self.sent
				.lock()
				.push(format!("size:{}:{}", geometry.width, geometry.height));
			Ok(())
		}

		fn disconnect(&self) {
			self.sent.lock().push("disconnect".to_string());
		}
	}

	/// Context wired to a fresh [`RecordingClient`].
	pub fn recording_context() -> (Arc<SessionContext>, Arc<RecordingClient>) {
		let client = Arc::new(RecordingClient::default());
		let ctx = SessionContext::new(
			SessionId::new(6, ConsoleKind::Vnc),
			Arc::clone(&client) as Arc<dyn ConsoleClient>,
		);
		(ctx, client)
	}
}
