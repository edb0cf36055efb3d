//! [`Session`] - the owning handle of one live console connection.

mod compose;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use rdc_protocol::{ConnectOptions, ConnectionParams, SessionId, SessionState, Viewport};
use rdc_runtime::{ConnectionController, Error, Result, TransportParts};

use crate::capability::{
	Capabilities, Capability, CapabilityPlugin, ClipboardCapability, ClipboardPlugin,
	DisplayCapability, DisplayPlugin, KeyboardCapability, KeyboardPlugin, MouseCapability,
	MousePlugin, SessionContext,
};
use crate::surface::DisplaySurface;

use compose::Composition;

/// Logical surface size used when the caller does not provide one.
pub const DEFAULT_VIEWPORT: Viewport = Viewport {
	width: 1024.0,
	height: 768.0,
};

/// The caller-supplied plugin list [`Session::open`] composes by default:
/// keyboard, mouse, and clipboard. The display plugin is always installed
/// first regardless of this list.
pub fn default_plugins() -> Vec<Arc<dyn CapabilityPlugin>> {
	vec![
		Arc::new(KeyboardPlugin::new()),
		Arc::new(MousePlugin::new()),
		Arc::new(ClipboardPlugin::new()),
	]
}

/// Renders the gateway URL for the given options and surface.
///
/// The geometry in the query string is the surface's physical pixel size;
/// encoding the logical size here is the classic blurry-framebuffer bug.
pub fn gateway_url(options: &ConnectOptions, surface: &DisplaySurface) -> String {
	ConnectionParams::new(options.token.clone(), surface.geometry())
		.dpi(options.effective_dpi())
		.apply_to(&options.endpoint)
}

/// One live remote-display connection and its merged capabilities.
///
/// The opener exclusively owns the session. Teardown runs deterministically:
/// on [`disconnect`](Self::disconnect), when the connection reaches a
/// terminal state, or at the latest on drop - whichever comes first; the
/// others become no-ops. A session that reached `Disconnected` or `Errored`
/// is finished; open a new one to reconnect.
pub struct Session {
	id: SessionId,
	surface: Arc<DisplaySurface>,
	controller: ConnectionController,
	context: Arc<SessionContext>,
	capabilities: Capabilities,
	attached: Arc<Mutex<Vec<Arc<dyn Capability>>>>,
	base_plugins: Vec<Arc<dyn CapabilityPlugin>>,
	state_task: JoinHandle<()>,
	torn_down: AtomicBool,
}

impl Session {
	/// Opens a console session with the default capability plugins.
	pub async fn open(options: ConnectOptions) -> Result<Self> {
		Self::open_with(options, default_plugins()).await
	}

	/// Opens a console session with an explicit caller plugin list.
	///
	/// The display plugin is installed first, then `plugins` in order.
	pub async fn open_with(
		options: ConnectOptions,
		plugins: Vec<Arc<dyn CapabilityPlugin>>,
	) -> Result<Self> {
		let surface = Arc::new(new_surface(&options));
		let url = gateway_url(&options, &surface);
		let controller = ConnectionController::connect(&url).await?;
		Self::assemble(options.session_id(), surface, plugins, controller)
	}

	/// Builds a session over an already-open transport.
	///
	/// The injection seam for tests and local gateway sockets; no URL is
	/// derived because the transport is already established.
	pub fn with_transport(
		options: &ConnectOptions,
		plugins: Vec<Arc<dyn CapabilityPlugin>>,
		parts: TransportParts,
	) -> Result<Self> {
		let surface = Arc::new(new_surface(options));
		let controller = ConnectionController::from_parts(parts);
		Self::assemble(options.session_id(), surface, plugins, controller)
	}

	fn assemble(
		id: SessionId,
		surface: Arc<DisplaySurface>,
		plugins: Vec<Arc<dyn CapabilityPlugin>>,
		controller: ConnectionController,
	) -> Result<Self> {
		let context = SessionContext::new(id, controller.client());
		let base_plugins: Vec<Arc<dyn CapabilityPlugin>> =
			vec![Arc::new(DisplayPlugin::new(Arc::clone(&surface)))];

		let all: Vec<Arc<dyn CapabilityPlugin>> =
			base_plugins.iter().cloned().chain(plugins).collect();
		let Composition {
			capabilities,
			attached,
		} = compose::compose(&context, &all)?;
		let attached = Arc::new(Mutex::new(attached));

		// State watcher: level-triggered activation. Capabilities attach
		// only after the connected notification has fully run, and detach
		// the moment a terminal state is observed.
		let mut state_rx = controller.state();
		let task_ctx = Arc::clone(&context);
		let task_attached = Arc::clone(&attached);
		let state_task = tokio::spawn(async move {
			loop {
				let state = *state_rx.borrow_and_update();
				if state.is_connected() {
					activate_all(&task_attached, &task_ctx);
				} else if state.is_terminal() {
					task_ctx.close();
					deactivate_all(&task_attached);
					break;
				}
				if state_rx.changed().await.is_err() {
					task_ctx.close();
					deactivate_all(&task_attached);
					break;
				}
			}
		});

		tracing::debug!(session = %id, "Session composed");

		Ok(Self {
			id,
			surface,
			controller,
			context,
			capabilities,
			attached,
			base_plugins,
			state_task,
			torn_down: AtomicBool::new(false),
		})
	}

	/// Returns the session id.
	pub fn id(&self) -> SessionId {
		self.id
	}

	/// Returns the display surface this session renders into.
	pub fn surface(&self) -> &Arc<DisplaySurface> {
		&self.surface
	}

	/// Returns a receiver observing session state changes.
	pub fn state(&self) -> watch::Receiver<SessionState> {
		self.controller.state()
	}

	/// Returns the state at this instant.
	pub fn current_state(&self) -> SessionState {
		self.controller.current_state()
	}

	/// Returns `true` while the gateway connection is established.
	pub fn is_connected(&self) -> bool {
		self.current_state().is_connected()
	}

	/// Waits until the session connects.
	///
	/// # Errors
	///
	/// Returns [`Error::Timeout`] if the gateway stays silent, or the
	/// connection's recorded error if it reached a terminal state instead.
	pub async fn wait_until_connected(&self, timeout: Duration) -> Result<()> {
		let mut state_rx = self.controller.state();
		let settled = tokio::time::timeout(
			timeout,
			state_rx.wait_for(|s| s.is_connected() || s.is_terminal()),
		)
		.await
		.map_err(|_| Error::Timeout(format!("Timeout waiting for session {} to connect", self.id)))?
		.map_err(|_| Error::ChannelClosed)?;

		let state = *settled;
		drop(settled);
		if state.is_connected() {
			return Ok(());
		}
		Err(self.controller.take_last_error().unwrap_or_else(|| {
			Error::ConnectionFailed(format!("session reached '{state}' before connecting"))
		}))
	}

	/// Returns the merged capability aggregate.
	pub fn capabilities(&self) -> &Capabilities {
		&self.capabilities
	}

	/// Returns the display capability, if installed.
	pub fn display(&self) -> Option<&Arc<DisplayCapability>> {
		self.capabilities.display()
	}

	/// Returns the keyboard capability, if installed.
	pub fn keyboard(&self) -> Option<&Arc<KeyboardCapability>> {
		self.capabilities.keyboard()
	}

	/// Returns the mouse capability, if installed.
	pub fn mouse(&self) -> Option<&Arc<MouseCapability>> {
		self.capabilities.mouse()
	}

	/// Returns the clipboard capability, if installed.
	pub fn clipboard(&self) -> Option<&Arc<ClipboardCapability>> {
		self.capabilities.clipboard()
	}

	/// Returns a receiver for clipboard contents pushed by the remote side.
	pub fn clipboard_events(&self) -> broadcast::Receiver<String> {
		self.controller.clipboard_events()
	}

	/// Returns a rendering of the connection's recorded error, if any.
	pub fn last_error(&self) -> Option<String> {
		self.controller.last_error()
	}

	/// Re-runs the composition pass with a fresh caller plugin list.
	///
	/// The display plugin stays first; every slot is rebuilt with fresh
	/// closures bound to this session. Already-active capabilities detach
	/// before the new set attaches.
	pub fn recompose(&mut self, plugins: Vec<Arc<dyn CapabilityPlugin>>) -> Result<()> {
		if self.torn_down.load(Ordering::SeqCst) {
			return Err(Error::SessionClosed {
				context: format!("session {} is torn down", self.id),
			});
		}

		let all: Vec<Arc<dyn CapabilityPlugin>> =
			self.base_plugins.iter().cloned().chain(plugins).collect();
		deactivate_all(&self.attached);

		let Composition {
			capabilities,
			attached,
		} = compose::compose(&self.context, &all)?;
		self.capabilities = capabilities;
		*self.attached.lock() = attached;

		if self.is_connected() {
			activate_all(&self.attached, &self.context);
		}
		Ok(())
	}

	/// Tears the session down synchronously. Idempotent.
	///
	/// Every capability detaches before the controller releases the
	/// transport, even mid-`Connecting`; the session lands in
	/// `Disconnected`.
	pub fn disconnect(&self) {
		if self.torn_down.swap(true, Ordering::SeqCst) {
			return;
		}
		tracing::debug!(session = %self.id, "Session disconnecting");
		self.state_task.abort();
		// Gate late activations first: an activate racing this teardown
		// observes an empty client slot and defers instead of re-attaching.
		self.context.close();
		deactivate_all(&self.attached);
		self.controller.disconnect();
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		self.disconnect();
	}
}

fn new_surface(options: &ConnectOptions) -> DisplaySurface {
	DisplaySurface::new(
		options.viewport.unwrap_or(DEFAULT_VIEWPORT),
		options.device_pixel_ratio.unwrap_or(1.0),
	)
}

fn activate_all(attached: &Mutex<Vec<Arc<dyn Capability>>>, ctx: &SessionContext) {
	let attached: Vec<_> = attached.lock().clone();
	for capability in attached {
		if let Err(e) = capability.activate(ctx) {
			tracing::warn!(capability = capability.name(), error = %e, "Activation failed");
		}
	}
}

fn deactivate_all(attached: &Mutex<Vec<Arc<dyn Capability>>>) {
	// Reverse install order; one failure never blocks the rest.
	let attached: Vec<_> = attached.lock().clone();
	for capability in attached.iter().rev() {
		if let Err(e) = capability.deactivate() {
			let e = Error::Teardown {
				capability: capability.name(),
				message: e.to_string(),
			};
			tracing::warn!(error = %e, "Capability teardown failed");
		}
	}
}
