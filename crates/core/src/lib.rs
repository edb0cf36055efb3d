//! Remote display console sessions with composable capabilities.
//!
//! `rdc` manages the lifecycle of one remote-display connection (VNC,
//! SPICE, or VMRC consoles behind a WebSocket gateway) and composes the
//! interaction channels - display, keyboard, mouse, clipboard - onto it as
//! typed capabilities:
//!
//! - [`Session`] owns the connection: it derives the gateway URL from the
//!   display surface's physical geometry, watches the connection state
//!   machine, and tears everything down deterministically at scope exit.
//! - [`CapabilityPlugin`]s install [`Capability`] units during an ordered
//!   composition pass; capabilities attach their input listeners only once
//!   the session is connected and detach them on any teardown path.
//! - [`DisplaySurface`] stands in for the rendered display element and
//!   carries the per-session [`InputEventHub`] local input arrives through,
//!   keeping concurrent sessions fully independent.
//!
//! The wire protocol lives in `rdc-protocol`; transports and the state
//! machine in `rdc-runtime`.

pub mod capability;
pub mod events;
pub mod handlers;
pub mod session;
pub mod surface;

// Re-export key types at crate root
pub use capability::{
	Capabilities, Capability, CapabilityFragment, CapabilityPlugin, ClipboardCapability,
	ClipboardPlugin, DisplayCapability, DisplayPlugin, KeyboardCapability, KeyboardPlugin,
	MouseCapability, MousePlugin, SessionContext,
};
pub use events::{EventSource, InputEvent, InputEventHub};
pub use handlers::{ListenerFn, ListenerGuard, ListenerId};
pub use session::{DEFAULT_VIEWPORT, Session, default_plugins, gateway_url};
pub use surface::DisplaySurface;

// The lower layers, for callers that need them directly.
pub use rdc_protocol as protocol;
pub use rdc_runtime::{ConsoleClient, Error, Result};
