//! Option structs for opening console sessions.

use serde::{Deserialize, Serialize};

use crate::geometry::Viewport;
use crate::params::DEFAULT_DPI;
use crate::types::{ConsoleKind, SessionId};

/// Default connect timeout in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30000;

/// Configuration for opening a console session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
	/// Resource the console attaches to.
	pub resource: u32,

	/// Console transport kind.
	pub kind: ConsoleKind,

	/// Console ticket issued by the management backend.
	pub token: String,

	/// Gateway endpoint URL (`ws://` / `wss://`).
	pub endpoint: String,

	/// Initial logical size of the display surface.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub viewport: Option<Viewport>,

	/// Device pixel ratio of the local display.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub device_pixel_ratio: Option<f64>,

	/// Display density reported to the gateway.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub dpi: Option<u32>,

	/// Maximum time to wait for the gateway ready notification, in ms.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub connect_timeout: Option<u64>,
}

impl ConnectOptions {
	/// Creates options for the given resource, kind, ticket, and endpoint.
	pub fn new(
		resource: u32,
		kind: ConsoleKind,
		token: impl Into<String>,
		endpoint: impl Into<String>,
	) -> Self {
		Self {
			resource,
			kind,
			token: token.into(),
			endpoint: endpoint.into(),
			viewport: None,
			device_pixel_ratio: None,
			dpi: None,
			connect_timeout: None,
		}
	}

	/// Sets the initial logical viewport.
	pub fn viewport(mut self, viewport: Viewport) -> Self {
		self.viewport = Some(viewport);
		self
	}

	/// Sets the device pixel ratio.
	pub fn device_pixel_ratio(mut self, ratio: f64) -> Self {
		self.device_pixel_ratio = Some(ratio);
		self
	}

	/// Sets the reported display density.
	pub fn dpi(mut self, dpi: u32) -> Self {
		self.dpi = Some(dpi);
		self
	}

	/// Sets the connect timeout in milliseconds.
	pub fn connect_timeout(mut self, millis: u64) -> Self {
		self.connect_timeout = Some(millis);
		self
	}

	/// Returns the composite session id these options describe.
	pub fn session_id(&self) -> SessionId {
		SessionId::new(self.resource, self.kind)
	}

	/// Returns the effective display density.
	pub fn effective_dpi(&self) -> u32 {
		self.dpi.unwrap_or(DEFAULT_DPI)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builder_defaults() {
		let options = ConnectOptions::new(6, ConsoleKind::Vnc, "tok", "wss://gw/console");
		assert_eq!(options.session_id().to_string(), "6-vnc");
		assert_eq!(options.effective_dpi(), DEFAULT_DPI);
		assert!(options.viewport.is_none());
	}
}
