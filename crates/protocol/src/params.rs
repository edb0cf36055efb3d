//! Connection parameters assembled at connect time.

use serde::{Deserialize, Serialize};

use crate::geometry::DisplayGeometry;

/// Default display density reported to the gateway, in dots per inch.
pub const DEFAULT_DPI: u32 = 96;

/// Read-only configuration used to initiate a gateway connection.
///
/// Built from the display surface's rendered size at connect time. Width and
/// height are physical pixels (`logical size x device pixel ratio`), never
/// the CSS logical size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionParams {
	/// One-shot console ticket issued by the management backend.
	pub token: String,
	/// Remote framebuffer width in physical pixels.
	pub width: u32,
	/// Remote framebuffer height in physical pixels.
	pub height: u32,
	/// Display density in dots per inch.
	pub dpi: u32,
}

impl ConnectionParams {
	/// Creates parameters from a console token and physical geometry.
	pub fn new(token: impl Into<String>, geometry: DisplayGeometry) -> Self {
		Self {
			token: token.into(),
			width: geometry.width,
			height: geometry.height,
			dpi: DEFAULT_DPI,
		}
	}

	/// Overrides the reported display density.
	pub fn dpi(mut self, dpi: u32) -> Self {
		self.dpi = dpi;
		self
	}

	/// Renders the query string fragment the gateway expects.
	///
	/// Console tickets are URL-safe by construction (hex-encoded by the
	/// issuing backend), so no percent-encoding pass is applied.
	pub fn to_query(&self) -> String {
		format!(
			"token={}&width={}&height={}&dpi={}",
			self.token, self.width, self.height, self.dpi
		)
	}

	/// Appends the query string to a gateway endpoint URL.
	pub fn apply_to(&self, endpoint: &str) -> String {
		let separator = if endpoint.contains('?') { '&' } else { '?' };
		format!("{}{}{}", endpoint, separator, self.to_query())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::geometry::Viewport;

	#[test]
	fn query_encodes_physical_pixels() {
		let geometry = DisplayGeometry::from_viewport(Viewport::new(800.0, 600.0), 2.0);
		let params = ConnectionParams::new("abc123", geometry);
		assert_eq!(params.to_query(), "token=abc123&width=1600&height=1200&dpi=96");
	}

	#[test]
	fn apply_to_respects_existing_query() {
		let params = ConnectionParams {
			token: "t".to_string(),
			width: 100,
			height: 100,
			dpi: DEFAULT_DPI,
		};
		assert_eq!(
			params.apply_to("wss://gw.example/console"),
			"wss://gw.example/console?token=t&width=100&height=100&dpi=96"
		);
		assert_eq!(
			params.apply_to("wss://gw.example/console?zone=0"),
			"wss://gw.example/console?zone=0&token=t&width=100&height=100&dpi=96"
		);
	}
}
