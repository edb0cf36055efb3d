//! Display surface geometry: logical viewport vs. physical pixels.

use serde::{Deserialize, Serialize};

/// Logical (CSS) size of the display surface, in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	/// Creates a viewport from logical width and height.
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}
}

/// Physical pixel dimensions of the remote framebuffer.
///
/// Always derived from the logical viewport scaled by the device pixel
/// ratio. Requesting the logical size from the remote server produces a
/// blurry framebuffer on high-density displays, so the logical size never
/// goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayGeometry {
	pub width: u32,
	pub height: u32,
}

impl DisplayGeometry {
	/// Scales a logical viewport to physical pixels.
	///
	/// Dimensions are rounded to the nearest whole pixel and clamped to at
	/// least 1x1 so a zero-sized surface can never produce a degenerate
	/// remote framebuffer.
	pub fn from_viewport(viewport: Viewport, device_pixel_ratio: f64) -> Self {
		let scale = |v: f64| ((v * device_pixel_ratio).round() as u32).max(1);
		Self {
			width: scale(viewport.width),
			height: scale(viewport.height),
		}
	}
}
