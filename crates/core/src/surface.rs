//! The local display surface a console session renders into.

use parking_lot::Mutex;

use rdc_protocol::{DisplayGeometry, Viewport};

use crate::events::{InputEvent, InputEventHub};

/// Stand-in for the rendered display element: logical size, device pixel
/// ratio, and the event hub local input arrives through.
///
/// The surface is the unit of session independence - two open consoles hold
/// two surfaces with two disjoint listener sets. The device pixel ratio is
/// fixed at construction; moving a window across monitors mid-session is
/// handled by the embedder resizing the surface.
pub struct DisplaySurface {
	viewport: Mutex<Viewport>,
	device_pixel_ratio: f64,
	events: InputEventHub,
}

impl DisplaySurface {
	/// Creates a surface with the given logical viewport and pixel ratio.
	pub fn new(viewport: Viewport, device_pixel_ratio: f64) -> Self {
		Self {
			viewport: Mutex::new(viewport),
			device_pixel_ratio,
			events: InputEventHub::new(),
		}
	}

	/// Returns the current logical viewport.
	pub fn viewport(&self) -> Viewport {
		*self.viewport.lock()
	}

	/// Returns the device pixel ratio.
	pub fn device_pixel_ratio(&self) -> f64 {
		self.device_pixel_ratio
	}

	/// Returns the physical pixel geometry of the surface.
	pub fn geometry(&self) -> DisplayGeometry {
		DisplayGeometry::from_viewport(self.viewport(), self.device_pixel_ratio)
	}

	/// Returns the event hub local input is delivered through.
	pub fn events(&self) -> &InputEventHub {
		&self.events
	}

	/// Updates the logical viewport and announces the resize to listeners.
	pub fn resize(&self, viewport: Viewport) {
		*self.viewport.lock() = viewport;
		self.events.emit(InputEvent::Resized { viewport });
	}
}
