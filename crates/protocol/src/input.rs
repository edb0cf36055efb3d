//! Pointer and keyboard input state as it goes on the wire.

use serde::{Deserialize, Serialize};

/// Pointer button identifiers, matching the X11 core button numbering the
/// remote side expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
	Left,
	Middle,
	Right,
	ScrollUp,
	ScrollDown,
}

impl MouseButton {
	/// Returns this button's bit in the wire button mask.
	pub fn mask(&self) -> u8 {
		match self {
			Self::Left => 0x01,
			Self::Middle => 0x02,
			Self::Right => 0x04,
			Self::ScrollUp => 0x08,
			Self::ScrollDown => 0x10,
		}
	}
}

/// Full pointer state sent on every pointer change.
///
/// Coordinates are physical pixels in the remote framebuffer's coordinate
/// space; the mouse capability performs the logical-to-physical scaling
/// before constructing this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseState {
	pub x: i32,
	pub y: i32,
	/// Held-button mask; bit per [`MouseButton`].
	pub buttons: u8,
}

impl MouseState {
	/// Creates a pointer state at the given position with no buttons held.
	pub fn at(x: i32, y: i32) -> Self {
		Self { x, y, buttons: 0 }
	}

	/// Returns a copy with the given button pressed.
	pub fn press(mut self, button: MouseButton) -> Self {
		self.buttons |= button.mask();
		self
	}

	/// Returns a copy with the given button released.
	pub fn release(mut self, button: MouseButton) -> Self {
		self.buttons &= !button.mask();
		self
	}

	/// Returns `true` if the given button is held.
	pub fn is_pressed(&self, button: MouseButton) -> bool {
		self.buttons & button.mask() != 0
	}
}
