//! Console client - the narrow send-side interface capabilities drive.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::sync::mpsc;

use rdc_protocol::{DisplayGeometry, Instruction, MouseState};

use crate::error::{Error, Result};

/// Send-side interface of a live console connection.
///
/// Capability plugins translate local input events into calls on this trait
/// and never touch the transport directly. All methods are synchronous: they
/// enqueue onto the connection's outbound queue, so they are safe to call
/// from event listeners.
pub trait ConsoleClient: Send + Sync {
	/// Forwards a key press or release, X11 keysym encoded.
	fn send_key_event(&self, pressed: bool, keysym: u32) -> Result<()>;

	/// Forwards the full pointer state.
	fn send_mouse_state(&self, state: MouseState) -> Result<()>;

	/// Pushes local clipboard contents to the remote side.
	fn send_clipboard(&self, data: &str) -> Result<()>;

	/// Announces a new display surface size.
	fn send_resize(&self, geometry: DisplayGeometry) -> Result<()>;

	/// Requests an orderly disconnect. Idempotent; never fails.
	fn disconnect(&self);
}

/// [`ConsoleClient`] backed by a connection's outbound queue.
pub struct RemoteClient {
	outbound_tx: mpsc::UnboundedSender<Value>,
	closed: AtomicBool,
}

impl RemoteClient {
	pub(crate) fn new(outbound_tx: mpsc::UnboundedSender<Value>) -> Self {
		Self {
			outbound_tx,
			closed: AtomicBool::new(false),
		}
	}

	fn send_instruction(&self, instruction: Instruction) -> Result<()> {
		if self.closed.load(Ordering::SeqCst) {
			return Err(Error::SessionClosed {
				context: "client already disconnected".to_string(),
			});
		}
		let value = serde_json::to_value(&instruction)?;
		self.outbound_tx.send(value).map_err(|_| Error::ChannelClosed)
	}
}

impl ConsoleClient for RemoteClient {
	fn send_key_event(&self, pressed: bool, keysym: u32) -> Result<()> {
		self.send_instruction(Instruction::Key { pressed, keysym })
	}

	fn send_mouse_state(&self, state: MouseState) -> Result<()> {
		self.send_instruction(Instruction::Mouse {
			x: state.x,
			y: state.y,
			buttons: state.buttons,
		})
	}

	fn send_clipboard(&self, data: &str) -> Result<()> {
		self.send_instruction(Instruction::Clipboard {
			data: data.to_string(),
		})
	}

	fn send_resize(&self, geometry: DisplayGeometry) -> Result<()> {
		self.send_instruction(Instruction::Size {
			width: geometry.width,
			height: geometry.height,
		})
	}

	fn disconnect(&self) {
		if self.closed.swap(true, Ordering::SeqCst) {
			return;
		}
		// Best effort: the writer task drains the queue before exiting.
		if let Ok(value) = serde_json::to_value(&Instruction::Disconnect) {
			let _ = self.outbound_tx.send(value);
		}
	}
}
