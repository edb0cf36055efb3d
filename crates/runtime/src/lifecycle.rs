//! Connection lifecycle controller.
//!
//! Owns a live transport and drives the session state machine:
//!
//! ```text
//! Idle -> Connecting -> Connected -> { Disconnected, Errored }
//! ```
//!
//! `Disconnected` and `Errored` are terminal: the controller never leaves
//! them, and a reconnect constructs a fresh controller instead of
//! resurrecting the old one. State is published on a `watch` channel, which
//! gives observers the level-triggered "connected" signal capability
//! activation waits on - a late subscriber still sees the current state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use rdc_protocol::{Notification, ServerMessage, SessionState};

use crate::client::{ConsoleClient, RemoteClient};
use crate::error::{Error, Result};
use crate::transport::{TransportParts, WebSocketTransport};

/// Capacity of the remote-clipboard broadcast channel.
const CLIPBOARD_CHANNEL_CAPACITY: usize = 16;

/// Drives one transport connection through the session state machine.
///
/// Dropping the controller tears the connection down.
pub struct ConnectionController {
	state_tx: watch::Sender<SessionState>,
	client: Arc<RemoteClient>,
	clipboard_tx: broadcast::Sender<String>,
	last_error: Arc<Mutex<Option<Error>>>,
	reader_task: JoinHandle<()>,
	dispatch_task: JoinHandle<()>,
	torn_down: AtomicBool,
}

impl ConnectionController {
	/// Opens a WebSocket transport to the given gateway URL and starts the
	/// controller in the `Connecting` state.
	pub async fn connect(url: &str) -> Result<Self> {
		let parts = WebSocketTransport::connect(url).await?;
		Ok(Self::from_parts(parts))
	}

	/// Starts a controller over an already-open transport.
	///
	/// This is the injection seam: tests drive the state machine through a
	/// pipe transport over in-memory duplex streams.
	pub fn from_parts(parts: TransportParts) -> Self {
		let TransportParts {
			mut sender,
			mut receiver,
			mut message_rx,
		} = parts;

		let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
		let (state_tx, _) = watch::channel(SessionState::Connecting);
		let (clipboard_tx, _) = broadcast::channel(CLIPBOARD_CHANNEL_CAPACITY);
		let last_error = Arc::new(Mutex::new(None));
		let client = Arc::new(RemoteClient::new(outbound_tx));

		// Writer: drains the outbound queue into the transport. Exits when
		// every clone of the queue sender is gone, so the final disconnect
		// instruction still flushes during teardown.
		let writer_state = state_tx.clone();
		let writer_error = Arc::clone(&last_error);
		tokio::spawn(async move {
			while let Some(message) = outbound_rx.recv().await {
				if let Err(e) = sender.send(message).await {
					tracing::error!(error = %e, "Transport write error");
					record_error(&writer_error, e);
					transition(&writer_state, SessionState::Errored);
					break;
				}
			}
		});

		// Reader: decodes frames into the dispatch channel.
		let reader_state = state_tx.clone();
		let reader_error = Arc::clone(&last_error);
		let reader_task = tokio::spawn(async move {
			if let Err(e) = receiver.run().await {
				tracing::error!(error = %e, "Transport read error");
				record_error(&reader_error, e);
				transition(&reader_state, SessionState::Errored);
			}
		});

		// Dispatch: interprets gateway notifications and advances the state
		// machine. Runs until a terminal notification or transport EOF.
		let dispatch_state = state_tx.clone();
		let dispatch_error = Arc::clone(&last_error);
		let dispatch_clipboard = clipboard_tx.clone();
		let dispatch_task = tokio::spawn(async move {
			while let Some(value) = message_rx.recv().await {
				match serde_json::from_value::<ServerMessage>(value) {
					Ok(ServerMessage::Notification(notification)) => match notification {
						Notification::Ready { connection } => {
							tracing::debug!(?connection, "Gateway ready");
							transition(&dispatch_state, SessionState::Connected);
						}
						Notification::Disconnect { reason } => {
							tracing::debug!(?reason, "Gateway disconnected");
							transition(&dispatch_state, SessionState::Disconnected);
							break;
						}
						Notification::Error { message, code } => {
							tracing::warn!(%message, ?code, "Gateway error");
							record_error(&dispatch_error, Error::Gateway { message, code });
							transition(&dispatch_state, SessionState::Errored);
							break;
						}
						Notification::Clipboard { data } => {
							let _ = dispatch_clipboard.send(data);
						}
					},
					Ok(ServerMessage::Unknown(value)) => {
						tracing::debug!(%value, "Unknown notification (ignored)");
					}
					Err(e) => {
						tracing::error!(error = %e, "Failed to parse notification");
					}
				}
			}
			// Transport gone without an explicit close notification.
			transition(&dispatch_state, SessionState::Disconnected);
		});

		Self {
			state_tx,
			client,
			clipboard_tx,
			last_error,
			reader_task,
			dispatch_task,
			torn_down: AtomicBool::new(false),
		}
	}

	/// Returns a receiver observing session state changes.
	pub fn state(&self) -> watch::Receiver<SessionState> {
		self.state_tx.subscribe()
	}

	/// Returns the state at this instant.
	pub fn current_state(&self) -> SessionState {
		*self.state_tx.borrow()
	}

	/// Returns the send-side client handle.
	pub fn client(&self) -> Arc<dyn ConsoleClient> {
		Arc::clone(&self.client) as Arc<dyn ConsoleClient>
	}

	/// Returns a receiver for remote clipboard pushes.
	pub fn clipboard_events(&self) -> broadcast::Receiver<String> {
		self.clipboard_tx.subscribe()
	}

	/// Returns a rendering of the first error recorded on this connection.
	pub fn last_error(&self) -> Option<String> {
		self.last_error.lock().as_ref().map(|e| e.to_string())
	}

	/// Takes ownership of the first error recorded on this connection.
	pub fn take_last_error(&self) -> Option<Error> {
		self.last_error.lock().take()
	}

	/// Tears the connection down synchronously. Idempotent.
	///
	/// Queues an orderly disconnect instruction, marks the session
	/// `Disconnected` (unless already terminal), and stops the read side.
	/// The writer task drains the queue on its own once the client handle
	/// is released.
	pub fn disconnect(&self) {
		if self.torn_down.swap(true, Ordering::SeqCst) {
			return;
		}
		self.client.disconnect();
		transition(&self.state_tx, SessionState::Disconnected);
		self.reader_task.abort();
		self.dispatch_task.abort();
	}
}

impl Drop for ConnectionController {
	fn drop(&mut self) {
		self.disconnect();
	}
}

/// Advances the state machine, refusing to leave terminal states.
fn transition(state_tx: &watch::Sender<SessionState>, to: SessionState) {
	state_tx.send_if_modified(|state| {
		if state.is_terminal() || *state == to {
			return false;
		}
		tracing::debug!(from = %state, to = %to, "Session state transition");
		*state = to;
		true
	});
}

/// Records the first error observed on a connection; later errors are
/// downstream noise of the first failure.
fn record_error(slot: &Mutex<Option<Error>>, error: Error) {
	let mut slot = slot.lock();
	if slot.is_none() {
		*slot = Some(error);
	}
}
