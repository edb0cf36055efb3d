//! Bidirectional message transports to the console gateway.
//!
//! A transport moves opaque JSON values between the runtime and the gateway.
//! The sender and receiver halves are split so the connection layer can run
//! them on independent tasks:
//!
//! - [`Transport`] - outbound half, consumed by the writer task
//! - [`TransportReceiver`] - inbound half; its [`run`](TransportReceiver::run)
//!   loop decodes frames and forwards them over an unbounded channel
//!
//! Two implementations are provided: [`WebSocketTransport`] for gateway
//! endpoints and [`PipeTransport`] for local gateway sockets and tests
//! (length-prefixed framing over any `AsyncRead`/`AsyncWrite` pair).

mod pipe;
mod ws;

#[cfg(test)]
mod tests;

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;

pub use pipe::{PipeTransport, PipeTransportReceiver, PipeTransportSender};
pub use ws::{WebSocketTransport, WebSocketTransportReceiver, WebSocketTransportSender};

/// Outbound transport half.
pub trait Transport: Send {
	/// Sends one message to the gateway.
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Inbound transport half.
pub trait TransportReceiver: Send {
	/// Runs the read loop until the peer closes or the forwarding channel
	/// is dropped.
	///
	/// Returns `Ok(())` on orderly shutdown and an error only for transport
	/// failures.
	fn run(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// A transport split into the pieces the connection layer needs.
pub struct TransportParts {
	/// Outbound half, taken by the writer task.
	pub sender: Box<dyn Transport>,
	/// Inbound half, taken by the reader task.
	pub receiver: Box<dyn TransportReceiver>,
	/// Channel on which the receiver delivers decoded messages.
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}
