//! Length-prefixed pipe transport.
//!
//! Frames are `[length (4 bytes LE)][JSON bytes]`, matching the framing the
//! local gateway socket speaks. Also the transport of choice in tests, over
//! [`tokio::io::duplex`] pairs.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use super::{Transport, TransportParts, TransportReceiver};
use crate::error::{Error, Result};

/// Upper bound on a single frame; anything larger is treated as corruption.
const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Length-prefixed transport over an `AsyncWrite`/`AsyncRead` pair.
pub struct PipeTransport<W, R> {
	sender: PipeTransportSender<W>,
	receiver: PipeTransportReceiver<R>,
}

impl<W, R> PipeTransport<W, R>
where
	W: AsyncWrite + Unpin + Send + 'static,
	R: AsyncRead + Unpin + Send + 'static,
{
	/// Creates a pipe transport and the channel its receiver forwards into.
	pub fn new(writer: W, reader: R) -> (Self, mpsc::UnboundedReceiver<Value>) {
		let (tx, rx) = mpsc::unbounded_channel();
		let transport = Self {
			sender: PipeTransportSender { writer },
			receiver: PipeTransportReceiver { reader, tx },
		};
		(transport, rx)
	}

	/// Splits into the sender and receiver halves.
	pub fn into_parts(self) -> (PipeTransportSender<W>, PipeTransportReceiver<R>) {
		(self.sender, self.receiver)
	}

	/// Boxes the halves into [`TransportParts`] for the connection layer.
	pub fn into_transport_parts(self, message_rx: mpsc::UnboundedReceiver<Value>) -> TransportParts {
		let (sender, receiver) = self.into_parts();
		TransportParts {
			sender: Box::new(sender),
			receiver: Box::new(receiver),
			message_rx,
		}
	}

	/// Runs the receive loop in place. Convenience for tests that never
	/// split the transport.
	pub async fn run(&mut self) -> Result<()> {
		self.receiver.run_loop().await
	}
}

/// Outbound half of a [`PipeTransport`].
pub struct PipeTransportSender<W> {
	writer: W,
}

impl<W> PipeTransportSender<W>
where
	W: AsyncWrite + Unpin + Send,
{
	async fn write_frame(&mut self, message: Value) -> Result<()> {
		let payload = serde_json::to_vec(&message)?;
		let length = payload.len() as u32;
		self.writer.write_all(&length.to_le_bytes()).await?;
		self.writer.write_all(&payload).await?;
		self.writer.flush().await?;
		Ok(())
	}
}

impl<W> Transport for PipeTransportSender<W>
where
	W: AsyncWrite + Unpin + Send,
{
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(self.write_frame(message))
	}
}

/// Inbound half of a [`PipeTransport`].
pub struct PipeTransportReceiver<R> {
	reader: R,
	tx: mpsc::UnboundedSender<Value>,
}

impl<R> PipeTransportReceiver<R>
where
	R: AsyncRead + Unpin + Send,
{
	async fn run_loop(&mut self) -> Result<()> {
		loop {
			let mut len_buf = [0u8; 4];
			match self.reader.read_exact(&mut len_buf).await {
				Ok(_) => {}
				// EOF at a frame boundary is an orderly close.
				Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
				Err(e) => return Err(e.into()),
			}

			let length = u32::from_le_bytes(len_buf);
			if length > MAX_FRAME_LEN {
				return Err(Error::ProtocolError(format!(
					"frame length {length} exceeds maximum {MAX_FRAME_LEN}"
				)));
			}

			let mut payload = vec![0u8; length as usize];
			self.reader.read_exact(&mut payload).await?;

			match serde_json::from_slice::<Value>(&payload) {
				Ok(message) => {
					if self.tx.send(message).is_err() {
						// Consumer is gone; stop reading.
						return Ok(());
					}
				}
				Err(e) => {
					tracing::warn!(error = %e, "Dropping undecodable frame");
				}
			}
		}
	}
}

impl<R> TransportReceiver for PipeTransportReceiver<R>
where
	R: AsyncRead + Unpin + Send,
{
	fn run(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(self.run_loop())
	}
}
