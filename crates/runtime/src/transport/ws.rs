//! WebSocket transport over `tokio-tungstenite`.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::{Transport, TransportParts, TransportReceiver};
use crate::error::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport to a console gateway endpoint.
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Opens a WebSocket connection to the given `ws://`/`wss://` URL and
	/// returns the split transport.
	pub async fn connect(url: &str) -> Result<TransportParts> {
		let (stream, _response) = connect_async(url)
			.await
			.map_err(|e| Error::ConnectionFailed(e.to_string()))?;

		let (sink, stream) = stream.split();
		let (tx, message_rx) = mpsc::unbounded_channel();

		Ok(TransportParts {
			sender: Box::new(WebSocketTransportSender { sink }),
			receiver: Box::new(WebSocketTransportReceiver { stream, tx }),
			message_rx,
		})
	}
}

/// Outbound half of the WebSocket transport.
pub struct WebSocketTransportSender {
	sink: SplitSink<WsStream, Message>,
}

impl WebSocketTransportSender {
	async fn send_text(&mut self, message: Value) -> Result<()> {
		let text = serde_json::to_string(&message)?;
		self.sink
			.send(Message::Text(text))
			.await
			.map_err(|e| Error::TransportError(e.to_string()))
	}
}

impl Transport for WebSocketTransportSender {
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(self.send_text(message))
	}
}

/// Inbound half of the WebSocket transport.
pub struct WebSocketTransportReceiver {
	stream: SplitStream<WsStream>,
	tx: mpsc::UnboundedSender<Value>,
}

impl WebSocketTransportReceiver {
	async fn run_loop(&mut self) -> Result<()> {
		while let Some(item) = self.stream.next().await {
			let payload = match item {
				Ok(Message::Text(text)) => serde_json::from_str::<Value>(&text),
				Ok(Message::Binary(bytes)) => serde_json::from_slice::<Value>(&bytes),
				Ok(Message::Close(frame)) => {
					tracing::debug!(?frame, "Gateway closed the WebSocket");
					return Ok(());
				}
				// Ping/pong are handled by tungstenite itself.
				Ok(_) => continue,
				Err(e) => return Err(Error::TransportError(e.to_string())),
			};

			match payload {
				Ok(message) => {
					if self.tx.send(message).is_err() {
						return Ok(());
					}
				}
				Err(e) => {
					tracing::warn!(error = %e, "Dropping undecodable frame");
				}
			}
		}
		Ok(())
	}
}

impl TransportReceiver for WebSocketTransportReceiver {
	fn run(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(self.run_loop())
	}
}
