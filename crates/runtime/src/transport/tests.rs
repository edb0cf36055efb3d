use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::*;
use crate::error::Error;

#[test]
fn test_length_prefix_encoding() {
	let length: u32 = 1234;
	let bytes = length.to_le_bytes();

	// Verify little-endian byte order
	assert_eq!(bytes[0], (length & 0xFF) as u8);
	assert_eq!(bytes[1], ((length >> 8) & 0xFF) as u8);
	assert_eq!(bytes[2], ((length >> 16) & 0xFF) as u8);
	assert_eq!(bytes[3], ((length >> 24) & 0xFF) as u8);

	// Verify round-trip
	assert_eq!(u32::from_le_bytes(bytes), length);
}

#[test]
fn test_message_framing_format() {
	// Frame should be: [length (4 bytes LE)][JSON bytes]
	let message = serde_json::json!({"type": "key", "pressed": true, "keysym": 0xff0d});
	let json_bytes = serde_json::to_vec(&message).unwrap();
	let length = json_bytes.len() as u32;
	let length_bytes = length.to_le_bytes();

	let mut frame = Vec::new();
	frame.extend_from_slice(&length_bytes);
	frame.extend_from_slice(&json_bytes);

	assert_eq!(frame.len(), 4 + json_bytes.len());
	assert_eq!(&frame[0..4], &length_bytes);
	assert_eq!(&frame[4..], &json_bytes);
}

#[tokio::test]
async fn test_send_message() {
	// Two separate duplex pipes: one per direction.
	let (outbound_read, outbound_write) = tokio::io::duplex(1024);
	let (inbound_read, _inbound_write) = tokio::io::duplex(1024);

	let (transport, _rx) = PipeTransport::new(outbound_write, inbound_read);
	let (mut sender, _receiver) = transport.into_parts();

	let test_message = serde_json::json!({
		"type": "mouse",
		"x": 10,
		"y": 20,
		"buttons": 1
	});

	sender.send(test_message.clone()).await.unwrap();

	// Read what the transport wrote from our end of the pipe.
	let (mut read_half, _write_half) = tokio::io::split(outbound_read);
	let mut len_buf = [0u8; 4];
	read_half.read_exact(&mut len_buf).await.unwrap();
	let length = u32::from_le_bytes(len_buf) as usize;

	let mut msg_buf = vec![0u8; length];
	read_half.read_exact(&mut msg_buf).await.unwrap();

	let received: serde_json::Value = serde_json::from_slice(&msg_buf).unwrap();
	assert_eq!(received, test_message);
}

#[tokio::test]
async fn test_multiple_messages_in_sequence() {
	let (_outbound_read, outbound_write) = tokio::io::duplex(4096);
	let (inbound_read, mut inbound_write) = tokio::io::duplex(4096);

	let (mut transport, mut rx) = PipeTransport::new(outbound_write, inbound_read);

	let read_task = tokio::spawn(async move { transport.run().await });

	// Simulate the gateway sending a notification sequence.
	let messages = vec![
		serde_json::json!({"type": "ready", "connection": "c1"}),
		serde_json::json!({"type": "clipboard", "data": "hello"}),
		serde_json::json!({"type": "disconnect", "reason": "shutdown"}),
	];

	for msg in &messages {
		let json_bytes = serde_json::to_vec(msg).unwrap();
		let length = json_bytes.len() as u32;

		inbound_write.write_all(&length.to_le_bytes()).await.unwrap();
		inbound_write.write_all(&json_bytes).await.unwrap();
	}
	inbound_write.flush().await.unwrap();

	for expected in &messages {
		let received = rx.recv().await.unwrap();
		assert_eq!(&received, expected);
	}

	drop(inbound_write);
	drop(rx);
	let result = read_task.await.unwrap();
	assert!(result.is_ok());
}

#[tokio::test]
async fn test_clean_eof_is_orderly_close() {
	let (_outbound_read, outbound_write) = tokio::io::duplex(1024);
	let (inbound_read, inbound_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(outbound_write, inbound_read);

	// Closing the write end with no pending frame must not be an error.
	drop(inbound_write);
	assert!(transport.run().await.is_ok());
}

#[tokio::test]
async fn test_oversized_frame_rejected() {
	let (_outbound_read, outbound_write) = tokio::io::duplex(1024);
	let (inbound_read, mut inbound_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(outbound_write, inbound_read);

	let bogus_length: u32 = u32::MAX;
	inbound_write
		.write_all(&bogus_length.to_le_bytes())
		.await
		.unwrap();
	inbound_write.flush().await.unwrap();

	let result = transport.run().await;
	assert!(matches!(result, Err(Error::ProtocolError(_))));
}
