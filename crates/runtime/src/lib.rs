//! Console Runtime - transport, client, and connection lifecycle
//!
//! This crate provides the low-level runtime infrastructure for talking to a
//! remote display gateway:
//!
//! - **Transport**: Bidirectional communication over WebSocket or
//!   length-prefixed pipes
//! - **Lifecycle**: The session state machine driven by gateway
//!   notifications
//! - **Client**: The narrow send-side interface capability plugins drive
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   rdc-rs    │  Session handle, capability plugins
//! └──────┬──────┘
//!        │ observes state, drives ConsoleClient
//! ┌──────▼──────┐
//! │ rdc-runtime │  This crate
//! │  ┌────────┐ │
//! │  │ Ctrl   │ │  State machine + notification dispatch
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Client │ │  Outbound instruction queue
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Trans  │ │  WebSocket/pipe transport
//! │  └────────┘ │
//! └─────────────┘
//! ```
//!
//! # Decoupling via ConsoleClient
//!
//! Capabilities depend only on the [`ConsoleClient`] trait, never on the
//! transport. This keeps the composition layer independent of the wire and
//! lets tests substitute a recording client.

pub mod client;
pub mod error;
pub mod lifecycle;
pub mod transport;

// Re-export key types at crate root
pub use client::{ConsoleClient, RemoteClient};
pub use error::{Error, Result};
pub use lifecycle::ConnectionController;
pub use transport::{
	PipeTransport, PipeTransportReceiver, PipeTransportSender, Transport, TransportParts,
	TransportReceiver, WebSocketTransport, WebSocketTransportReceiver, WebSocketTransportSender,
};
