//! Error types for the console runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the console runtime.
#[derive(Debug, Error)]
pub enum Error {
	/// Failed to establish the gateway connection.
	#[error("Failed to connect to console gateway: {0}")]
	ConnectionFailed(String),

	/// Transport-level error (socket communication).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Protocol-level error (malformed gateway traffic).
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// Error notification from the gateway with full context.
	#[error("Gateway error{}: {message}", code.map(|c| format!(" ({c})")).unwrap_or_default())]
	Gateway {
		/// Human-readable error message.
		message: String,
		/// Numeric gateway status code, if the gateway sent one.
		code: Option<u32>,
	},

	/// Operation attempted on a session that already reached a terminal state.
	#[error("Session closed: {context}")]
	SessionClosed { context: String },

	/// A capability's teardown failed; logged per capability so one failure
	/// never blocks the rest of the teardown.
	#[error("Teardown failed for {capability} capability: {message}")]
	Teardown {
		capability: &'static str,
		message: String,
	},

	/// A plugin was composed before the capability it depends on.
	#[error("Plugin '{plugin}' requires the {requires} capability to be installed first")]
	MissingCapability {
		plugin: &'static str,
		requires: &'static str,
	},

	/// Channel closed unexpectedly.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// Invalid argument provided to a method.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// Timeout waiting for an operation.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns the gateway status code if this is a gateway error.
	pub fn gateway_code(&self) -> Option<u32> {
		match self {
			Error::Gateway { code, .. } => *code,
			_ => None,
		}
	}

	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}

	/// Returns true if this error means the session is gone.
	pub fn is_session_closed(&self) -> bool {
		matches!(self, Error::SessionClosed { .. } | Error::ChannelClosed)
	}
}
