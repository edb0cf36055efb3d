//! Session identity, connection state, and gateway message shapes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Console transport kind exposed by the managed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleKind {
	Vnc,
	Spice,
	Vmrc,
}

impl ConsoleKind {
	/// Returns the lowercase wire name for this kind.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Vnc => "vnc",
			Self::Spice => "spice",
			Self::Vmrc => "vmrc",
		}
	}
}

impl fmt::Display for ConsoleKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ConsoleKind {
	type Err = ParseSessionIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"vnc" => Ok(Self::Vnc),
			"spice" => Ok(Self::Spice),
			"vmrc" => Ok(Self::Vmrc),
			other => Err(ParseSessionIdError::UnknownKind(other.to_string())),
		}
	}
}

/// Composite identifier for one console session: resource id + console kind.
///
/// Rendered as `"<resource>-<kind>"`, e.g. `"6-vnc"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId {
	resource: u32,
	kind: ConsoleKind,
}

impl SessionId {
	/// Creates a session id for the given resource and console kind.
	pub fn new(resource: u32, kind: ConsoleKind) -> Self {
		Self { resource, kind }
	}

	/// Returns the numeric resource id.
	pub fn resource(&self) -> u32 {
		self.resource
	}

	/// Returns the console kind.
	pub fn kind(&self) -> ConsoleKind {
		self.kind
	}
}

impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}-{}", self.resource, self.kind)
	}
}

/// Error parsing a [`SessionId`] from its `"<resource>-<kind>"` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseSessionIdError {
	/// The string had no `-` separator.
	MissingSeparator,
	/// The resource component was not a number.
	InvalidResource(String),
	/// The kind component was not a known console kind.
	UnknownKind(String),
}

impl fmt::Display for ParseSessionIdError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::MissingSeparator => write!(f, "missing '-' separator in session id"),
			Self::InvalidResource(s) => write!(f, "invalid resource id: '{s}'"),
			Self::UnknownKind(s) => write!(f, "unknown console kind: '{s}'"),
		}
	}
}

impl std::error::Error for ParseSessionIdError {}

impl FromStr for SessionId {
	type Err = ParseSessionIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (resource, kind) = s
			.split_once('-')
			.ok_or(ParseSessionIdError::MissingSeparator)?;
		let resource = resource
			.parse::<u32>()
			.map_err(|_| ParseSessionIdError::InvalidResource(resource.to_string()))?;
		Ok(Self::new(resource, kind.parse()?))
	}
}

/// Connection state of a console session.
///
/// `Disconnected` and `Errored` are terminal for a session instance; a new
/// connect constructs a fresh session rather than resurrecting the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
	Idle,
	Connecting,
	Connected,
	Disconnected,
	Errored,
}

impl SessionState {
	/// Returns `true` once the gateway has acknowledged the connection.
	///
	/// This is the activation signal capability plugins wait on.
	pub fn is_connected(&self) -> bool {
		matches!(self, Self::Connected)
	}

	/// Returns `true` for the terminal states.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Disconnected | Self::Errored)
	}
}

impl fmt::Display for SessionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Self::Idle => "idle",
			Self::Connecting => "connecting",
			Self::Connected => "connected",
			Self::Disconnected => "disconnected",
			Self::Errored => "errored",
		};
		f.write_str(s)
	}
}

/// Instruction sent to the gateway on behalf of the local user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Instruction {
	/// Key press or release, X11 keysym encoded.
	Key { pressed: bool, keysym: u32 },
	/// Full pointer state: position in physical pixels plus button mask.
	Mouse { x: i32, y: i32, buttons: u8 },
	/// Local clipboard contents pushed to the remote side.
	Clipboard { data: String },
	/// Display surface resized; physical pixel dimensions.
	Size { width: u32, height: u32 },
	/// Orderly disconnect request.
	Disconnect,
}

/// Notification received from the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Notification {
	/// Connection established end-to-end; the session may go interactive.
	Ready {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		connection: Option<String>,
	},
	/// Gateway closed the connection.
	Disconnect {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		reason: Option<String>,
	},
	/// Gateway-side failure.
	Error {
		message: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		code: Option<u32>,
	},
	/// Remote clipboard contents pushed to the local side.
	Clipboard { data: String },
}

/// Discriminated union of inbound gateway messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
	/// A known notification.
	Notification(Notification),
	/// Unknown message type (forward-compatible catch-all).
	Unknown(Value),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn session_id_round_trip() {
		let id: SessionId = "6-vnc".parse().unwrap();
		assert_eq!(id.resource(), 6);
		assert_eq!(id.kind(), ConsoleKind::Vnc);
		assert_eq!(id.to_string(), "6-vnc");
	}

	#[test]
	fn session_id_rejects_bad_input() {
		assert_eq!(
			"6vnc".parse::<SessionId>(),
			Err(ParseSessionIdError::MissingSeparator)
		);
		assert_eq!(
			"x-vnc".parse::<SessionId>(),
			Err(ParseSessionIdError::InvalidResource("x".to_string()))
		);
		assert_eq!(
			"6-rdp".parse::<SessionId>(),
			Err(ParseSessionIdError::UnknownKind("rdp".to_string()))
		);
	}

	#[test]
	fn instruction_wire_shape() {
		let key = Instruction::Key {
			pressed: true,
			keysym: 0xff0d,
		};
		let json = serde_json::to_value(&key).unwrap();
		assert_eq!(json["type"], "key");
		assert_eq!(json["pressed"], true);
		assert_eq!(json["keysym"], 0xff0d);
	}

	#[test]
	fn notification_parses_ready() {
		let msg: ServerMessage =
			serde_json::from_str(r#"{"type": "ready", "connection": "abc"}"#).unwrap();
		match msg {
			ServerMessage::Notification(Notification::Ready { connection }) => {
				assert_eq!(connection.as_deref(), Some("abc"));
			}
			other => panic!("expected Ready, got {other:?}"),
		}
	}

	#[test]
	fn unknown_message_is_forward_compatible() {
		let msg: ServerMessage =
			serde_json::from_str(r#"{"type": "statistics", "fps": 30}"#).unwrap();
		assert!(matches!(msg, ServerMessage::Unknown(_)));
	}

	#[test]
	fn terminal_states() {
		assert!(SessionState::Disconnected.is_terminal());
		assert!(SessionState::Errored.is_terminal());
		assert!(!SessionState::Connecting.is_terminal());
		assert!(SessionState::Connected.is_connected());
		assert!(!SessionState::Connecting.is_connected());
	}
}
