//! Error types for the protocol runtime.

use hc_protocol::RemoteError;
use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the protocol runtime.
#[derive(Debug, Error)]
pub enum Error {
	/// Failed to launch the browser server process.
	#[error("Failed to launch browser: {0}")]
	LaunchFailed(String),

	/// Failed to reach or handshake with the browser.
	#[error("Failed to connect to browser: {0}")]
	ConnectionFailed(String),

	/// Transport-level error (pipe or WebSocket).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// The remote peer answered a command with an error.
	#[error("Remote error: {0}")]
	Remote(#[from] RemoteError),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// HTTP error during discovery.
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	/// Write deadline or command deadline exceeded.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// The connection is gone; no further responses will arrive.
	#[error("Connection closed: {0}")]
	ConnectionClosed(String),

	/// A completion handler was dropped without being invoked.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,
}

impl Error {
	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}

	/// Returns true if the connection is gone.
	pub fn is_connection_closed(&self) -> bool {
		matches!(self, Error::ConnectionClosed(_) | Error::ChannelClosed)
	}

	/// Returns the remote error if the peer rejected the command.
	pub fn remote(&self) -> Option<&RemoteError> {
		match self {
			Error::Remote(remote) => Some(remote),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn predicates() {
		assert!(Error::Timeout("x".into()).is_timeout());
		assert!(Error::ConnectionClosed("eof".into()).is_connection_closed());
		assert!(Error::ChannelClosed.is_connection_closed());
		assert!(!Error::TransportError("x".into()).is_connection_closed());
	}

	#[test]
	fn remote_error_is_exposed() {
		let err = Error::from(RemoteError {
			code: -32000,
			message: "Cannot navigate to invalid URL".into(),
			data: None,
		});
		assert_eq!(err.remote().map(|r| r.code), Some(-32000));
		assert_eq!(
			err.to_string(),
			"Remote error: Cannot navigate to invalid URL (code -32000)"
		);
	}
}
