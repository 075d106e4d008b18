//! Byte transports underneath a [`Connection`](crate::Connection).
//!
//! A transport moves complete messages. It is split into a sender, used by
//! callers under the connection's command lock, and a receiver, owned by the
//! connection's reader task.
//!
//! - [`PipeTransport`] - any `AsyncRead`/`AsyncWrite` pair, NUL-delimited
//! - [`WebSocketTransport`] - one message per WebSocket frame

use futures_util::future::BoxFuture;

use crate::error::Result;

mod pipe;
mod websocket;

pub use pipe::{MessageFramer, PipeTransport, PipeTransportSender};
pub use websocket::{WebSocketTransport, WebSocketTransportReceiver, WebSocketTransportSender};

/// Sending half of a transport.
pub trait TransportSender: Send {
	/// Writes one complete message.
	fn send(&mut self, message: Vec<u8>) -> BoxFuture<'_, Result<()>>;

	/// Closes the outbound direction.
	fn close(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Receiving half of a transport.
pub trait TransportReceiver: Send {
	/// Returns the next complete message, `Ok(None)` once the peer has closed
	/// cleanly, or an error when the stream broke.
	fn recv(&mut self) -> BoxFuture<'_, Result<Option<Vec<u8>>>>;
}

/// Both halves of a transport, ready to hand to a connection.
pub struct TransportParts {
	pub sender: Box<dyn TransportSender>,
	pub receiver: Box<dyn TransportReceiver>,
}
