//! In-process stand-in for a browser endpoint speaking NUL-delimited JSON.

use std::sync::Arc;

use hc_runtime::{
	Connection, ConnectionOptions, MessageFramer, PipeTransport, PipeTransportSender,
	TransportSender,
};
use serde_json::Value;
use tokio::io::{DuplexStream, duplex};

pub struct FakePeer {
	commands: MessageFramer<DuplexStream>,
	out: PipeTransportSender<DuplexStream>,
}

impl FakePeer {
	/// Connects a fresh [`Connection`] to a fake peer.
	pub fn connect(options: ConnectionOptions) -> (Arc<Connection>, FakePeer) {
		let (client_write, peer_read) = duplex(256 * 1024);
		let (peer_write, client_read) = duplex(256 * 1024);

		let transport = PipeTransport::new(client_write, client_read);
		let connection = Connection::new(transport.into_parts(), options);

		let peer = FakePeer {
			commands: MessageFramer::new(peer_read),
			out: PipeTransportSender::new(peer_write),
		};
		(connection, peer)
	}

	/// Reads the next command the client wrote.
	pub async fn next_command(&mut self) -> Value {
		let bytes = self
			.commands
			.next_message()
			.await
			.expect("read command")
			.expect("client closed the pipe");
		serde_json::from_slice(&bytes).expect("command is JSON")
	}

	pub async fn send(&mut self, message: Value) {
		self.send_raw(serde_json::to_vec(&message).unwrap()).await;
	}

	pub async fn send_raw(&mut self, bytes: Vec<u8>) {
		self.out.send(bytes).await.expect("write to client");
	}

	pub async fn respond(&mut self, id: &Value, result: Value) {
		self.send(serde_json::json!({"id": id, "result": result})).await;
	}

	pub async fn event(&mut self, method: &str, params: Value) {
		self.send(serde_json::json!({"method": method, "params": params}))
			.await;
	}

	/// Closes both directions, as a crashed browser would.
	pub async fn hang_up(mut self) {
		let _ = self.out.close().await;
	}
}
