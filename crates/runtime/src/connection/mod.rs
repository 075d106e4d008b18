//! Command/response connection to a DevTools endpoint.
//!
//! A [`Connection`] owns one transport. Callers write commands through
//! [`Connection::send`] (or the awaiting helpers [`Connection::call`] and
//! [`Connection::call_raw`]); a single reader task decodes every inbound
//! message and routes it:
//!
//! - responses go to the pending command with the same id
//! - events go to the [`EventDispatcher`]
//!
//! # Command flow
//!
//! 1. The caller takes the command lock
//! 2. The next id is allocated and the `{id, method, params}` frame is written
//! 3. Only after a successful write is the command registered as pending
//! 4. The reader takes the entry out of the table when the response arrives
//!    and runs its completion handler outside the lock
//!
//! A command that is not answered within its deadline completes with
//! [`Error::Timeout`]. When the transport closes, every pending command
//! completes with [`Error::ConnectionClosed`] and later sends fail with the
//! same error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use hc_protocol::{CommandRequest, Envelope, Method, ProtocolEvent, RawPayload, Response};
use parking_lot::Mutex as ParkingLotMutex;
use serde_json::Value;
use tokio::sync::Mutex as TokioMutex;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, trace, warn};

use crate::command::{Command, CommandId};
use crate::correlator::{Correlator, PendingCommand};
use crate::dispatcher::{EventDispatcher, EventSink};
use crate::error::{Error, Result};
use crate::options::ConnectionOptions;
use crate::subscription::Subscription;
use crate::transport::{TransportParts, TransportReceiver, TransportSender, WebSocketTransport};

/// Everything guarded by the command lock.
struct CommandLane {
	correlator: Correlator,
	sender: Box<dyn TransportSender>,
}

/// A live protocol connection.
///
/// Always handled through an `Arc`; the reader task keeps only a weak
/// reference, so dropping the last handle stops it.
pub struct Connection {
	commands: TokioMutex<CommandLane>,
	events: Arc<EventDispatcher>,
	options: ConnectionOptions,
	closed: AtomicBool,
	close_reason: ParkingLotMutex<Option<String>>,
	reader: ParkingLotMutex<Option<JoinHandle<()>>>,
}

impl Connection {
	/// Wraps `parts` and starts the reader task.
	///
	/// Must be called within a Tokio runtime.
	pub fn new(parts: TransportParts, options: ConnectionOptions) -> Arc<Self> {
		let TransportParts { sender, receiver } = parts;

		let connection = Arc::new(Self {
			commands: TokioMutex::new(CommandLane {
				correlator: Correlator::new(),
				sender,
			}),
			events: Arc::new(EventDispatcher::new()),
			options,
			closed: AtomicBool::new(false),
			close_reason: ParkingLotMutex::new(None),
			reader: ParkingLotMutex::new(None),
		});

		let reader = tokio::spawn(read_loop(Arc::downgrade(&connection), receiver));
		*connection.reader.lock() = Some(reader);

		connection
	}

	/// Opens a WebSocket to `url` and wraps it.
	pub async fn connect(url: &str, options: ConnectionOptions) -> Result<Arc<Self>> {
		let parts = WebSocketTransport::connect(url).await?;
		Ok(Self::new(parts, options))
	}

	pub fn options(&self) -> &ConnectionOptions {
		&self.options
	}

	/// Writes `command` and registers it as pending.
	///
	/// Returns once the frame is written. The command's handler runs later,
	/// exactly once. If serialization or the write fails the handler is
	/// dropped without being called and the error is returned here.
	///
	/// A failed or timed-out write may leave a partial frame on the stream,
	/// so it closes the connection: pending commands fail with
	/// [`Error::ConnectionClosed`], as do later sends.
	pub async fn send(self: &Arc<Self>, command: Command) -> Result<CommandId> {
		let Command {
			method,
			params,
			handler,
			timeout,
		} = command;
		let deadline = timeout.unwrap_or(self.options.command_timeout);

		let mut lane = self.commands.lock().await;
		if lane.correlator.is_closed() {
			return Err(self.closed_error());
		}

		let id = lane.correlator.next_id();
		let frame = CommandRequest {
			id: id.0,
			method: &method,
			params: params.as_ref(),
		}
		.to_vec()?;

		trace!(%id, method = %method, len = frame.len(), "writing command");
		let written =
			match tokio::time::timeout(self.options.write_timeout, lane.sender.send(frame)).await {
				Ok(written) => written,
				Err(_) => Err(Error::Timeout(format!(
					"writing {method} (id {id}) took longer than {:?}",
					self.options.write_timeout
				))),
			};
		if let Err(e) = written {
			// Part of the frame may already be on the stream; nothing written
			// after it could be parsed by the peer.
			warn!(%id, method = %method, error = %e, "command write failed, abandoning transport");
			let reason = format!("transport abandoned after failed write: {e}");
			let drained = self.close_lane(&mut lane, &reason);
			drop(lane);
			self.stop_reader();
			if let Some(drained) = drained {
				self.fail_pending(&reason, drained);
			}
			return Err(e);
		}

		let deadline = deadline.map(|after| self.spawn_deadline(id, after));
		lane.correlator
			.register(id, PendingCommand::new(method, handler, deadline));
		Ok(id)
	}

	/// Sends a typed command and waits for its decoded result.
	pub async fn call<M: Method>(self: &Arc<Self>, params: M::Params) -> Result<M::Returns> {
		let params = serde_json::to_value(params)?;
		let params = if params.is_null() { None } else { Some(params) };
		let raw = self.call_raw(M::NAME, params).await?;
		Ok(raw.decode()?)
	}

	/// Sends `method` with raw parameters and waits for the raw result.
	pub async fn call_raw(
		self: &Arc<Self>,
		method: &str,
		params: Option<Value>,
	) -> Result<RawPayload> {
		let (command, reply) = Command::with_reply(method, params);
		self.send(command).await?;
		reply.await
	}

	/// Subscribes to a typed event with the connection's default capacity.
	pub fn subscribe<E: ProtocolEvent>(&self) -> Subscription<E> {
		self.subscribe_with_capacity(self.options.event_capacity)
	}

	/// Subscribes to a typed event with a queue of `capacity` events.
	pub fn subscribe_with_capacity<E: ProtocolEvent>(&self, capacity: usize) -> Subscription<E> {
		let (sink, stream) = EventSink::channel(capacity);
		self.add_sink(E::NAME, &sink);
		Subscription::new(E::NAME, sink.id(), stream, Arc::downgrade(&self.events))
	}

	/// Registers a raw sink for `name`. Returns false if already registered.
	///
	/// A sink added after the connection closed is dropped immediately.
	pub fn add_sink(&self, name: &str, sink: &EventSink) -> bool {
		let added = self.events.add_sink(name, sink);
		if self.is_closed() {
			self.events.remove_sink(name, sink);
			return false;
		}
		added
	}

	pub fn remove_sink(&self, name: &str, sink: &EventSink) -> bool {
		self.events.remove_sink(name, sink)
	}

	/// Number of commands written and not yet completed.
	pub async fn pending_count(&self) -> usize {
		self.commands.lock().await.correlator.len()
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	/// Closes the transport and fails everything still pending.
	///
	/// The transport close is bounded by the write timeout; the connection
	/// is shut down whether or not it completes.
	pub async fn close(&self) -> Result<()> {
		let reason = "closed by client";
		let (drained, result) = {
			let mut lane = self.commands.lock().await;
			let Some(drained) = self.close_lane(&mut lane, reason) else {
				return Ok(());
			};
			let closed =
				tokio::time::timeout(self.options.write_timeout, lane.sender.close()).await;
			let result = closed.unwrap_or_else(|_| {
				Err(Error::Timeout(format!(
					"closing the transport took longer than {:?}",
					self.options.write_timeout
				)))
			});
			(drained, result)
		};

		self.stop_reader();
		self.fail_pending(reason, drained);
		result
	}

	fn spawn_deadline(self: &Arc<Self>, id: CommandId, after: Duration) -> AbortHandle {
		let connection = Arc::downgrade(self);
		tokio::spawn(async move {
			tokio::time::sleep(after).await;
			if let Some(connection) = connection.upgrade() {
				connection.expire(id, after).await;
			}
		})
		.abort_handle()
	}

	async fn expire(&self, id: CommandId, after: Duration) {
		let pending = self.commands.lock().await.correlator.take(id);
		if let Some(command) = pending {
			let message = format!("{} (id {id}) got no response within {after:?}", command.method);
			warn!(%id, method = %command.method, "command timed out");
			command.complete(Err(Error::Timeout(message)));
		}
	}

	async fn route(&self, message: &[u8]) {
		match Envelope::decode(message) {
			Ok(Envelope::Response(response)) => self.handle_response(response).await,
			Ok(Envelope::Event(event)) => {
				trace!(event = %event.method, "event received");
				self.events.dispatch(&event);
			}
			Err(e) => {
				warn!(error = %e, len = message.len(), "dropping undecodable message");
			}
		}
	}

	async fn handle_response(&self, response: Response) {
		let id = CommandId(response.id);
		let pending = self.commands.lock().await.correlator.take(id);
		match pending {
			Some(command) => {
				debug!(
					%id,
					method = %command.method,
					ok = response.outcome.is_ok(),
					"response received"
				);
				command.complete(response.outcome.map_err(Error::from));
			}
			None => warn!(%id, "response for unknown command id, dropping"),
		}
	}

	async fn shut_down(&self, reason: String) {
		let drained = {
			let mut lane = self.commands.lock().await;
			self.close_lane(&mut lane, &reason)
		};
		if let Some(drained) = drained {
			self.fail_pending(&reason, drained);
		}
	}

	/// Marks the lane closed and takes every pending command out of it.
	///
	/// Returns `None` if it was already closed.
	fn close_lane(
		&self,
		lane: &mut CommandLane,
		reason: &str,
	) -> Option<Vec<(CommandId, PendingCommand)>> {
		if lane.correlator.is_closed() {
			return None;
		}
		*self.close_reason.lock() = Some(reason.to_string());
		let drained = lane.correlator.close();
		self.closed.store(true, Ordering::SeqCst);
		Some(drained)
	}

	fn fail_pending(&self, reason: &str, drained: Vec<(CommandId, PendingCommand)>) {
		self.events.clear();
		debug!(reason, pending = drained.len(), "connection shut down");
		for (id, command) in drained {
			trace!(%id, method = %command.method, "failing pending command");
			command.complete(Err(Error::ConnectionClosed(reason.to_string())));
		}
	}

	fn stop_reader(&self) {
		if let Some(reader) = self.reader.lock().take() {
			reader.abort();
		}
	}

	fn closed_error(&self) -> Error {
		let reason = self
			.close_reason
			.lock()
			.clone()
			.unwrap_or_else(|| "connection closed".to_string());
		Error::ConnectionClosed(reason)
	}
}

impl Drop for Connection {
	fn drop(&mut self) {
		if let Some(reader) = self.reader.get_mut().take() {
			reader.abort();
		}
	}
}

async fn read_loop(weak: Weak<Connection>, mut receiver: Box<dyn TransportReceiver>) {
	let reason = loop {
		let message = receiver.recv().await;
		let Some(connection) = weak.upgrade() else {
			return;
		};
		match message {
			Ok(Some(bytes)) => connection.route(&bytes).await,
			Ok(None) => break "peer closed the connection".to_string(),
			Err(e) => {
				error!(error = %e, "transport read failed");
				break e.to_string();
			}
		}
	};

	if let Some(connection) = weak.upgrade() {
		connection.shut_down(reason).await;
	}
}
