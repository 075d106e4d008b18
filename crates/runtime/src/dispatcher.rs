//! Fan-out of inbound events to registered sinks.
//!
//! Sinks are bounded queues. Dispatch never waits on a consumer: when a sink's
//! queue is full the event is dropped for that sink only.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hc_protocol::EventMessage;
use hc_protocol::ProtocolEvent;
use hc_protocol::domains::inspector::TargetCrashed;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, trace, warn};

/// Unique identifier of a sink.
pub type SinkId = u64;

static NEXT_SINK_ID: AtomicU64 = AtomicU64::new(1);

fn next_sink_id() -> SinkId {
	NEXT_SINK_ID.fetch_add(1, Ordering::SeqCst)
}

/// Sending side of a bounded event queue.
///
/// Clones share identity: registering a clone of an already registered sink
/// is a no-op.
#[derive(Clone)]
pub struct EventSink {
	id: SinkId,
	tx: mpsc::Sender<EventMessage>,
}

impl EventSink {
	/// Creates a sink holding at most `capacity` undelivered events.
	pub fn channel(capacity: usize) -> (EventSink, EventStream) {
		let (tx, rx) = mpsc::channel(capacity.max(1));
		(
			EventSink {
				id: next_sink_id(),
				tx,
			},
			EventStream { rx },
		)
	}

	pub fn id(&self) -> SinkId {
		self.id
	}
}

impl PartialEq for EventSink {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for EventSink {}

impl std::fmt::Debug for EventSink {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventSink").field("id", &self.id).finish()
	}
}

/// Receiving side of an [`EventSink`].
#[derive(Debug)]
pub struct EventStream {
	rx: mpsc::Receiver<EventMessage>,
}

impl EventStream {
	/// Next event in wire order; `None` once the sink was removed from every
	/// name or the connection closed.
	pub async fn recv(&mut self) -> Option<EventMessage> {
		self.rx.recv().await
	}

	/// Returns a queued event without waiting.
	pub fn try_recv(&mut self) -> Option<EventMessage> {
		self.rx.try_recv().ok()
	}
}

/// Event name -> sinks, in registration order.
#[derive(Default)]
pub struct EventDispatcher {
	sinks: Mutex<HashMap<Arc<str>, IndexMap<SinkId, EventSink>>>,
}

impl EventDispatcher {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `sink` for `name`. Returns false if it was already registered.
	pub fn add_sink(&self, name: &str, sink: &EventSink) -> bool {
		let mut sinks = self.sinks.lock();
		let entry = sinks.entry(Arc::from(name)).or_default();
		if entry.contains_key(&sink.id) {
			return false;
		}
		entry.insert(sink.id, sink.clone());
		trace!(event = name, sink = sink.id, "sink added");
		true
	}

	/// Unregisters `sink` from `name`. Returns false if it was not registered.
	pub fn remove_sink(&self, name: &str, sink: &EventSink) -> bool {
		self.remove_id(name, sink.id)
	}

	pub(crate) fn remove_id(&self, name: &str, id: SinkId) -> bool {
		let mut sinks = self.sinks.lock();
		let Some(entry) = sinks.get_mut(name) else {
			return false;
		};
		let removed = entry.shift_remove(&id).is_some();
		if entry.is_empty() {
			sinks.remove(name);
		}
		removed
	}

	/// Delivers `event` to every sink registered for its name and returns how
	/// many accepted it.
	pub fn dispatch(&self, event: &EventMessage) -> usize {
		let name = event.method.as_ref();
		if name == TargetCrashed::NAME {
			error!(event = name, "target crashed");
		}

		let mut sinks = self.sinks.lock();
		let Some(entry) = sinks.get_mut(name) else {
			trace!(event = name, "no sinks");
			return 0;
		};

		let mut delivered = 0;
		entry.retain(|id, sink| match sink.tx.try_send(event.clone()) {
			Ok(()) => {
				delivered += 1;
				true
			}
			Err(TrySendError::Full(_)) => {
				warn!(event = name, sink = *id, "sink queue full, dropping event");
				true
			}
			Err(TrySendError::Closed(_)) => {
				trace!(event = name, sink = *id, "pruning closed sink");
				false
			}
		});
		if entry.is_empty() {
			sinks.remove(name);
		}
		delivered
	}

	/// Drops every sink, ending their streams once drained.
	pub fn clear(&self) {
		self.sinks.lock().clear();
	}

	/// Number of sinks registered for `name`.
	pub fn sink_count(&self, name: &str) -> usize {
		self.sinks.lock().get(name).map_or(0, IndexMap::len)
	}
}
