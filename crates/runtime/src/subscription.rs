//! Typed event subscriptions.

use std::marker::PhantomData;
use std::sync::Weak;
use std::time::Duration;

use hc_protocol::ProtocolEvent;

use crate::dispatcher::{EventDispatcher, EventStream, SinkId};
use crate::error::{Error, Result};

/// RAII handle receiving one event type.
///
/// Unregisters its sink on drop. Holds only a weak reference to the
/// dispatcher, so dropping it after the connection is gone is a no-op.
pub struct Subscription<E> {
	name: &'static str,
	sink: SinkId,
	stream: EventStream,
	dispatcher: Weak<EventDispatcher>,
	_event: PhantomData<fn() -> E>,
}

impl<E: ProtocolEvent> Subscription<E> {
	pub(crate) fn new(
		name: &'static str,
		sink: SinkId,
		stream: EventStream,
		dispatcher: Weak<EventDispatcher>,
	) -> Self {
		Self {
			name,
			sink,
			stream,
			dispatcher,
			_event: PhantomData,
		}
	}

	/// Next event, decoded. `None` once the connection has closed and the
	/// queue is drained.
	pub async fn next(&mut self) -> Option<Result<E>> {
		let event = self.stream.recv().await?;
		Some(event.params.decode().map_err(Error::from))
	}

	/// Like [`next`](Self::next) but bounded by `timeout`.
	pub async fn next_timeout(&mut self, timeout: Duration) -> Result<E> {
		match tokio::time::timeout(timeout, self.next()).await {
			Ok(Some(event)) => event,
			Ok(None) => Err(Error::ConnectionClosed(format!(
				"subscription to {} ended",
				self.name
			))),
			Err(_) => Err(Error::Timeout(format!(
				"no {} within {timeout:?}",
				self.name
			))),
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl<E> Drop for Subscription<E> {
	fn drop(&mut self) {
		if let Some(dispatcher) = self.dispatcher.upgrade() {
			dispatcher.remove_id(self.name, self.sink);
		}
	}
}
