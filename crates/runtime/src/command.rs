//! Outgoing commands and their completion handlers.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use hc_protocol::RawPayload;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// Invoked exactly once with the command's outcome.
///
/// Runs on the connection's reader task (or a deadline task), so it must not
/// block.
pub type CompletionHandler = Box<dyn FnOnce(Result<RawPayload>) + Send + 'static>;

/// Identifier assigned to a command when it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub u64);

impl fmt::Display for CommandId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// A command waiting to be sent.
pub struct Command {
	pub(crate) method: String,
	pub(crate) params: Option<Value>,
	pub(crate) handler: CompletionHandler,
	pub(crate) timeout: Option<Option<Duration>>,
}

impl Command {
	/// Creates a command completing through `handler`.
	pub fn new(
		method: impl Into<String>,
		params: Option<Value>,
		handler: impl FnOnce(Result<RawPayload>) + Send + 'static,
	) -> Self {
		Self {
			method: method.into(),
			params,
			handler: Box::new(handler),
			timeout: None,
		}
	}

	/// Creates a command together with a future resolving to its outcome.
	pub fn with_reply(method: impl Into<String>, params: Option<Value>) -> (Self, Reply) {
		let (tx, rx) = oneshot::channel();
		let command = Self::new(method, params, move |outcome| {
			let _ = tx.send(outcome);
		});
		(command, Reply { rx })
	}

	/// Overrides the connection's default deadline; `None` waits until the
	/// connection closes.
	pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = Some(timeout);
		self
	}

	pub fn method(&self) -> &str {
		&self.method
	}
}

impl fmt::Debug for Command {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Command")
			.field("method", &self.method)
			.field("params", &self.params)
			.field("timeout", &self.timeout)
			.finish_non_exhaustive()
	}
}

/// Resolves once the command built by [`Command::with_reply`] completes.
#[must_use = "a reply does nothing unless awaited"]
pub struct Reply {
	rx: oneshot::Receiver<Result<RawPayload>>,
}

impl Future for Reply {
	type Output = Result<RawPayload>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.rx)
			.poll(cx)
			.map(|result| result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn reply_receives_outcome() {
		let (command, reply) = Command::with_reply("Page.enable", None);
		(command.handler)(Ok(RawPayload::from_json(r#"{"ok":true}"#).unwrap()));
		assert_eq!(reply.await.unwrap().get(), r#"{"ok":true}"#);
	}

	#[tokio::test]
	async fn dropped_handler_reports_channel_closed() {
		let (command, reply) = Command::with_reply("Page.enable", None);
		drop(command);
		assert!(matches!(reply.await, Err(Error::ChannelClosed)));
	}

	#[test]
	fn timeout_override_is_recorded() {
		let command = Command::new("Runtime.evaluate", None, |_| {}).timeout(None);
		assert_eq!(command.timeout, Some(None));
		assert_eq!(command.method(), "Runtime.evaluate");
	}
}
