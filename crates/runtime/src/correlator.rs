//! Pending command table.
//!
//! The table is plain data; the connection keeps it under its command lock so
//! that id allocation, the write and registration happen as one step.

use std::collections::HashMap;

use hc_protocol::RawPayload;
use tokio::task::AbortHandle;

use crate::command::{CommandId, CompletionHandler};
use crate::error::Result;

/// A written command awaiting its response.
pub(crate) struct PendingCommand {
	pub(crate) method: String,
	handler: CompletionHandler,
	deadline: Option<AbortHandle>,
}

impl PendingCommand {
	pub(crate) fn new(
		method: String,
		handler: CompletionHandler,
		deadline: Option<AbortHandle>,
	) -> Self {
		Self {
			method,
			handler,
			deadline,
		}
	}

	/// Cancels the deadline and runs the handler.
	pub(crate) fn complete(self, outcome: Result<RawPayload>) {
		if let Some(deadline) = self.deadline {
			deadline.abort();
		}
		(self.handler)(outcome);
	}
}

/// Allocates ids and tracks in-flight commands.
#[derive(Default)]
pub(crate) struct Correlator {
	last_id: u64,
	pending: HashMap<CommandId, PendingCommand>,
	closed: bool,
}

impl Correlator {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Returns the next id. Ids start at 1 and are never reused.
	pub(crate) fn next_id(&mut self) -> CommandId {
		self.last_id += 1;
		CommandId(self.last_id)
	}

	pub(crate) fn register(&mut self, id: CommandId, command: PendingCommand) {
		self.pending.insert(id, command);
	}

	/// Removes and returns the command waiting on `id`.
	pub(crate) fn take(&mut self, id: CommandId) -> Option<PendingCommand> {
		self.pending.remove(&id)
	}

	/// Marks the table closed and hands back everything still pending.
	pub(crate) fn close(&mut self) -> Vec<(CommandId, PendingCommand)> {
		self.closed = true;
		self.pending.drain().collect()
	}

	pub(crate) fn is_closed(&self) -> bool {
		self.closed
	}

	pub(crate) fn len(&self) -> usize {
		self.pending.len()
	}
}
