//! Connection tuning knobs.

use std::time::Duration;

use tracing::warn;

/// Default bound on a single transport write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
/// Default deadline for a command's response.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
/// Default per-sink event queue depth.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Options applied to every command and subscription of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
	/// Bound on one outbound write; a slower write fails the send.
	pub write_timeout: Duration,
	/// Default response deadline. `None` waits until the connection closes.
	pub command_timeout: Option<Duration>,
	/// Queue depth of sinks created through `Connection::subscribe`.
	pub event_capacity: usize,
}

impl Default for ConnectionOptions {
	fn default() -> Self {
		Self {
			write_timeout: DEFAULT_WRITE_TIMEOUT,
			command_timeout: Some(DEFAULT_COMMAND_TIMEOUT),
			event_capacity: DEFAULT_EVENT_CAPACITY,
		}
	}
}

impl ConnectionOptions {
	/// Defaults overridden by `HC_WRITE_TIMEOUT_MS`, `HC_COMMAND_TIMEOUT_MS`
	/// (`0` disables the deadline) and `HC_EVENT_CAPACITY`.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let mut options = Self::default();

		if let Some(ms) = parse_var::<u64>(&lookup, "HC_WRITE_TIMEOUT_MS") {
			options.write_timeout = Duration::from_millis(ms);
		}
		if let Some(ms) = parse_var::<u64>(&lookup, "HC_COMMAND_TIMEOUT_MS") {
			options.command_timeout = (ms > 0).then(|| Duration::from_millis(ms));
		}
		if let Some(capacity) = parse_var::<usize>(&lookup, "HC_EVENT_CAPACITY") {
			options.event_capacity = capacity.max(1);
		}

		options
	}

	pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
		self.write_timeout = timeout;
		self
	}

	pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.command_timeout = timeout;
		self
	}

	pub fn with_event_capacity(mut self, capacity: usize) -> Self {
		self.event_capacity = capacity.max(1);
		self
	}
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
	let raw = lookup(key)?;
	match raw.trim().parse() {
		Ok(value) => Some(value),
		Err(_) => {
			warn!(key, value = %raw, "ignoring unparsable environment override");
			None
		}
	}
}
