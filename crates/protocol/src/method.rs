//! Typed descriptions of protocol commands and events.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A protocol command with typed parameters and result.
pub trait Method {
	/// Namespaced method name, e.g. `Page.navigate`.
	const NAME: &'static str;
	/// Parameters; a value serializing to `null` is omitted from the frame.
	type Params: Serialize + Send;
	/// Decoded result.
	type Returns: DeserializeOwned;
}

/// A protocol event with typed parameters.
pub trait ProtocolEvent: DeserializeOwned + Send + 'static {
	/// Namespaced event name, e.g. `Page.loadEventFired`.
	const NAME: &'static str;
}

/// Parameters of a command that takes none.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoParams;

/// Result of a command whose answer carries nothing of interest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Void {}
