//! Outbound command frames and inbound message envelopes.
//!
//! Every inbound message is exactly one of two shapes:
//!
//! - a **response** carries a positive `id` plus either `result` or `error`
//! - an **event** carries `method` and `params` and no usable `id`
//!
//! Payloads are kept as raw JSON ([`RawPayload`]) so that the reader never pays
//! for decoding a result nobody asked for, and so that an unknown or evolving
//! result shape can never fail the envelope itself.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;
use thiserror::Error;

/// Outbound command frame: `{"id": .., "method": .., "params": ..}`.
#[derive(Debug, Serialize)]
pub struct CommandRequest<'a> {
	/// Correlation id, unique per connection.
	pub id: u64,
	/// Namespaced method name, e.g. `Page.navigate`.
	pub method: &'a str,
	/// Parameters, omitted from the frame when absent.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub params: Option<&'a Value>,
}

impl CommandRequest<'_> {
	/// Serializes the frame to JSON bytes.
	pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
		serde_json::to_vec(self)
	}
}

/// Undecoded JSON payload shared between every consumer of a message.
///
/// An absent payload reads as `{}` so that parameterless events and
/// result-less commands decode into empty structs.
#[derive(Clone, Default)]
pub struct RawPayload(Option<Arc<RawValue>>);

impl RawPayload {
	const EMPTY: &'static str = "{}";

	/// Wraps an optional raw value taken off the wire.
	pub fn new(raw: Option<Box<RawValue>>) -> Self {
		Self(raw.map(Arc::from))
	}

	/// Builds a payload from a JSON string, validating it.
	pub fn from_json(json: impl Into<String>) -> serde_json::Result<Self> {
		RawValue::from_string(json.into()).map(|raw| Self(Some(Arc::from(raw))))
	}

	/// Returns the raw JSON text.
	pub fn get(&self) -> &str {
		self.0.as_deref().map_or(Self::EMPTY, RawValue::get)
	}

	/// Returns true when the message carried no payload at all.
	pub fn is_absent(&self) -> bool {
		self.0.is_none()
	}

	/// Decodes the payload into a typed value.
	pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
		serde_json::from_str(self.get())
	}
}

impl fmt::Debug for RawPayload {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("RawPayload").field(&self.get()).finish()
	}
}

/// Error reported by the remote peer for one command.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (code {code})")]
pub struct RemoteError {
	/// Numeric error code, `0` when the peer sent a bare string.
	pub code: i64,
	/// Human-readable message.
	pub message: String,
	/// Optional extra detail.
	pub data: Option<Value>,
}

/// Inbound response to a previously sent command.
#[derive(Debug, Clone)]
pub struct Response {
	/// Id of the command this answers.
	pub id: u64,
	/// Raw result, or the error the peer reported.
	pub outcome: Result<RawPayload, RemoteError>,
}

/// Inbound unsolicited notification.
#[derive(Debug, Clone)]
pub struct EventMessage {
	/// Namespaced event name, e.g. `Page.loadEventFired`.
	pub method: Arc<str>,
	/// Raw event parameters.
	pub params: RawPayload,
}

/// A decoded unit of inbound traffic.
#[derive(Debug, Clone)]
pub enum Envelope {
	Response(Response),
	Event(EventMessage),
}

/// Reasons an inbound message could not become an [`Envelope`].
#[derive(Debug, Error)]
pub enum DecodeError {
	#[error("malformed message: {0}")]
	Json(#[from] serde_json::Error),

	#[error("message is neither a response nor an event")]
	Unclassified,
}

/// The peer reports errors either as a bare string (empty meaning success) or
/// as a `{code, message, data}` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireError {
	Text(String),
	Detailed {
		#[serde(default)]
		code: i64,
		#[serde(default)]
		message: String,
		#[serde(default)]
		data: Option<Value>,
	},
}

impl WireError {
	fn into_remote(self) -> Option<RemoteError> {
		match self {
			WireError::Text(message) if message.is_empty() => None,
			WireError::Text(message) => Some(RemoteError {
				code: 0,
				message,
				data: None,
			}),
			WireError::Detailed { code: 0, message, .. } if message.is_empty() => None,
			WireError::Detailed {
				code,
				message,
				data,
			} => Some(RemoteError {
				code,
				message,
				data,
			}),
		}
	}
}

#[derive(Deserialize)]
struct WireMessage {
	#[serde(default)]
	id: Option<i64>,
	#[serde(default)]
	error: Option<WireError>,
	#[serde(default)]
	result: Option<Box<RawValue>>,
	#[serde(default)]
	method: Option<String>,
	#[serde(default)]
	params: Option<Box<RawValue>>,
}

impl Envelope {
	/// Decodes one complete message.
	pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
		let wire: WireMessage = serde_json::from_slice(bytes)?;

		if let Some(id) = wire
			.id
			.and_then(|id| u64::try_from(id).ok())
			.filter(|id| *id > 0)
		{
			let outcome = match wire.error.and_then(WireError::into_remote) {
				Some(error) => Err(error),
				None => Ok(RawPayload::new(wire.result)),
			};
			return Ok(Envelope::Response(Response { id, outcome }));
		}

		match wire.method {
			Some(method) if !method.is_empty() => Ok(Envelope::Event(EventMessage {
				method: Arc::from(method),
				params: RawPayload::new(wire.params),
			})),
			_ => Err(DecodeError::Unclassified),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn response(json: &str) -> Response {
		match Envelope::decode(json.as_bytes()).unwrap() {
			Envelope::Response(response) => response,
			other => panic!("expected response, got {other:?}"),
		}
	}

	#[test]
	fn command_frame_omits_absent_params() {
		let frame = CommandRequest {
			id: 7,
			method: "Page.enable",
			params: None,
		};
		let json: Value = serde_json::from_slice(&frame.to_vec().unwrap()).unwrap();
		assert_eq!(json, serde_json::json!({"id": 7, "method": "Page.enable"}));
	}

	#[test]
	fn command_frame_carries_params() {
		let params = serde_json::json!({"url": "https://example.com"});
		let frame = CommandRequest {
			id: 1,
			method: "Page.navigate",
			params: Some(&params),
		};
		let json: Value = serde_json::from_slice(&frame.to_vec().unwrap()).unwrap();
		assert_eq!(json["params"]["url"], "https://example.com");
	}

	#[test]
	fn response_keeps_raw_result() {
		let response = response(r#"{"id": 1, "result": {"frameId": "F"}}"#);
		assert_eq!(response.id, 1);
		let payload = response.outcome.unwrap();
		assert_eq!(payload.get(), r#"{"frameId": "F"}"#);
		let value: Value = payload.decode().unwrap();
		assert_eq!(value["frameId"], "F");
	}

	#[test]
	fn empty_error_string_is_success() {
		let response = response(r#"{"id": 3, "error": "", "result": {}}"#);
		assert!(response.outcome.is_ok());
	}

	#[test]
	fn error_string_becomes_remote_error() {
		let response = response(r#"{"id": 4, "error": "No such node"}"#);
		let error = response.outcome.unwrap_err();
		assert_eq!(error.code, 0);
		assert_eq!(error.message, "No such node");
	}

	#[test]
	fn error_object_becomes_remote_error() {
		let response = response(
			r#"{"id": 5, "error": {"code": -32601, "message": "'Foo.bar' wasn't found"}}"#,
		);
		let error = response.outcome.unwrap_err();
		assert_eq!(error.code, -32601);
		assert!(error.message.contains("Foo.bar"));
	}

	#[test]
	fn missing_result_reads_as_empty_object() {
		let response = response(r#"{"id": 9}"#);
		let payload = response.outcome.unwrap();
		assert!(payload.is_absent());
		assert_eq!(payload.get(), "{}");
	}

	#[test]
	fn event_without_id() {
		let envelope =
			Envelope::decode(br#"{"method": "Page.loadEventFired", "params": {"timestamp": 1.5}}"#)
				.unwrap();
		match envelope {
			Envelope::Event(event) => {
				assert_eq!(&*event.method, "Page.loadEventFired");
				let value: Value = event.params.decode().unwrap();
				assert_eq!(value["timestamp"], 1.5);
			}
			other => panic!("expected event, got {other:?}"),
		}
	}

	#[test]
	fn non_positive_id_is_an_event() {
		let envelope = Envelope::decode(br#"{"id": 0, "method": "Network.dataReceived"}"#).unwrap();
		assert!(matches!(envelope, Envelope::Event(_)));
	}

	#[test]
	fn malformed_json_is_a_decode_error() {
		let err = Envelope::decode(b"{\"id\": 1, \"result\"").unwrap_err();
		assert!(matches!(err, DecodeError::Json(_)));
	}

	#[test]
	fn shapeless_message_is_unclassified() {
		let err = Envelope::decode(br#"{"hello": "world"}"#).unwrap_err();
		assert!(matches!(err, DecodeError::Unclassified));
	}
}
