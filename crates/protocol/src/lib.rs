//! Wire types for the DevTools protocol.
//!
//! This crate holds the shapes of data as they appear on the wire:
//!
//! - [`CommandRequest`] - outbound `{id, method, params}` frame
//! - [`Envelope`] - an inbound message, either a [`Response`] or an [`EventMessage`]
//! - [`RawPayload`] - undecoded JSON result/params, decoded lazily by whoever owns it
//! - [`Method`] / [`ProtocolEvent`] - typed descriptions of commands and events
//!
//! The [`domains`] module carries the handful of typed commands and events the
//! bundled tools use. Everything else can be sent as raw `(method, params)`.

pub mod domains;
pub mod envelope;
pub mod method;

pub use envelope::{
	CommandRequest, DecodeError, Envelope, EventMessage, RawPayload, RemoteError, Response,
};
pub use method::{Method, NoParams, ProtocolEvent, Void};
