//! DevTools protocol runtime - transport, correlation, and event dispatch
//!
//! This crate provides the client side of one long-lived protocol connection:
//!
//! - **Transport**: NUL-delimited pipes or WebSocket frames, reassembled into
//!   whole messages
//! - **Correlation**: ascending command ids, a pending table, per-command
//!   deadlines
//! - **Dispatch**: fan-out of events to bounded, non-blocking sinks
//! - **Discovery**: launching or attaching to a browser over HTTP
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │    hc-cli    │  Tools (render, eval, ...)
//! └──────┬───────┘
//!        │ call::<M>() / subscribe::<E>()
//! ┌──────▼───────┐
//! │  hc-runtime  │  This crate
//! │  ┌────────┐  │
//! │  │ Conn   │  │  id correlation, deadlines
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Events │  │  name -> sinks
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  Pipe/WebSocket transport
//! │  └────────┘  │
//! └──────────────┘
//! ```
//!
//! Typed commands and events come from `hc-protocol`; anything else can be
//! sent with [`Connection::call_raw`] and observed with a raw [`EventSink`].

pub mod browser;
pub mod command;
pub mod connection;
mod correlator;
pub mod dispatcher;
pub mod error;
pub mod options;
pub mod subscription;
pub mod transport;

// Re-export key types at crate root
pub use browser::{BrowserVersion, LaunchOptions, RemoteBrowser, TargetInfo};
pub use command::{Command, CommandId, CompletionHandler, Reply};
pub use connection::Connection;
pub use dispatcher::{EventDispatcher, EventSink, EventStream, SinkId};
pub use error::{Error, Result};
pub use options::ConnectionOptions;
pub use subscription::Subscription;
pub use transport::{
	MessageFramer, PipeTransport, PipeTransportSender, TransportParts, TransportReceiver,
	TransportSender, WebSocketTransport, WebSocketTransportReceiver, WebSocketTransportSender,
};
