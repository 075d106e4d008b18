//! Typed commands and events used by the bundled tools.
//!
//! This is a deliberately small slice of the protocol. Anything not listed here
//! can still be sent through `Connection::call_raw` and observed through a raw
//! event sink.

pub mod emulation;
pub mod inspector;
pub mod page;
pub mod runtime;
pub mod target;
