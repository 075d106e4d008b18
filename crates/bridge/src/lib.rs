//! Blocking calls over a callback-driven native browser.
//!
//! The native component starts work when asked and reports completion later,
//! from its own thread, through one of two callbacks carrying the instance
//! handle. This crate turns that into ordinary blocking methods on
//! [`Browser`]:
//!
//! ```text
//! caller thread              registry                native thread
//! ─────────────              ────────                ─────────────
//! begin(kind) ─────────────▶ slot.pending = tx
//! engine.evaluate() ─────────────────────────────▶   ...work...
//! rx.blocking_recv()         ◀───────────────────── signal_evaluate_result(h)
//!        ◀────────────────── tx.send(result)
//! ```
//!
//! The [`NativeEngine`] trait is the seam to the native side. With the
//! `native` feature, `ffi::ChromiumEngine` links the real library and the
//! exported callbacks report into [`Registry::global`].

mod browser;
mod engine;
mod error;
#[cfg(feature = "native")]
pub mod ffi;
mod registry;

pub use browser::Browser;
pub use engine::{InstanceHandle, NativeEngine};
pub use error::{Error, Result};
pub use registry::Registry;
