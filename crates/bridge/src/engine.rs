//! Seam between the bridge and the native browser component.

use std::fmt;

/// Opaque identity of one native instance, as the native side reports it in
/// its callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(pub usize);

impl fmt::Display for InstanceHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:#x}", self.0)
	}
}

/// A callback-driven native browser.
///
/// Every asynchronous operation reports completion through the
/// [`Registry`](crate::Registry) callbacks, from a thread of the engine's
/// choosing:
///
/// - [`run`](Self::run) signals *ready* once the main loop is up
/// - [`open_url`](Self::open_url) signals *ready* once the page has loaded
/// - [`evaluate`](Self::evaluate) signals *evaluate result*
pub trait NativeEngine: Send + Sync + 'static {
	/// Allocates an instance. `None` if the native side refused.
	fn create(&self) -> Option<InstanceHandle>;

	/// Frees an instance whose main loop is not running.
	fn destroy(&self, handle: InstanceHandle);

	/// Runs the native main loop on the calling thread until
	/// [`shutdown`](Self::shutdown) or a failure, returning the exit code.
	fn run(&self, handle: InstanceHandle) -> i32;

	/// Asks a running main loop to exit.
	fn shutdown(&self, handle: InstanceHandle);

	/// Starts loading `url` in a `width` x `height` viewport. Returns false if
	/// the load could not be started, in which case no callback follows.
	fn open_url(&self, handle: InstanceHandle, url: &str, width: u32, height: u32) -> bool;

	/// Starts evaluating `script` in the loaded page.
	fn evaluate(&self, handle: InstanceHandle, script: &str);
}
