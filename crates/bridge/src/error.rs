//! Errors surfaced by blocking bridge calls.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// The native side returned no instance.
	#[error("native browser instance could not be created")]
	CreateFailed,

	/// `start` may be called once per instance.
	#[error("browser was already started")]
	AlreadyStarted,

	#[error("browser is not running")]
	NotRunning,

	/// `evaluate` needs a page loaded by `open_url`.
	#[error("no page is open")]
	NoPage,

	/// Another blocking call on the same instance has not returned yet.
	#[error("another call is in progress on this browser")]
	CallInProgress,

	/// The native main loop exited before it became ready.
	#[error("browser failed to start (exit code {0})")]
	StartFailed(i32),

	/// The native main loop exited while a call was waiting.
	#[error("browser exited with code {0}")]
	Exited(i32),

	#[error("failed to open {url}")]
	OpenFailed { url: String },

	/// The script threw or its result could not be serialized.
	#[error("evaluation failed: {0}")]
	Evaluation(String),

	/// The instance was torn down while a call was waiting.
	#[error("browser instance closed")]
	InstanceClosed,

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}
