//! Blocking facade over one native browser instance.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::engine::{InstanceHandle, NativeEngine};
use crate::error::{Error, Result};
use crate::registry::{CallKind, InstanceSlot, Lifecycle, Registry, Signal};

/// A native browser driven through blocking calls.
///
/// Each call installs a one-shot in the instance's slot, starts the native
/// operation and parks the calling thread until the matching callback fires.
/// Only one call may be outstanding per instance; a second concurrent call
/// fails with [`Error::CallInProgress`].
///
/// The blocking methods park the current thread and must not be called from
/// async code; use `tokio::task::spawn_blocking` there.
pub struct Browser<E: NativeEngine> {
	engine: Arc<E>,
	registry: Arc<Registry>,
	handle: InstanceHandle,
	slot: Arc<InstanceSlot>,
	main_loop: Mutex<Option<JoinHandle<()>>>,
}

impl<E: NativeEngine> Browser<E> {
	/// Creates an instance registered in the global registry.
	pub fn create(engine: Arc<E>) -> Result<Self> {
		Self::create_in(engine, Registry::global())
	}

	/// Creates an instance registered in `registry`.
	pub fn create_in(engine: Arc<E>, registry: Arc<Registry>) -> Result<Self> {
		let handle = engine.create().ok_or(Error::CreateFailed)?;
		let slot = registry.insert(handle);
		debug!(%handle, "native browser created");

		Ok(Self {
			engine,
			registry,
			handle,
			slot,
			main_loop: Mutex::new(None),
		})
	}

	pub fn handle(&self) -> InstanceHandle {
		self.handle
	}

	/// Starts the native main loop on its own thread and blocks until it
	/// reports ready.
	pub fn start(&self) -> Result<()> {
		let rx = self.slot.begin(CallKind::Start, |state| match state.lifecycle {
			Lifecycle::Created => {
				state.lifecycle = Lifecycle::Running;
				Ok(())
			}
			Lifecycle::Running | Lifecycle::Stopped => Err(Error::AlreadyStarted),
		})?;

		let engine = Arc::clone(&self.engine);
		let slot = Arc::clone(&self.slot);
		let handle = self.handle;
		let spawned = thread::Builder::new()
			.name("hc-native-main".to_string())
			.spawn(move || {
				let code = engine.run(handle);
				if code == 0 {
					info!(%handle, "native browser exited");
				} else {
					warn!(%handle, code, "native browser exited with error");
				}
				slot.exited(code);
			});

		match spawned {
			Ok(main_loop) => *self.main_loop.lock() = Some(main_loop),
			Err(e) => {
				self.slot
					.abandon(|state| state.lifecycle = Lifecycle::Created);
				return Err(e.into());
			}
		}

		match wait(rx)? {
			Signal::Ready => {
				debug!(handle = %self.handle, "native browser ready");
				Ok(())
			}
			Signal::Exited(code) => Err(Error::StartFailed(code)),
			Signal::Evaluated(_) => Err(Error::InstanceClosed),
		}
	}

	/// Loads `url` in a `width` x `height` viewport and blocks until loaded.
	pub fn open_url(&self, url: &str, width: u32, height: u32) -> Result<()> {
		let rx = self.slot.begin(CallKind::OpenUrl, |state| match state.lifecycle {
			Lifecycle::Running => Ok(()),
			_ => Err(Error::NotRunning),
		})?;

		if !self.engine.open_url(self.handle, url, width, height) {
			self.slot.abandon(|_| {});
			warn!(handle = %self.handle, url, "native side refused to open url");
			return Err(Error::OpenFailed {
				url: url.to_string(),
			});
		}

		match wait(rx)? {
			Signal::Ready => {
				self.slot
					.update(|state| state.current_url = Some(url.to_string()));
				debug!(handle = %self.handle, url, "page loaded");
				Ok(())
			}
			Signal::Exited(code) => Err(Error::Exited(code)),
			Signal::Evaluated(_) => Err(Error::InstanceClosed),
		}
	}

	/// Evaluates `script` in the loaded page and returns its JSON result.
	pub fn evaluate(&self, script: &str) -> Result<String> {
		let rx = self.slot.begin(CallKind::Evaluate, |state| {
			match (state.lifecycle, &state.current_url) {
				(Lifecycle::Running, Some(_)) => Ok(()),
				(Lifecycle::Running, None) => Err(Error::NoPage),
				_ => Err(Error::NotRunning),
			}
		})?;

		self.engine.evaluate(self.handle, script);

		match wait(rx)? {
			Signal::Evaluated(Ok(json)) => Ok(json),
			Signal::Evaluated(Err(message)) => Err(Error::Evaluation(message)),
			Signal::Exited(code) => Err(Error::Exited(code)),
			Signal::Ready => Err(Error::InstanceClosed),
		}
	}

	/// Stops the main loop and waits for its thread.
	pub fn shutdown(&self) -> Result<()> {
		if !self.is_running() {
			return Err(Error::NotRunning);
		}
		self.stop();
		Ok(())
	}

	pub fn is_running(&self) -> bool {
		self.slot.update(|state| state.lifecycle == Lifecycle::Running)
	}

	/// True while a blocking call is waiting on this instance.
	pub fn is_busy(&self) -> bool {
		self.slot.is_busy()
	}

	/// URL of the last page loaded by [`open_url`](Self::open_url).
	pub fn current_url(&self) -> Option<String> {
		self.slot.update(|state| state.current_url.clone())
	}

	fn stop(&self) {
		let Some(main_loop) = self.main_loop.lock().take() else {
			return;
		};
		if self.is_running() {
			self.engine.shutdown(self.handle);
		}
		if main_loop.join().is_err() {
			warn!(handle = %self.handle, "native main loop panicked");
		}
	}
}

impl<E: NativeEngine> Drop for Browser<E> {
	fn drop(&mut self) {
		self.stop();
		self.registry.remove(self.handle);
		self.engine.destroy(self.handle);
		debug!(handle = %self.handle, "native browser destroyed");
	}
}

fn wait(rx: oneshot::Receiver<Signal>) -> Result<Signal> {
	rx.blocking_recv().map_err(|_| Error::InstanceClosed)
}
