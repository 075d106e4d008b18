//! Process-wide table from native handle to bridge state.
//!
//! Native callbacks carry nothing but the instance handle, so the registry is
//! how a callback arriving on an engine thread finds the call it completes.
//! Lookups clone the slot out of the [`DashMap`] before touching it, so no
//! shard lock is held while a waiter is woken.

use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::engine::InstanceHandle;
use crate::error::{Error, Result};

static GLOBAL: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::new()));

/// Blocking operations a caller can be waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallKind {
	Start,
	OpenUrl,
	Evaluate,
}

/// What woke a waiting caller.
#[derive(Debug)]
pub(crate) enum Signal {
	Ready,
	Evaluated(std::result::Result<String, String>),
	Exited(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lifecycle {
	Created,
	Running,
	Stopped,
}

struct PendingCall {
	kind: CallKind,
	tx: oneshot::Sender<Signal>,
}

pub(crate) struct SlotState {
	pending: Option<PendingCall>,
	pub(crate) lifecycle: Lifecycle,
	pub(crate) current_url: Option<String>,
}

/// Bridge state of one native instance, guarded by the instance lock.
pub(crate) struct InstanceSlot {
	handle: InstanceHandle,
	state: Mutex<SlotState>,
}

impl InstanceSlot {
	fn new(handle: InstanceHandle) -> Self {
		Self {
			handle,
			state: Mutex::new(SlotState {
				pending: None,
				lifecycle: Lifecycle::Created,
				current_url: None,
			}),
		}
	}

	/// Installs a fresh one-shot for `kind` after `check` accepts the state.
	///
	/// Fails with [`Error::CallInProgress`] while another call is outstanding.
	pub(crate) fn begin(
		&self,
		kind: CallKind,
		check: impl FnOnce(&mut SlotState) -> Result<()>,
	) -> Result<oneshot::Receiver<Signal>> {
		let mut state = self.state.lock();
		if state.pending.is_some() {
			return Err(Error::CallInProgress);
		}
		check(&mut state)?;

		let (tx, rx) = oneshot::channel();
		state.pending = Some(PendingCall { kind, tx });
		Ok(rx)
	}

	/// Withdraws the outstanding call after the native side refused to start it.
	pub(crate) fn abandon(&self, update: impl FnOnce(&mut SlotState)) {
		let mut state = self.state.lock();
		state.pending = None;
		update(&mut state);
	}

	pub(crate) fn update<T>(&self, f: impl FnOnce(&mut SlotState) -> T) -> T {
		f(&mut self.state.lock())
	}

	pub(crate) fn is_busy(&self) -> bool {
		self.state.lock().pending.is_some()
	}

	/// Completes the outstanding call if it is one `accepts` allows.
	fn deliver(&self, signal: Signal, accepts: impl Fn(CallKind) -> bool) {
		let pending = {
			let mut state = self.state.lock();
			match state.pending.as_ref().map(|call| call.kind) {
				Some(kind) if accepts(kind) => state.pending.take(),
				Some(kind) => {
					warn!(handle = %self.handle, expected = ?kind, ?signal, "callback does not match outstanding call");
					None
				}
				None => {
					warn!(handle = %self.handle, ?signal, "callback with no outstanding call");
					None
				}
			}
		};

		if let Some(call) = pending {
			if call.tx.send(signal).is_err() {
				debug!(handle = %self.handle, "caller stopped waiting");
			}
		}
	}

	/// Records that the native main loop returned and fails any waiter.
	pub(crate) fn exited(&self, code: i32) {
		let pending = {
			let mut state = self.state.lock();
			state.lifecycle = Lifecycle::Stopped;
			state.pending.take()
		};
		if let Some(call) = pending {
			let _ = call.tx.send(Signal::Exited(code));
		}
	}
}

/// Handle -> instance table.
#[derive(Default)]
pub struct Registry {
	instances: DashMap<InstanceHandle, Arc<InstanceSlot>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// The registry the native callbacks report into.
	pub fn global() -> Arc<Registry> {
		Arc::clone(&GLOBAL)
	}

	pub(crate) fn insert(&self, handle: InstanceHandle) -> Arc<InstanceSlot> {
		let slot = Arc::new(InstanceSlot::new(handle));
		if self.instances.insert(handle, Arc::clone(&slot)).is_some() {
			warn!(%handle, "handle reused while still registered");
		}
		slot
	}

	pub(crate) fn remove(&self, handle: InstanceHandle) {
		self.instances.remove(&handle);
	}

	pub fn contains(&self, handle: InstanceHandle) -> bool {
		self.instances.contains_key(&handle)
	}

	pub fn len(&self) -> usize {
		self.instances.len()
	}

	pub fn is_empty(&self) -> bool {
		self.instances.is_empty()
	}

	fn slot(&self, handle: InstanceHandle) -> Option<Arc<InstanceSlot>> {
		self.instances.get(&handle).map(|entry| Arc::clone(entry.value()))
	}

	/// Native *ready* callback: completes a pending start or URL load.
	pub fn signal_ready(&self, handle: InstanceHandle) {
		match self.slot(handle) {
			Some(slot) => slot.deliver(Signal::Ready, |kind| {
				matches!(kind, CallKind::Start | CallKind::OpenUrl)
			}),
			None => warn!(%handle, "ready signal for unknown instance"),
		}
	}

	/// Native *evaluate result* callback.
	pub fn signal_evaluate_result(
		&self,
		handle: InstanceHandle,
		result: std::result::Result<String, String>,
	) {
		match self.slot(handle) {
			Some(slot) => {
				slot.deliver(Signal::Evaluated(result), |kind| kind == CallKind::Evaluate)
			}
			None => warn!(%handle, "evaluate result for unknown instance"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const HANDLE: InstanceHandle = InstanceHandle(0x10);

	#[test]
	fn unknown_handle_is_ignored() {
		let registry = Registry::new();
		registry.signal_ready(HANDLE);
		registry.signal_evaluate_result(HANDLE, Ok("1".into()));
		assert!(registry.is_empty());
	}

	#[test]
	fn ready_completes_start() {
		let registry = Registry::new();
		let slot = registry.insert(HANDLE);
		let mut rx = slot.begin(CallKind::Start, |_| Ok(())).unwrap();

		registry.signal_ready(HANDLE);
		assert!(matches!(rx.try_recv(), Ok(Signal::Ready)));
		assert!(!slot.is_busy());
	}

	#[test]
	fn mismatched_signal_leaves_call_pending() {
		let registry = Registry::new();
		let slot = registry.insert(HANDLE);
		let mut rx = slot.begin(CallKind::Evaluate, |_| Ok(())).unwrap();

		registry.signal_ready(HANDLE);
		assert!(rx.try_recv().is_err());
		assert!(slot.is_busy());

		registry.signal_evaluate_result(HANDLE, Err("boom".into()));
		assert!(matches!(rx.try_recv(), Ok(Signal::Evaluated(Err(message))) if message == "boom"));
	}

	#[test]
	fn second_call_is_rejected() {
		let registry = Registry::new();
		let slot = registry.insert(HANDLE);
		let _rx = slot.begin(CallKind::Evaluate, |_| Ok(())).unwrap();
		assert!(matches!(
			slot.begin(CallKind::Evaluate, |_| Ok(())),
			Err(Error::CallInProgress)
		));
	}

	#[test]
	fn exit_fails_waiter() {
		let registry = Registry::new();
		let slot = registry.insert(HANDLE);
		let mut rx = slot.begin(CallKind::OpenUrl, |_| Ok(())).unwrap();

		slot.exited(2);
		assert!(matches!(rx.try_recv(), Ok(Signal::Exited(2))));
		assert_eq!(slot.update(|state| state.lifecycle), Lifecycle::Stopped);
	}

	#[test]
	fn removed_instance_no_longer_receives() {
		let registry = Registry::new();
		let slot = registry.insert(HANDLE);
		let mut rx = slot.begin(CallKind::Start, |_| Ok(())).unwrap();
		registry.remove(HANDLE);

		registry.signal_ready(HANDLE);
		assert!(rx.try_recv().is_err());
		assert!(!registry.contains(HANDLE));
	}
}
