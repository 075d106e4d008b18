//! Binding to the native browser library.
//!
//! The library exports the instance entry points below and calls back into
//! `signalReady` / `signalEvaluateResult`, which this module exports. Both
//! callbacks forward to [`Registry::global`] and never unwind into native code.

use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::panic::{self, AssertUnwindSafe};

use tracing::{error, warn};

use crate::engine::{InstanceHandle, NativeEngine};
use crate::registry::Registry;

#[link(name = "hc_browser")]
unsafe extern "C" {
	fn create_browser() -> *mut c_void;
	fn destroy_browser(browser: *mut c_void);
	fn run_browser(browser: *mut c_void) -> c_int;
	fn shutdown_browser(browser: *mut c_void);
	fn open_url(browser: *mut c_void, url: *const c_char, width: c_int, height: c_int) -> c_int;
	fn evaluate_script(browser: *mut c_void, script: *const c_char);
}

fn ptr(handle: InstanceHandle) -> *mut c_void {
	handle.0 as *mut c_void
}

fn dimension(value: u32) -> c_int {
	c_int::try_from(value).unwrap_or(c_int::MAX)
}

/// [`NativeEngine`] backed by the linked native library.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromiumEngine;

impl NativeEngine for ChromiumEngine {
	fn create(&self) -> Option<InstanceHandle> {
		// SAFETY: no preconditions; a null return means failure.
		let browser = unsafe { create_browser() };
		(!browser.is_null()).then(|| InstanceHandle(browser as usize))
	}

	fn destroy(&self, handle: InstanceHandle) {
		// SAFETY: `handle` came from `create_browser` and its main loop has returned.
		unsafe { destroy_browser(ptr(handle)) }
	}

	fn run(&self, handle: InstanceHandle) -> i32 {
		// SAFETY: `handle` is a live instance; this blocks until shutdown.
		unsafe { run_browser(ptr(handle)) }
	}

	fn shutdown(&self, handle: InstanceHandle) {
		// SAFETY: `handle` is a live instance with a running main loop.
		unsafe { shutdown_browser(ptr(handle)) }
	}

	fn open_url(&self, handle: InstanceHandle, url: &str, width: u32, height: u32) -> bool {
		let Ok(url) = CString::new(url) else {
			warn!(%handle, "url contains a NUL byte");
			return false;
		};
		// SAFETY: `url` outlives the call; the library copies what it keeps.
		unsafe { open_url(ptr(handle), url.as_ptr(), dimension(width), dimension(height)) != 0 }
	}

	fn evaluate(&self, handle: InstanceHandle, script: &str) {
		match CString::new(script) {
			// SAFETY: `script` outlives the call; the library copies what it keeps.
			Ok(script) => unsafe { evaluate_script(ptr(handle), script.as_ptr()) },
			Err(_) => Registry::global().signal_evaluate_result(
				handle,
				Err("script contains a NUL byte".to_string()),
			),
		}
	}
}

#[unsafe(export_name = "signalReady")]
pub extern "C" fn signal_ready(browser: *mut c_void) {
	let handle = InstanceHandle(browser as usize);
	guard("signalReady", || Registry::global().signal_ready(handle));
}

/// # Safety
///
/// `result` must be null or a NUL-terminated string valid for the duration
/// of the call.
#[unsafe(export_name = "signalEvaluateResult")]
pub unsafe extern "C" fn signal_evaluate_result(
	browser: *mut c_void,
	success: c_int,
	result: *const c_char,
) {
	let handle = InstanceHandle(browser as usize);
	let text = if result.is_null() {
		String::new()
	} else {
		// SAFETY: guaranteed by the caller.
		unsafe { CStr::from_ptr(result) }.to_string_lossy().into_owned()
	};
	let result = if success == 1 { Ok(text) } else { Err(text) };
	guard("signalEvaluateResult", || {
		Registry::global().signal_evaluate_result(handle, result)
	});
}

fn guard(callback: &str, f: impl FnOnce()) {
	if panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
		error!(callback, "panic in native callback suppressed");
	}
}
