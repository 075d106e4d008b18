use std::sync::Arc;

use hc_bridge::Browser;
use hc_bridge::ffi::ChromiumEngine;
use tracing::debug;

use crate::cli::NativeEvalArgs;
use crate::error::{HcError, Result};

pub async fn execute(args: NativeEvalArgs) -> Result<()> {
	// Every bridge call parks its thread until the native callback fires.
	let json = tokio::task::spawn_blocking(move || -> Result<String> {
		let browser = Browser::create(Arc::new(ChromiumEngine))?;
		browser.start()?;
		debug!(handle = %browser.handle(), "native browser started");

		browser.open_url(&args.url, args.width, args.height)?;
		let result = browser.evaluate(&args.script);
		browser.shutdown()?;
		Ok(result?)
	})
	.await
	.map_err(|e| HcError::Anyhow(e.into()))??;

	let value: serde_json::Value = serde_json::from_str(&json)?;
	println!("{}", serde_json::to_string_pretty(&value)?);
	Ok(())
}
