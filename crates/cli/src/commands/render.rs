use std::path::Path;

use anyhow::Context;
use hc_protocol::domains::emulation::{DeviceMetrics, SetDeviceMetricsOverride};
use hc_protocol::domains::page::{CaptureScreenshot, CaptureScreenshotParams, ScreenshotFormat};
use tracing::info;

use crate::cli::RenderArgs;
use crate::error::{HcError, Result};
use crate::session::{PageSession, open_browser};

const SCROLL_WIDTH: &str = "document.scrollingElement.scrollWidth";
const SCROLL_HEIGHT: &str = "document.scrollingElement.scrollHeight";

pub async fn execute(args: &RenderArgs) -> Result<()> {
	let browser = open_browser(&args.browser).await?;
	let session = PageSession::load(browser, &args.page).await?;

	let image = capture_full_page(&session, &args.output).await;
	session.close().await?;
	let image = image?;

	std::fs::write(&args.output, &image)
		.with_context(|| format!("Failed to write {}", args.output.display()))?;
	info!(path = %args.output.display(), bytes = image.len(), "screenshot saved");
	println!("{}", args.output.display());
	Ok(())
}

/// Grows the viewport to the document's scroll size and captures it.
async fn capture_full_page(session: &PageSession, output: &Path) -> Result<Vec<u8>> {
	let width = session.evaluate_u32(SCROLL_WIDTH).await?;
	let height = session.evaluate_u32(SCROLL_HEIGHT).await?;
	info!(width, height, "document size");

	let page = session.page();
	page.call::<SetDeviceMetricsOverride>(DeviceMetrics::desktop(width, height))
		.await?;

	let screenshot = page
		.call::<CaptureScreenshot>(CaptureScreenshotParams {
			format: Some(ScreenshotFormat::from_path(output)),
			quality: None,
		})
		.await?;
	screenshot
		.decode_data()
		.map_err(|e| HcError::Screenshot(e.to_string()))
}
