//! `Page` domain.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::method::{Method, NoParams, ProtocolEvent, Void};

/// `Page.enable`: start emitting page lifecycle events.
pub struct Enable;

impl Method for Enable {
	const NAME: &'static str = "Page.enable";
	type Params = NoParams;
	type Returns = Void;
}

/// `Page.navigate`.
pub struct Navigate;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
	pub url: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub referrer: Option<String>,
}

impl NavigateParams {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			referrer: None,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateReturns {
	pub frame_id: String,
	#[serde(default)]
	pub loader_id: Option<String>,
	/// Set when the navigation failed before a document was committed.
	#[serde(default)]
	pub error_text: Option<String>,
}

impl Method for Navigate {
	const NAME: &'static str = "Page.navigate";
	type Params = NavigateParams;
	type Returns = NavigateReturns;
}

/// Image encoding for [`CaptureScreenshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
	#[default]
	Png,
	Jpeg,
}

impl ScreenshotFormat {
	/// Picks the format from a file extension, defaulting to PNG.
	pub fn from_path(path: &Path) -> Self {
		match path
			.extension()
			.and_then(|ext| ext.to_str())
			.map(str::to_ascii_lowercase)
			.as_deref()
		{
			Some("jpg" | "jpeg") => ScreenshotFormat::Jpeg,
			_ => ScreenshotFormat::Png,
		}
	}
}

/// `Page.captureScreenshot`.
pub struct CaptureScreenshot;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureScreenshotParams {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub format: Option<ScreenshotFormat>,
	/// JPEG quality in `0..=100`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub quality: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureScreenshotReturns {
	/// Base64-encoded image.
	pub data: String,
}

impl CaptureScreenshotReturns {
	/// Decodes the base64 image data.
	pub fn decode_data(&self) -> Result<Vec<u8>, base64::DecodeError> {
		STANDARD.decode(&self.data)
	}
}

impl Method for CaptureScreenshot {
	const NAME: &'static str = "Page.captureScreenshot";
	type Params = CaptureScreenshotParams;
	type Returns = CaptureScreenshotReturns;
}

/// `Page.loadEventFired`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadEventFired {
	#[serde(default)]
	pub timestamp: f64,
}

impl ProtocolEvent for LoadEventFired {
	const NAME: &'static str = "Page.loadEventFired";
}

/// `Page.domContentEventFired`.
#[derive(Debug, Clone, Deserialize)]
pub struct DomContentEventFired {
	#[serde(default)]
	pub timestamp: f64,
}

impl ProtocolEvent for DomContentEventFired {
	const NAME: &'static str = "Page.domContentEventFired";
}
