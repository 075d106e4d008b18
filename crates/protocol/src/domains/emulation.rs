//! `Emulation` domain.

use serde::Serialize;

use crate::method::{Method, Void};

/// `Emulation.setDeviceMetricsOverride`.
pub struct SetDeviceMetricsOverride;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetrics {
	pub width: u32,
	pub height: u32,
	pub device_scale_factor: f64,
	pub mobile: bool,
}

impl DeviceMetrics {
	/// Desktop metrics at scale factor 1.
	pub fn desktop(width: u32, height: u32) -> Self {
		Self {
			width,
			height,
			device_scale_factor: 1.0,
			mobile: false,
		}
	}
}

impl Method for SetDeviceMetricsOverride {
	const NAME: &'static str = "Emulation.setDeviceMetricsOverride";
	type Params = DeviceMetrics;
	type Returns = Void;
}
