//! `Inspector` domain.

use serde::Deserialize;

use crate::method::ProtocolEvent;

/// `Inspector.targetCrashed`: the renderer behind this connection died.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetCrashed {}

impl ProtocolEvent for TargetCrashed {
	const NAME: &'static str = "Inspector.targetCrashed";
}

/// `Inspector.detached`.
#[derive(Debug, Clone, Deserialize)]
pub struct Detached {
	pub reason: String,
}

impl ProtocolEvent for Detached {
	const NAME: &'static str = "Inspector.detached";
}
