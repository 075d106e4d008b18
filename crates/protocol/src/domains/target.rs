//! `Target` domain.

use serde::{Deserialize, Serialize};

use crate::method::{Method, NoParams, Void};

/// `Target.createBrowserContext`: an isolated, incognito-like context.
pub struct CreateBrowserContext;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBrowserContextReturns {
	pub browser_context_id: String,
}

impl Method for CreateBrowserContext {
	const NAME: &'static str = "Target.createBrowserContext";
	type Params = NoParams;
	type Returns = CreateBrowserContextReturns;
}

/// `Target.createTarget`: opens a new page.
pub struct CreateTarget;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetParams {
	pub url: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub width: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub height: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub browser_context_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetReturns {
	pub target_id: String,
}

impl Method for CreateTarget {
	const NAME: &'static str = "Target.createTarget";
	type Params = CreateTargetParams;
	type Returns = CreateTargetReturns;
}

/// `Target.closeTarget`.
pub struct CloseTarget;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseTargetParams {
	pub target_id: String,
}

impl Method for CloseTarget {
	const NAME: &'static str = "Target.closeTarget";
	type Params = CloseTargetParams;
	type Returns = Void;
}
