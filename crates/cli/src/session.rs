//! One page opened in its own browser context.
//!
//! Opening a page takes two connections: the browser-level one creates an
//! isolated context and a target in it, then a second connection attaches to
//! that target's page endpoint.

use std::sync::Arc;
use std::time::Duration;

use hc_protocol::NoParams;
use hc_protocol::domains::page::{self, LoadEventFired, NavigateParams};
use hc_protocol::domains::runtime::{Evaluate, EvaluateParams};
use hc_protocol::domains::target::{
	CloseTarget, CloseTargetParams, CreateBrowserContext, CreateTarget, CreateTargetParams,
};
use hc_runtime::{Connection, ConnectionOptions, LaunchOptions, RemoteBrowser};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cli::{BrowserArgs, PageArgs};
use crate::error::{HcError, Result};

/// Starts the browser named by `--launch`, or attaches to `--addr`.
pub async fn open_browser(args: &BrowserArgs) -> Result<RemoteBrowser> {
	let browser = match &args.launch {
		Some(binary) => {
			let mut options = LaunchOptions::new(binary);
			options.addr = args.host.clone();
			options.port = args.port;
			options.proxy = args.proxy.clone();
			options.startup_timeout = Duration::from_secs(args.startup_timeout);
			RemoteBrowser::launch(options).await?
		}
		None => RemoteBrowser::attach(args.addr.clone()).await?,
	};
	Ok(browser)
}

pub struct PageSession {
	browser: RemoteBrowser,
	control: Arc<Connection>,
	page: Arc<Connection>,
	target_id: String,
}

impl PageSession {
	/// Creates a blank `width` x `height` page in a fresh context.
	pub async fn open(browser: RemoteBrowser, width: u32, height: u32) -> Result<Self> {
		let options = ConnectionOptions::from_env();
		let control = browser.connect_browser(options.clone()).await?;

		let context = control.call::<CreateBrowserContext>(NoParams).await?;
		let target = control
			.call::<CreateTarget>(CreateTargetParams {
				url: "about:blank".to_string(),
				width: Some(width),
				height: Some(height),
				browser_context_id: Some(context.browser_context_id.clone()),
			})
			.await?;
		debug!(target = %target.target_id, context = %context.browser_context_id, "target created");

		// The page endpoint is only served once discovery has seen the target.
		let targets = browser.list_targets().await?;
		debug!(count = targets.len(), "targets listed");

		let page = browser.connect_page(&target.target_id, options).await?;
		Ok(Self {
			browser,
			control,
			page,
			target_id: target.target_id,
		})
	}

	/// Opens the page described by `args` and waits for it to load.
	pub async fn load(browser: RemoteBrowser, args: &PageArgs) -> Result<Self> {
		let session = Self::open(browser, args.width, args.height).await?;
		session
			.navigate(&args.url, Duration::from_secs(args.load_timeout))
			.await?;
		Ok(session)
	}

	pub fn page(&self) -> &Arc<Connection> {
		&self.page
	}

	/// Navigates and waits for `Page.loadEventFired`.
	pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
		let mut loads = self.page.subscribe::<LoadEventFired>();
		self.page.call::<page::Enable>(NoParams).await?;

		let returns = self.page.call::<page::Navigate>(NavigateParams::new(url)).await?;
		if let Some(reason) = returns.error_text {
			return Err(HcError::Navigation {
				url: url.to_string(),
				reason,
			});
		}

		loads.next_timeout(timeout).await?;
		info!(url, frame = %returns.frame_id, "page loaded");
		Ok(())
	}

	/// Evaluates `expression` and returns its JSON value.
	pub async fn evaluate(&self, expression: &str) -> Result<Value> {
		let returns = self
			.page
			.call::<Evaluate>(EvaluateParams::by_value(expression))
			.await?;
		returns.into_value().map_err(HcError::Evaluation)
	}

	/// Evaluates `expression` and expects a non-negative integer.
	pub async fn evaluate_u32(&self, expression: &str) -> Result<u32> {
		let value = self.evaluate(expression).await?;
		value
			.as_u64()
			.and_then(|n| u32::try_from(n).ok())
			.ok_or_else(|| HcError::UnexpectedValue {
				expression: expression.to_string(),
				value,
			})
	}

	/// Closes the target, both connections and a launched browser.
	pub async fn close(mut self) -> Result<()> {
		let closed = self
			.control
			.call::<CloseTarget>(CloseTargetParams {
				target_id: self.target_id.clone(),
			})
			.await;
		if let Err(e) = closed {
			warn!(target = %self.target_id, error = %e, "failed to close target");
		}

		self.page.close().await?;
		self.control.close().await?;
		self.browser.shutdown().await?;
		Ok(())
	}
}
