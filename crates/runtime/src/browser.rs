//! Launching and discovering a remote browser.
//!
//! The browser exposes a small HTTP discovery surface next to its WebSocket
//! endpoints:
//!
//! - `GET /json/version` - product and protocol version
//! - `GET /json/list` - open targets
//!
//! and WebSocket endpoints at `/devtools/browser` and `/devtools/page/<id>`.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::options::ConnectionOptions;

/// Interval between discovery attempts while a launched browser starts up.
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Answer of `GET /json/version`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowserVersion {
	#[serde(rename = "Browser", default)]
	pub browser: String,
	#[serde(rename = "Protocol-Version", default)]
	pub protocol_version: String,
	#[serde(rename = "User-Agent", default)]
	pub user_agent: String,
	#[serde(rename = "WebKit-Version", default)]
	pub webkit_version: String,
	#[serde(rename = "webSocketDebuggerUrl", default)]
	pub web_socket_debugger_url: Option<String>,
}

/// One entry of `GET /json/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
	pub id: String,
	#[serde(rename = "type", default)]
	pub kind: String,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub url: String,
	#[serde(default)]
	pub web_socket_debugger_url: Option<String>,
}

/// How to start a headless browser server.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
	/// Browser server executable.
	pub binary: PathBuf,
	/// Address the server listens on.
	pub addr: String,
	pub port: u16,
	/// Proxy passed through as `--proxy`.
	pub proxy: Option<String>,
	/// How long to wait for the discovery endpoint to answer.
	pub startup_timeout: Duration,
}

impl LaunchOptions {
	pub fn new(binary: impl Into<PathBuf>) -> Self {
		Self {
			binary: binary.into(),
			addr: "127.0.0.1".to_string(),
			port: 9222,
			proxy: None,
			startup_timeout: Duration::from_secs(10),
		}
	}

	fn args(&self) -> Vec<String> {
		let mut args = vec![format!("--port={}", self.port), format!("--addr={}", self.addr)];
		if let Some(proxy) = &self.proxy {
			args.push(format!("--proxy={proxy}"));
		}
		args
	}
}

/// A browser reachable over HTTP discovery, optionally owned by this process.
pub struct RemoteBrowser {
	process: Option<Child>,
	addr: String,
	version: BrowserVersion,
	http: reqwest::Client,
}

impl RemoteBrowser {
	/// Starts the browser server and waits until discovery answers.
	pub async fn launch(options: LaunchOptions) -> Result<Self> {
		let args = options.args();
		debug!(binary = %options.binary.display(), ?args, "launching browser");

		let mut child = Command::new(&options.binary)
			.args(&args)
			.stdin(Stdio::null())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| {
				Error::LaunchFailed(format!("{}: {e}", options.binary.display()))
			})?;

		let addr = format!("{}:{}", options.addr, options.port);
		let http = reqwest::Client::new();
		let deadline = Instant::now() + options.startup_timeout;

		let version = loop {
			match fetch_version(&http, &addr).await {
				Ok(version) => break version,
				Err(e) => {
					if let Some(status) = child.try_wait()? {
						return Err(Error::LaunchFailed(format!(
							"browser exited during startup: {status}"
						)));
					}
					if Instant::now() >= deadline {
						let _ = child.kill().await;
						return Err(Error::LaunchFailed(format!(
							"{addr} did not answer within {:?}: {e}",
							options.startup_timeout
						)));
					}
					tokio::time::sleep(STARTUP_POLL_INTERVAL).await;
				}
			}
		};

		info!(addr, browser = %version.browser, protocol = %version.protocol_version, "browser ready");
		Ok(Self {
			process: Some(child),
			addr,
			version,
			http,
		})
	}

	/// Uses a browser that is already running at `addr` (`host:port`).
	pub async fn attach(addr: impl Into<String>) -> Result<Self> {
		let addr = addr.into();
		let http = reqwest::Client::new();
		let version = fetch_version(&http, &addr)
			.await
			.map_err(|e| Error::ConnectionFailed(format!("{addr}: {e}")))?;
		debug!(addr, protocol = %version.protocol_version, "attached to browser");
		Ok(Self {
			process: None,
			addr,
			version,
			http,
		})
	}

	pub fn addr(&self) -> &str {
		&self.addr
	}

	/// Version reported when the browser was first reached.
	pub fn version(&self) -> &BrowserVersion {
		&self.version
	}

	/// Lists the browser's open targets.
	pub async fn list_targets(&self) -> Result<Vec<TargetInfo>> {
		let url = format!("http://{}/json/list", self.addr);
		let targets = self
			.http
			.get(url)
			.send()
			.await?
			.error_for_status()?
			.json()
			.await?;
		Ok(targets)
	}

	/// Opens the browser-level connection.
	pub async fn connect_browser(&self, options: ConnectionOptions) -> Result<Arc<Connection>> {
		let url = self
			.version
			.web_socket_debugger_url
			.clone()
			.unwrap_or_else(|| format!("ws://{}/devtools/browser", self.addr));
		Connection::connect(&url, options).await
	}

	/// Opens a connection to one page target.
	pub async fn connect_page(
		&self,
		target_id: &str,
		options: ConnectionOptions,
	) -> Result<Arc<Connection>> {
		let url = page_url(&self.addr, target_id);
		Connection::connect(&url, options).await
	}

	/// Stops a launched browser and waits for it. No-op when attached.
	pub async fn shutdown(&mut self) -> Result<()> {
		let Some(mut child) = self.process.take() else {
			return Ok(());
		};
		if let Err(e) = child.start_kill() {
			warn!(error = %e, "browser already gone");
		}
		let status = child.wait().await?;
		debug!(%status, "browser exited");
		Ok(())
	}
}

async fn fetch_version(http: &reqwest::Client, addr: &str) -> Result<BrowserVersion> {
	let url = format!("http://{addr}/json/version");
	let version = http.get(url).send().await?.error_for_status()?.json().await?;
	Ok(version)
}

fn page_url(addr: &str, target_id: &str) -> String {
	format!("ws://{addr}/devtools/page/{target_id}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn version_uses_dashed_keys() {
		let version: BrowserVersion = serde_json::from_str(
			r#"{
				"Browser": "HeadlessChrome/120.0.0.0",
				"Protocol-Version": "1.3",
				"User-Agent": "Mozilla/5.0",
				"WebKit-Version": "537.36",
				"webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/abc"
			}"#,
		)
		.unwrap();
		assert_eq!(version.protocol_version, "1.3");
		assert_eq!(
			version.web_socket_debugger_url.as_deref(),
			Some("ws://127.0.0.1:9222/devtools/browser/abc")
		);
	}

	#[test]
	fn target_list_parses() {
		let targets: Vec<TargetInfo> = serde_json::from_str(
			r#"[{"id": "T1", "type": "page", "title": "Example", "url": "https://example.com/"}]"#,
		)
		.unwrap();
		assert_eq!(targets[0].id, "T1");
		assert_eq!(targets[0].kind, "page");
		assert!(targets[0].web_socket_debugger_url.is_none());
	}

	#[test]
	fn launch_args_include_proxy_only_when_set() {
		let mut options = LaunchOptions::new("/usr/bin/headless_shell");
		options.port = 9333;
		assert_eq!(options.args(), ["--port=9333", "--addr=127.0.0.1"]);

		options.proxy = Some("socks5://127.0.0.1:1080".into());
		assert_eq!(options.args().last().unwrap(), "--proxy=socks5://127.0.0.1:1080");
	}

	#[test]
	fn page_endpoint() {
		assert_eq!(page_url("127.0.0.1:9222", "T1"), "ws://127.0.0.1:9222/devtools/page/T1");
	}

	#[tokio::test]
	async fn launch_reports_missing_binary() {
		let options = LaunchOptions::new("/nonexistent/headless-browser");
		let err = RemoteBrowser::launch(options).await.err().unwrap();
		assert!(matches!(err, Error::LaunchFailed(_)));
	}
}
