use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Root CLI for hc.
#[derive(Parser, Debug)]
#[command(name = "hc")]
#[command(about = "Drive a headless browser over the DevTools protocol")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv protocol traffic)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Print the browser's product and protocol version.
	Version(BrowserArgs),
	/// List the browser's open targets.
	Targets(BrowserArgs),
	/// Load a page, grow the viewport to the full document and save a screenshot.
	Render(RenderArgs),
	/// Load a page and print the JSON value of a script.
	Eval(EvalArgs),
	/// Evaluate a script through the in-process native browser.
	#[cfg(feature = "native")]
	NativeEval(NativeEvalArgs),
}

/// How to reach the browser: attach to `--addr`, or start `--launch`.
#[derive(Args, Debug, Clone)]
pub struct BrowserArgs {
	/// Address of a running browser. Ignored with --launch.
	#[arg(long, value_name = "HOST:PORT", default_value = "127.0.0.1:9222")]
	pub addr: String,

	/// Launch this browser server binary instead of attaching.
	#[arg(long, value_name = "BIN")]
	pub launch: Option<PathBuf>,

	/// Listen address for a launched browser.
	#[arg(long, value_name = "HOST", default_value = "127.0.0.1")]
	pub host: String,

	/// Port for a launched browser.
	#[arg(long, default_value_t = 9222)]
	pub port: u16,

	/// Proxy for a launched browser.
	#[arg(long, value_name = "URL", requires = "launch")]
	pub proxy: Option<String>,

	/// Seconds to wait for a launched browser to answer.
	#[arg(long, value_name = "SECS", default_value_t = 10)]
	pub startup_timeout: u64,
}

/// Page to open and the viewport it starts with.
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
	/// URL to load.
	#[arg(long)]
	pub url: String,

	#[arg(long, default_value_t = 1920)]
	pub width: u32,

	#[arg(long, default_value_t = 1080)]
	pub height: u32,

	/// Seconds to wait for the load event.
	#[arg(long, value_name = "SECS", default_value_t = 30)]
	pub load_timeout: u64,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
	#[command(flatten)]
	pub browser: BrowserArgs,

	#[command(flatten)]
	pub page: PageArgs,

	/// Output image; `.jpg`/`.jpeg` selects JPEG, anything else PNG.
	#[arg(short, long, default_value = "render.png")]
	pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct EvalArgs {
	#[command(flatten)]
	pub browser: BrowserArgs,

	#[command(flatten)]
	pub page: PageArgs,

	/// Expression to evaluate once the page has loaded.
	#[arg(long, default_value = "document.title")]
	pub script: String,
}

#[cfg(feature = "native")]
#[derive(Args, Debug, Clone)]
pub struct NativeEvalArgs {
	/// URL to load.
	#[arg(long)]
	pub url: String,

	/// Expression to evaluate once the page has loaded.
	#[arg(long, default_value = "document.title")]
	pub script: String,

	#[arg(long, default_value_t = 1920)]
	pub width: u32,

	#[arg(long, default_value_t = 1080)]
	pub height: u32,
}
