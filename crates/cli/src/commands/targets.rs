use hc_runtime::TargetInfo;

use crate::cli::BrowserArgs;
use crate::error::Result;
use crate::session::open_browser;

pub async fn execute(args: &BrowserArgs) -> Result<()> {
	let mut browser = open_browser(args).await?;
	let targets = browser.list_targets().await?;

	if targets.is_empty() {
		println!("No targets");
	}
	for target in &targets {
		println!("{}", format_target(target));
	}

	browser.shutdown().await?;
	Ok(())
}

fn format_target(target: &TargetInfo) -> String {
	let title = if target.title.is_empty() {
		"(untitled)"
	} else {
		target.title.as_str()
	};
	format!("{}  {:<10} {}  {}", target.id, target.kind, title, target.url)
}
