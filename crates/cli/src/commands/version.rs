use crate::cli::BrowserArgs;
use crate::error::Result;
use crate::session::open_browser;

pub async fn execute(args: &BrowserArgs) -> Result<()> {
	let mut browser = open_browser(args).await?;
	let version = browser.version();

	println!("Browser:          {}", version.browser);
	println!("Protocol-Version: {}", version.protocol_version);
	println!("User-Agent:       {}", version.user_agent);
	println!("WebKit-Version:   {}", version.webkit_version);
	if let Some(url) = &version.web_socket_debugger_url {
		println!("Debugger-URL:     {url}");
	}

	browser.shutdown().await?;
	Ok(())
}
