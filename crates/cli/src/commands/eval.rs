use crate::cli::EvalArgs;
use crate::error::Result;
use crate::session::{PageSession, open_browser};

pub async fn execute(args: &EvalArgs) -> Result<()> {
	let browser = open_browser(&args.browser).await?;
	let session = PageSession::load(browser, &args.page).await?;

	let result = session.evaluate(&args.script).await;
	session.close().await?;

	println!("{}", serde_json::to_string_pretty(&result?)?);
	Ok(())
}
