mod eval;
#[cfg(feature = "native")]
mod native_eval;
mod render;
mod targets;
mod version;

use crate::cli::Commands;
use crate::error::Result;

pub async fn dispatch(command: Commands) -> Result<()> {
	match command {
		Commands::Version(args) => version::execute(&args).await,
		Commands::Targets(args) => targets::execute(&args).await,
		Commands::Render(args) => render::execute(&args).await,
		Commands::Eval(args) => eval::execute(&args).await,
		#[cfg(feature = "native")]
		Commands::NativeEval(args) => native_eval::execute(args).await,
	}
}
