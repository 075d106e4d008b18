use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs the stderr subscriber. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(verbosity >= 2)
		.with_level(true)
		.compact()
		.init();
}

/// Directive for a given `-v` count.
///
/// Dropped events and unknown response ids are logged at `warn` by the
/// runtime, so they stay visible from `-v` on; per-message traffic needs
/// `-vvv`.
fn default_filter(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "error",
		1 => "info,hc_runtime=warn,hc_bridge=warn",
		2 => "debug,hc_runtime=debug",
		_ => "trace",
	}
}
