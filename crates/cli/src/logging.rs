use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

pub fn init_logging(verbosity: u8) {
	// 0 = silent (suppress library protocol noise entirely)
	// 1 (-v) = info for rdc-cli, warn for the libraries
	// 2+ (-vv) = debug/trace for everything
	let filter = match verbosity {
		0 => "error,rdc=off,rdc_runtime=off",
		1 => "info,rdc=warn,rdc_runtime=warn",
		_ => "debug",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}
