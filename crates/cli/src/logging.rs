use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Filter directives for a `-v` count. `RUST_LOG` takes precedence.
pub fn default_filter(verbosity: u8) -> &'static str {
	// 0 = errors from the CLI only (library logs suppressed)
	// 1 (-v) = info for the CLI, warn for the library
	// 2+ (-vv) = debug for everything
	match verbosity {
		0 => "error,walletlink=off,walletlink_cli=error",
		1 => "info,walletlink=warn,walletlink_cli=info",
		_ => "debug",
	}
}

/// Installs the stderr subscriber. stdout stays reserved for results.
pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn filters_parse() {
		for verbosity in 0..4 {
			assert!(default_filter(verbosity).parse::<EnvFilter>().is_ok());
		}
	}

	#[test]
	fn verbosity_levels() {
		assert!(default_filter(0).contains("walletlink=off"));
		assert!(default_filter(1).contains("walletlink=warn"));
		assert_eq!(default_filter(2), default_filter(9));
	}
}
