#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Root CLI for `wl`.
#[derive(Parser, Debug)]
#[command(name = "wl")]
#[command(about = "Discover injected wallets and manage a connection from the command line")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: json (default), ndjson, toon, or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// Config file to use instead of the user config
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// List discovered wallet providers, sorted by name.
	Providers,
	/// Connect to a provider and print the session.
	Connect(ConnectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
	/// Provider id, as printed by `wl providers`.
	#[arg(value_name = "ID")]
	pub id: String,

	/// Give up on the wallet after this many milliseconds.
	#[arg(long, value_name = "MS")]
	pub timeout_ms: Option<u64>,

	/// Keep following account and network changes until Ctrl-C.
	#[arg(long)]
	pub watch: bool,
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Providers => "providers",
			Commands::Connect(_) => "connect",
		}
	}
}

/// Help colors in the style of cargo.
fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
}
