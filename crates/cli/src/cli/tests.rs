use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn parse_providers_command() {
	let cli = Cli::try_parse_from(["wl", "providers"]).unwrap();

	assert!(matches!(cli.command, Commands::Providers));
	assert_eq!(cli.format, OutputFormat::Json);
	assert_eq!(cli.verbose, 0);
	assert_eq!(cli.config, None);
}

#[test]
fn parse_connect_command() {
	let cli = Cli::try_parse_from(["wl", "connect", "ace-id"]).unwrap();

	match cli.command {
		Commands::Connect(args) => {
			assert_eq!(args.id, "ace-id");
			assert_eq!(args.timeout_ms, None);
			assert!(!args.watch);
		}
		_ => panic!("Expected Connect command"),
	}
}

#[test]
fn parse_connect_with_options() {
	let cli = Cli::try_parse_from(["wl", "connect", "ace-id", "--timeout-ms", "1500", "--watch"]).unwrap();

	match cli.command {
		Commands::Connect(args) => {
			assert_eq!(args.timeout_ms, Some(1500));
			assert!(args.watch);
		}
		_ => panic!("Expected Connect command"),
	}
}

#[test]
fn global_flags_after_subcommand() {
	let cli = Cli::try_parse_from(["wl", "providers", "-vv", "-f", "text", "--config", "/tmp/wl.json"]).unwrap();

	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.format, OutputFormat::Text);
	assert_eq!(cli.config, Some(PathBuf::from("/tmp/wl.json")));
	assert_eq!(cli.command.name(), "providers");
}

#[test]
fn connect_requires_id() {
	assert!(Cli::try_parse_from(["wl", "connect"]).is_err());
}

#[test]
fn rejects_unknown_format() {
	assert!(Cli::try_parse_from(["wl", "-f", "yaml", "providers"]).is_err());
}

#[test]
fn rejects_non_numeric_timeout() {
	assert!(Cli::try_parse_from(["wl", "connect", "a", "--timeout-ms", "soon"]).is_err());
}
