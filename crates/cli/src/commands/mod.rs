pub mod connect;
pub mod providers;

use std::time::Instant;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::Result;
use crate::output::{ResultBuilder, print_result};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let started = Instant::now();
	let cwd = std::env::current_dir()?;
	let config = Config::load(cli.config.as_deref(), &cwd)?;
	let format = cli.format;

	match cli.command {
		Commands::Providers => {
			let data = providers::run(&config)?;
			let result = ResultBuilder::new("providers").started_at(started).data(data).build();
			print_result(&result, format);
		}
		Commands::Connect(args) => connect::run(&config, args, format, started).await?,
	}

	Ok(())
}
