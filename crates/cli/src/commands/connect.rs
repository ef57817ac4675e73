use std::time::{Duration, Instant};

use tracing::{info, warn};
use walletlink::{ConnectOutcome, EventStream, SessionConfig, SessionEvent, WalletSession};
use walletlink_runtime::WatchState;

use crate::cli::ConnectArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::{OutputFormat, ResultBuilder, print_event, print_result};
use crate::wallets::Wallets;

pub async fn run(config: &Config, args: ConnectArgs, format: OutputFormat, started: Instant) -> Result<()> {
	let wallets = Wallets::start(config)?;
	let detail = wallets.registry().get(&args.id)?;

	let session = WalletSession::with_config(SessionConfig {
		connect_timeout: args.timeout_ms.map(Duration::from_millis).or(config.connect_timeout()),
		..Default::default()
	});
	let mut events = session.events();

	let seed = match session.connect(&detail).await {
		ConnectOutcome::Connected(snapshot) => {
			let seed = snapshot
				.address
				.as_deref()
				.map(|address| WatchState::connected(address, snapshot.chain_id))
				.unwrap_or_default();
			let result = ResultBuilder::new("connect").started_at(started).data(snapshot).build();
			print_result(&result, format);
			seed
		}
		ConnectOutcome::Failed(err) => return Err(CliError::Connection(err)),
		ConnectOutcome::Stale => {
			return Err(anyhow::anyhow!("connect attempt to {} was superseded", detail.info.name).into());
		}
	};

	if !args.watch {
		return Ok(());
	}

	// Connecting/Connected are already in the printed snapshot.
	while events.try_recv().is_some() {}

	let watcher = wallets.watch(&args.id, seed);
	if watcher.is_none() {
		warn!(target: "walletlink_cli.connect", id = %args.id, "provider has no change feed, only explicit events will show");
	}
	follow(&session, &mut events, format).await;
	drop(watcher);
	Ok(())
}

/// Prints session events until Ctrl-C or until the wallet drops the session.
async fn follow(session: &WalletSession, events: &mut EventStream<SessionEvent>, format: OutputFormat) {
	loop {
		tokio::select! {
			_ = tokio::signal::ctrl_c() => {
				info!(target: "walletlink_cli.connect", "received Ctrl+C, disconnecting");
				session.disconnect();
				while let Some(event) = events.try_recv() {
					print_event(&event, format);
				}
				break;
			}
			event = events.recv() => match event {
				Some(event) => {
					print_event(&event, format);
					if matches!(event, SessionEvent::Disconnected { .. }) {
						break;
					}
				}
				None => break,
			}
		}
	}
}
