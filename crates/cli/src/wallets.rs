//! Wallet sources built from config.
//!
//! Every configured provider becomes an [`HttpProvider`] with its own
//! announcer task answering discovery requests, the way injected wallets
//! answer a page. The optional legacy entry is handed to the registry as the
//! fallback provider instead.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};
use walletlink::{LEGACY_PROVIDER_UUID, ProviderDetail, ProviderRegistry};
use walletlink_runtime::http::DEFAULT_REQUEST_TIMEOUT;
use walletlink_runtime::{HttpProvider, HttpProviderOptions, ProviderHandle, WatchState, Watcher};

use crate::config::{Config, ProviderEntry};
use crate::error::Result;

struct Source {
	provider: Arc<HttpProvider>,
	poll_interval: Duration,
}

pub struct Wallets {
	registry: Arc<ProviderRegistry>,
	sources: HashMap<String, Source>,
	announcers: Vec<JoinHandle<()>>,
}

impl Wallets {
	/// Builds providers, starts their announcers and runs one discovery round.
	/// Must be called inside a tokio runtime.
	pub fn start(config: &Config) -> Result<Self> {
		let request_timeout = config.request_timeout().unwrap_or(DEFAULT_REQUEST_TIMEOUT);
		let mut sources = HashMap::new();

		let legacy = match &config.legacy {
			Some(entry) => {
				let provider = build_provider(entry, request_timeout)?;
				debug!(target: "walletlink_cli.wallets", url = %provider.url(), "legacy provider configured");
				sources.insert(
					LEGACY_PROVIDER_UUID.to_string(),
					Source {
						provider: Arc::clone(&provider),
						poll_interval: entry.poll_interval(),
					},
				);
				Some(provider as ProviderHandle)
			}
			None => None,
		};

		let registry = Arc::new(ProviderRegistry::new(legacy));
		let mut announcers = Vec::with_capacity(config.providers.len());
		for entry in &config.providers {
			let provider = build_provider(entry, request_timeout)?;
			sources.insert(
				entry.uuid.clone(),
				Source {
					provider: Arc::clone(&provider),
					poll_interval: entry.poll_interval(),
				},
			);
			announcers.push(registry.spawn_announcer(ProviderDetail::new(entry.info(), provider as ProviderHandle)));
		}

		let reached = registry.request_announcements();
		info!(target: "walletlink_cli.wallets", configured = config.providers.len(), reached, listed = registry.list().len(), "discovery done");

		Ok(Self {
			registry,
			sources,
			announcers,
		})
	}

	pub fn registry(&self) -> &Arc<ProviderRegistry> {
		&self.registry
	}

	/// Starts polling `uuid` for account and network changes relative to
	/// `seed`.
	pub fn watch(&self, uuid: &str, seed: WatchState) -> Option<Watcher> {
		let source = self.sources.get(uuid)?;
		debug!(target: "walletlink_cli.wallets", uuid, interval_ms = source.poll_interval.as_millis() as u64, "watching provider");
		Some(source.provider.watch(source.poll_interval, seed))
	}
}

impl Drop for Wallets {
	fn drop(&mut self) {
		for announcer in &self.announcers {
			announcer.abort();
		}
	}
}

fn build_provider(entry: &ProviderEntry, request_timeout: Duration) -> Result<Arc<HttpProvider>> {
	let options = HttpProviderOptions::new(entry.rpc_url.clone())
		.with_request_timeout(request_timeout)
		.with_flags(entry.flags());
	Ok(Arc::new(HttpProvider::new(options)?))
}
