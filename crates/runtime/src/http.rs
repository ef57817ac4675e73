//! JSON-RPC over HTTP provider.
//!
//! [`HttpProvider`] talks to an Ethereum-compatible node (a local dev node or an
//! RPC gateway). Plain HTTP has no push channel, so [`HttpProvider::watch`]
//! polls `eth_accounts` / `eth_chainId` and turns changes into
//! `accountsChanged` / `chainChanged` notifications.
//!
//! # Message Flow
//!
//! 1. Caller invokes `request()` with a method and params
//! 2. Provider allocates a request id and POSTs the JSON-RPC envelope
//! 3. Response id is checked against the request id
//! 4. `error` objects become [`Error::Rpc`], `result` is returned as-is

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};
use walletlink_protocol::{
	ProviderEvent, ProviderFlags, RequestArguments, RpcRequest, RpcResponse, format_chain_id, methods,
};

use crate::error::{Error, Result};
use crate::handlers::{HandlerId, Listener, ListenerRegistry};
use crate::provider::{Provider, ProviderFuture};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection options for [`HttpProvider`].
#[derive(Debug, Clone)]
pub struct HttpProviderOptions {
	pub url: String,
	pub request_timeout: Duration,
	pub flags: ProviderFlags,
}

impl HttpProviderOptions {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			flags: ProviderFlags::default(),
		}
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	pub fn with_flags(mut self, flags: ProviderFlags) -> Self {
		self.flags = flags;
		self
	}
}

/// Provider backed by a JSON-RPC HTTP endpoint.
pub struct HttpProvider {
	url: String,
	client: reqwest::Client,
	next_id: AtomicU64,
	flags: ProviderFlags,
	listeners: ListenerRegistry,
}

impl HttpProvider {
	/// Builds the HTTP client. Fails only if the TLS backend cannot initialize.
	pub fn new(options: HttpProviderOptions) -> Result<Self> {
		let client = reqwest::Client::builder()
			.timeout(options.request_timeout)
			.build()
			.map_err(|e| Error::Transport(format!("Failed to create HTTP client: {e}")))?;

		Ok(Self {
			url: options.url,
			client,
			next_id: AtomicU64::new(1),
			flags: options.flags,
			listeners: ListenerRegistry::new(),
		})
	}

	/// Endpoint this provider posts to.
	pub fn url(&self) -> &str {
		&self.url
	}

	/// Pushes a notification to every listener on `event`.
	pub fn emit(&self, event: ProviderEvent, payload: Value) -> usize {
		self.listeners.emit(event, payload)
	}

	/// Number of listeners attached to `event`.
	pub fn listener_count(&self, event: ProviderEvent) -> usize {
		self.listeners.count(event)
	}

	async fn send(&self, method: &str, params: Option<Value>) -> Result<Value> {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		let request = RpcRequest::new(id, method, params);
		trace!(target: "walletlink.http", id, method, url = %self.url, "sending request");

		let response = self.client.post(&self.url).json(&request).send().await?;
		if !response.status().is_success() {
			return Err(Error::Transport(format!("unexpected status {} from {}", response.status(), self.url)));
		}

		let body: RpcResponse = response.json().await?;
		if let Some(response_id) = body.id {
			if response_id != id {
				return Err(Error::InvalidResponse(format!(
					"response id {response_id} does not match request id {id}"
				)));
			}
		}

		match (body.result, body.error) {
			(_, Some(err)) => {
				debug!(target: "walletlink.http", id, method, code = err.code, "provider returned error");
				Err(Error::Rpc(err))
			}
			(result, None) => Ok(result.unwrap_or(Value::Null)),
		}
	}

	/// Polls the node once and emits notifications for values that changed
	/// since `state` was last updated.
	///
	/// The first successful read of each value only records a baseline.
	pub async fn poll_changes(&self, state: &mut WatchState) {
		match self.send(methods::ETH_ACCOUNTS, None).await {
			Ok(accounts) => {
				if state.accounts.as_ref().is_some_and(|previous| *previous != accounts) {
					debug!(target: "walletlink.http", url = %self.url, "accounts changed");
					self.emit(ProviderEvent::AccountsChanged, accounts.clone());
				}
				state.accounts = Some(accounts);
			}
			Err(err) => warn!(target: "walletlink.http", url = %self.url, error = %err, "eth_accounts poll failed"),
		}

		match self.send(methods::ETH_CHAIN_ID, None).await {
			Ok(chain_id) => {
				if state.chain_id.as_ref().is_some_and(|previous| *previous != chain_id) {
					debug!(target: "walletlink.http", url = %self.url, chain_id = %chain_id, "chain changed");
					self.emit(ProviderEvent::ChainChanged, chain_id.clone());
				}
				state.chain_id = Some(chain_id);
			}
			Err(err) => warn!(target: "walletlink.http", url = %self.url, error = %err, "eth_chainId poll failed"),
		}
	}

	/// Starts polling every `interval`, comparing against `state` first.
	///
	/// Seed `state` with the values already known to the caller so a change
	/// made before the first poll is still reported. The task holds only a
	/// weak reference and ends once the provider is dropped or the returned
	/// [`Watcher`] is dropped.
	pub fn watch(self: &Arc<Self>, interval: Duration, mut state: WatchState) -> Watcher {
		let weak = Arc::downgrade(self);
		let task = tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				ticker.tick().await;
				let Some(provider) = weak.upgrade() else {
					break;
				};
				provider.poll_changes(&mut state).await;
			}
		});
		Watcher { task }
	}
}

impl Provider for HttpProvider {
	fn request(&self, args: RequestArguments) -> ProviderFuture<'_, Value> {
		Box::pin(async move {
			match self.send(&args.method, args.params.clone()).await {
				Err(err) if args.method == methods::ETH_REQUEST_ACCOUNTS && err.is_method_not_found() => {
					debug!(
						target: "walletlink.http",
						url = %self.url,
						"eth_requestAccounts unsupported; using eth_accounts"
					);
					self.send(methods::ETH_ACCOUNTS, None).await
				}
				other => other,
			}
		})
	}

	fn on(&self, event: ProviderEvent, listener: Listener) -> HandlerId {
		self.listeners.add(event, listener)
	}

	fn remove_listener(&self, event: ProviderEvent, id: HandlerId) {
		self.listeners.remove(event, id);
	}

	fn flags(&self) -> ProviderFlags {
		self.flags
	}
}

impl std::fmt::Debug for HttpProvider {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HttpProvider")
			.field("url", &self.url)
			.field("flags", &self.flags)
			.finish()
	}
}

/// Last values observed by a polling watcher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchState {
	pub accounts: Option<Value>,
	pub chain_id: Option<Value>,
}

impl WatchState {
	/// State seeded from a connected account and its `0x` chain id.
	pub fn connected(address: &str, chain_id: Option<u64>) -> Self {
		Self {
			accounts: Some(Value::Array(vec![Value::String(address.to_string())])),
			chain_id: chain_id.map(|id| Value::String(format_chain_id(id))),
		}
	}
}

/// Handle to a polling task. Dropping it stops the task.
#[derive(Debug)]
pub struct Watcher {
	task: JoinHandle<()>,
}

impl Drop for Watcher {
	fn drop(&mut self) {
		self.task.abort();
	}
}
