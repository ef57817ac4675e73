//! Wallet connection session.
//!
//! [`WalletSession`] tracks at most one active connection. Every connect,
//! disconnect and forced disconnect bumps a generation counter; an async
//! connect attempt captures the generation it started under and may only
//! commit while that generation is still current. Results of superseded
//! attempts are dropped without touching state or attaching listeners.
//!
//! State lives behind a [`parking_lot::Mutex`]. Each check-and-commit is one
//! critical section, never held across `.await`, and the previous
//! [`EventBridge`] is always dropped after the lock is released.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use tracing::{debug, info, warn};
use walletlink_protocol::{ProviderInfo, methods, parse_chain_id, primary_account};
use walletlink_runtime::ProviderHandle;

use crate::bridge::{BridgeSink, EventBridge};
use crate::error::ConnectionError;
use crate::events::{DisconnectReason, EventBus, EventStream, EventWaiter, SessionEvent};
use crate::registry::ProviderDetail;

/// Default capacity of the session event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Session tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
	/// Upper bound on one connect attempt. `None` waits for the provider
	/// indefinitely.
	pub connect_timeout: Option<Duration>,
	/// Capacity of the broadcast channel behind [`WalletSession::events`].
	pub event_capacity: usize,
}

impl SessionConfig {
	pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
		self.connect_timeout = Some(timeout);
		self
	}
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			connect_timeout: None,
			event_capacity: DEFAULT_EVENT_CAPACITY,
		}
	}
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionStatus {
	#[default]
	Disconnected,
	Connecting,
	Connected,
}

impl std::fmt::Display for ConnectionStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			ConnectionStatus::Disconnected => "disconnected",
			ConnectionStatus::Connecting => "connecting",
			ConnectionStatus::Connected => "connected",
		})
	}
}

/// Point-in-time copy of the session fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
	pub status: ConnectionStatus,
	pub provider: Option<ProviderInfo>,
	pub address: Option<String>,
	pub chain_id: Option<u64>,
	pub last_error: Option<ConnectionError>,
	pub generation: u64,
}

impl SessionSnapshot {
	pub fn is_connected(&self) -> bool {
		self.status == ConnectionStatus::Connected
	}
}

/// What a [`WalletSession::connect`] call ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
	/// The attempt committed.
	Connected(SessionSnapshot),
	/// The attempt failed while current; the error is also the session's
	/// `last_error`.
	Failed(ConnectionError),
	/// A newer connect or a disconnect superseded the attempt. Nothing changed.
	Stale,
}

impl ConnectOutcome {
	pub fn is_connected(&self) -> bool {
		matches!(self, ConnectOutcome::Connected(_))
	}

	pub fn is_stale(&self) -> bool {
		matches!(self, ConnectOutcome::Stale)
	}
}

#[derive(Default)]
struct SessionState {
	generation: u64,
	status: ConnectionStatus,
	provider: Option<ProviderDetail>,
	address: Option<String>,
	chain_id: Option<u64>,
	last_error: Option<ConnectionError>,
	bridge: Option<EventBridge>,
}

impl SessionState {
	fn snapshot(&self) -> SessionSnapshot {
		SessionSnapshot {
			status: self.status,
			provider: self.provider.as_ref().map(|detail| detail.info.clone()),
			address: self.address.clone(),
			chain_id: self.chain_id,
			last_error: self.last_error.clone(),
			generation: self.generation,
		}
	}

	/// Invalidates every pending attempt and clears the connection. The
	/// returned bridge must be dropped by the caller once the lock is released.
	fn invalidate(&mut self) -> Option<EventBridge> {
		self.generation += 1;
		self.status = ConnectionStatus::Disconnected;
		self.provider = None;
		self.address = None;
		self.chain_id = None;
		self.last_error = None;
		self.bridge.take()
	}
}

struct Resolved {
	address: String,
	chain_id: Option<u64>,
}

enum Attempt {
	Resolved(Resolved),
	Failed(ConnectionError),
	TimedOut(Duration),
}

struct SessionInner {
	config: SessionConfig,
	state: Mutex<SessionState>,
	events: EventBus<SessionEvent>,
}

/// The single active wallet connection.
///
/// Cloning is cheap and every clone observes the same session.
#[derive(Clone)]
pub struct WalletSession {
	inner: Arc<SessionInner>,
}

impl WalletSession {
	pub fn new() -> Self {
		Self::with_config(SessionConfig::default())
	}

	pub fn with_config(config: SessionConfig) -> Self {
		let events = EventBus::new(config.event_capacity);
		Self {
			inner: Arc::new(SessionInner {
				config,
				state: Mutex::new(SessionState::default()),
				events,
			}),
		}
	}

	pub fn config(&self) -> &SessionConfig {
		&self.inner.config
	}

	/// Connects to `detail`, replacing any current or pending connection.
	///
	/// Never fails: a failure that is still current is stored as the
	/// session's last error and returned as [`ConnectOutcome::Failed`].
	pub async fn connect(&self, detail: &ProviderDetail) -> ConnectOutcome {
		let (generation, previous) = {
			let mut state = self.inner.state.lock();
			let previous = state.invalidate();
			state.status = ConnectionStatus::Connecting;
			state.provider = Some(detail.clone());
			(state.generation, previous)
		};
		drop(previous);

		info!(target: "walletlink.session", generation, provider = %detail.info.name, uuid = %detail.info.uuid, "connecting");
		self.inner.events.emit(SessionEvent::Connecting {
			provider: detail.info.clone(),
			generation,
		});

		let attempt = match self.inner.config.connect_timeout {
			Some(limit) => match tokio::time::timeout(limit, resolve_account(&detail.provider)).await {
				Ok(attempt) => attempt,
				Err(_) => Attempt::TimedOut(limit),
			},
			None => resolve_account(&detail.provider).await,
		};

		self.commit(generation, detail, attempt)
	}

	fn commit(&self, generation: u64, detail: &ProviderDetail, attempt: Attempt) -> ConnectOutcome {
		let sink: Weak<dyn BridgeSink> = Arc::downgrade(&self.inner) as Weak<dyn BridgeSink>;

		let mut state = self.inner.state.lock();
		if state.generation != generation {
			let current = state.generation;
			drop(state);
			debug!(target: "walletlink.session", generation, current, provider = %detail.info.name, "dropping stale connect result");
			return ConnectOutcome::Stale;
		}

		match attempt {
			Attempt::Resolved(Resolved { address, chain_id }) => {
				state.status = ConnectionStatus::Connected;
				state.address = Some(address.clone());
				state.chain_id = chain_id;
				state.last_error = None;
				// The lock stays held across `Provider::on`, keeping the attach in the
				// same critical section as the generation check. A provider that calls
				// a listener from inside `on` would deadlock here.
				let bridge = EventBridge::attach(&detail.provider, generation, sink);
				let previous = state.bridge.replace(bridge);
				let snapshot = state.snapshot();
				drop(state);
				drop(previous);

				info!(target: "walletlink.session", generation, provider = %detail.info.name, %address, chain_id, "connected");
				self.inner.events.emit(SessionEvent::Connected {
					provider: detail.info.clone(),
					address,
					chain_id,
				});
				ConnectOutcome::Connected(snapshot)
			}
			Attempt::Failed(error) => self.fail(state, detail, error),
			Attempt::TimedOut(limit) => {
				let error = ConnectionError::failed(format!("no response from {} within {limit:?}", detail.info.name));
				self.fail(state, detail, error)
			}
		}
	}

	fn fail(&self, mut state: MutexGuard<'_, SessionState>, detail: &ProviderDetail, error: ConnectionError) -> ConnectOutcome {
		let previous = state.invalidate();
		state.last_error = Some(error.clone());
		let generation = state.generation;
		drop(state);
		drop(previous);

		warn!(target: "walletlink.session", generation, provider = %detail.info.name, detail = error.detail(), "failed to connect wallet: {error}");
		self.inner.events.emit(SessionEvent::ConnectFailed {
			provider: detail.info.clone(),
			error: error.clone(),
		});
		ConnectOutcome::Failed(error)
	}

	/// Tears the connection down and invalidates any pending attempt.
	pub fn disconnect(&self) {
		self.inner.teardown(None, DisconnectReason::UserRequested);
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		self.inner.state.lock().snapshot()
	}

	pub fn status(&self) -> ConnectionStatus {
		self.inner.state.lock().status
	}

	pub fn is_connected(&self) -> bool {
		self.status() == ConnectionStatus::Connected
	}

	pub fn address(&self) -> Option<String> {
		self.inner.state.lock().address.clone()
	}

	pub fn chain_id(&self) -> Option<u64> {
		self.inner.state.lock().chain_id
	}

	pub fn last_error(&self) -> Option<ConnectionError> {
		self.inner.state.lock().last_error.clone()
	}

	pub fn generation(&self) -> u64 {
		self.inner.state.lock().generation
	}

	/// Info of the provider being connected or connected to.
	pub fn active_provider(&self) -> Option<ProviderInfo> {
		self.inner.state.lock().provider.as_ref().map(|detail| detail.info.clone())
	}

	/// Generation of the attached bridge, if any.
	pub fn bridge_generation(&self) -> Option<u64> {
		self.inner.state.lock().bridge.as_ref().map(EventBridge::generation)
	}

	/// Subscribes to session events from now on.
	pub fn events(&self) -> EventStream<SessionEvent> {
		EventStream::new(self.inner.events.subscribe())
	}

	/// Waits for the first event matching `predicate`. Register before
	/// triggering the change to avoid missing it.
	pub fn wait_for<F>(&self, predicate: F, timeout: Duration) -> EventWaiter<SessionEvent>
	where
		F: Fn(&SessionEvent) -> bool + Send + Sync + 'static,
	{
		EventWaiter::new(self.inner.events.register_waiter(predicate), timeout)
	}
}

impl Default for WalletSession {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for WalletSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WalletSession").field("state", &self.snapshot()).finish()
	}
}

impl BridgeSink for SessionInner {
	fn accounts_changed(&self, generation: u64, account: Option<String>) {
		let Some(address) = account else {
			self.teardown(Some(generation), DisconnectReason::AccountsCleared);
			return;
		};

		let mut state = self.state.lock();
		if state.generation != generation || state.status != ConnectionStatus::Connected {
			return;
		}
		if state.address.as_deref() == Some(address.as_str()) {
			return;
		}
		state.address = Some(address.clone());
		drop(state);

		debug!(target: "walletlink.session", generation, %address, "account changed");
		self.events.emit(SessionEvent::AccountChanged { address });
	}

	fn chain_changed(&self, generation: u64, chain_id: Option<u64>) {
		let mut state = self.state.lock();
		if state.generation != generation || state.status != ConnectionStatus::Connected {
			return;
		}
		state.chain_id = chain_id;
		drop(state);

		debug!(target: "walletlink.session", generation, chain_id, "chain changed");
		self.events.emit(SessionEvent::ChainChanged { chain_id });
	}
}

impl SessionInner {
	/// Shared by explicit and forced disconnects. With `expected` set, only
	/// acts while that generation is current and connected.
	fn teardown(&self, expected: Option<u64>, reason: DisconnectReason) -> bool {
		let mut state = self.state.lock();
		if let Some(generation) = expected {
			if state.generation != generation || state.status != ConnectionStatus::Connected {
				return false;
			}
		}
		let was_active = state.status != ConnectionStatus::Disconnected;
		let previous = state.invalidate();
		let generation = state.generation;
		drop(state);
		drop(previous);

		if was_active {
			info!(target: "walletlink.session", generation, ?reason, "disconnected");
			self.events.emit(SessionEvent::Disconnected { reason });
		}
		was_active
	}
}

/// Account and network resolution for one attempt: request accounts, read
/// the network id, then fall back to the signer lookup when the request
/// yielded no usable account.
async fn resolve_account(provider: &ProviderHandle) -> Attempt {
	let accounts = match provider.call(methods::ETH_REQUEST_ACCOUNTS).await {
		Ok(accounts) => accounts,
		Err(err) => return Attempt::Failed(ConnectionError::classify(&err)),
	};
	let requested = primary_account(&accounts);

	let chain_id = match provider.call(methods::ETH_CHAIN_ID).await {
		Ok(raw) => parse_chain_id(&raw),
		Err(err) => return Attempt::Failed(ConnectionError::classify(&err)),
	};

	let address = match requested {
		Some(address) => address,
		None => match provider.call(methods::ETH_ACCOUNTS).await {
			Ok(signers) => match primary_account(&signers) {
				Some(address) => address,
				None => return Attempt::Failed(ConnectionError::failed("provider returned no account")),
			},
			Err(err) => return Attempt::Failed(ConnectionError::classify(&err)),
		},
	};

	Attempt::Resolved(Resolved { address, chain_id })
}

#[cfg(test)]
mod tests {
	use serde_json::json;
	use walletlink_protocol::ProviderInfo;
	use walletlink_runtime::testing::ScriptedProvider;

	use super::*;

	fn detail(wallet: &Arc<ScriptedProvider>) -> ProviderDetail {
		ProviderDetail::new(ProviderInfo::new("w", "Wallet"), wallet.handle())
	}

	#[tokio::test]
	async fn superseded_generation_notifications_are_ignored() {
		let wallet = ScriptedProvider::connected("0xAAA", "0x1");
		let session = WalletSession::new();
		session.connect(&detail(&wallet)).await;
		let current = session.generation();
		assert_eq!(session.bridge_generation(), Some(current));

		session.inner.chain_changed(current - 1, Some(5));
		session.inner.accounts_changed(current - 1, None);
		assert!(session.is_connected());
		assert_eq!(session.chain_id(), Some(1));

		session.inner.chain_changed(current, Some(5));
		assert_eq!(session.chain_id(), Some(5));
	}

	#[tokio::test]
	async fn notifications_while_connecting_are_ignored() {
		let wallet = ScriptedProvider::new();
		let pending = wallet.defer(methods::ETH_REQUEST_ACCOUNTS);
		let session = WalletSession::new();
		let task = {
			let session = session.clone();
			let detail = detail(&wallet);
			tokio::spawn(async move { session.connect(&detail).await })
		};
		tokio::time::sleep(Duration::from_millis(10)).await;
		let generation = session.generation();

		session.inner.accounts_changed(generation, None);
		assert_eq!(session.status(), ConnectionStatus::Connecting);
		assert_eq!(session.bridge_generation(), None);

		session.disconnect();
		drop(pending);
		assert!(task.await.unwrap().is_stale());
	}

	#[tokio::test]
	async fn disconnect_when_idle_emits_nothing() {
		let session = WalletSession::new();
		let mut events = session.events();
		let before = session.generation();
		session.disconnect();
		assert_eq!(session.generation(), before + 1);
		assert!(events.try_recv().is_none());
	}

	#[test]
	fn snapshot_serializes_camel_case() {
		let snapshot = SessionSnapshot {
			status: ConnectionStatus::Connected,
			provider: Some(ProviderInfo::new("w", "Wallet")),
			address: Some("0xAAA".into()),
			chain_id: Some(56),
			last_error: None,
			generation: 3,
		};
		let value = serde_json::to_value(&snapshot).unwrap();
		assert_eq!(value["status"], "connected");
		assert_eq!(value["chainId"], 56);
		assert_eq!(value["lastError"], json!(null));
		assert_eq!(value["provider"]["name"], "Wallet");
	}
}
