//! Event bridge between the active provider and the session.
//!
//! An [`EventBridge`] owns exactly one [`Subscription`] per notification
//! channel. Payloads are parsed here and forwarded to a [`BridgeSink`] tagged
//! with the generation the bridge was attached under; the sink decides whether
//! that generation is still current. Dropping the bridge detaches both
//! listeners.

use std::sync::{Arc, Weak};

use serde_json::Value;
use tracing::{debug, trace};
use walletlink_protocol::{ProviderEvent, parse_chain_id, primary_account};
use walletlink_runtime::{ProviderHandle, Subscription, subscribe};

/// Receiver of parsed provider notifications.
pub(crate) trait BridgeSink: Send + Sync {
	/// `None` means the list was empty or malformed.
	fn accounts_changed(&self, generation: u64, account: Option<String>);

	/// `None` means the id could not be parsed.
	fn chain_changed(&self, generation: u64, chain_id: Option<u64>);
}

pub(crate) struct EventBridge {
	generation: u64,
	_accounts: Subscription,
	_chain: Subscription,
}

impl EventBridge {
	/// Subscribes both channels on `provider`. The sink is held weakly so a
	/// provider that outlives the session never keeps it alive.
	pub fn attach(provider: &ProviderHandle, generation: u64, sink: Weak<dyn BridgeSink>) -> Self {
		let accounts_sink = sink.clone();
		let accounts = subscribe(
			provider,
			ProviderEvent::AccountsChanged,
			Arc::new(move |payload: Value| {
				trace!(target: "walletlink.bridge", generation, %payload, "accountsChanged");
				if let Some(sink) = accounts_sink.upgrade() {
					sink.accounts_changed(generation, primary_account(&payload));
				}
			}),
		);

		let chain = subscribe(
			provider,
			ProviderEvent::ChainChanged,
			Arc::new(move |payload: Value| {
				trace!(target: "walletlink.bridge", generation, %payload, "chainChanged");
				if let Some(sink) = sink.upgrade() {
					sink.chain_changed(generation, parse_chain_id(&payload));
				}
			}),
		);

		debug!(target: "walletlink.bridge", generation, "bridge attached");
		Self {
			generation,
			_accounts: accounts,
			_chain: chain,
		}
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}
}

impl Drop for EventBridge {
	fn drop(&mut self) {
		debug!(target: "walletlink.bridge", generation = self.generation, "bridge detached");
	}
}

impl std::fmt::Debug for EventBridge {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventBridge").field("generation", &self.generation).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use parking_lot::Mutex;
	use serde_json::json;
	use walletlink_runtime::testing::ScriptedProvider;

	use super::*;

	#[derive(Default)]
	struct Recorder {
		accounts: Mutex<Vec<(u64, Option<String>)>>,
		chains: Mutex<Vec<(u64, Option<u64>)>>,
	}

	impl BridgeSink for Recorder {
		fn accounts_changed(&self, generation: u64, account: Option<String>) {
			self.accounts.lock().push((generation, account));
		}

		fn chain_changed(&self, generation: u64, chain_id: Option<u64>) {
			self.chains.lock().push((generation, chain_id));
		}
	}

	#[test]
	fn forwards_parsed_payloads_with_generation() {
		let wallet = ScriptedProvider::new();
		let recorder = Arc::new(Recorder::default());
		let sink: Weak<dyn BridgeSink> = Arc::downgrade(&recorder) as Weak<dyn BridgeSink>;
		let bridge = EventBridge::attach(&wallet.handle(), 7, sink);
		assert_eq!(bridge.generation(), 7);

		wallet.emit(ProviderEvent::AccountsChanged, json!(["0xBBB", "0xCCC"]));
		wallet.emit(ProviderEvent::AccountsChanged, json!([]));
		wallet.emit(ProviderEvent::ChainChanged, json!("0x38"));
		wallet.emit(ProviderEvent::ChainChanged, json!("garbage"));

		assert_eq!(*recorder.accounts.lock(), [(7, Some("0xBBB".to_string())), (7, None)]);
		assert_eq!(*recorder.chains.lock(), [(7, Some(56)), (7, None)]);
	}

	#[test]
	fn drop_detaches_both_channels() {
		let wallet = ScriptedProvider::new();
		let recorder = Arc::new(Recorder::default());
		let sink: Weak<dyn BridgeSink> = Arc::downgrade(&recorder) as Weak<dyn BridgeSink>;
		let bridge = EventBridge::attach(&wallet.handle(), 1, sink);

		assert_eq!(wallet.listener_count(ProviderEvent::AccountsChanged), 1);
		assert_eq!(wallet.listener_count(ProviderEvent::ChainChanged), 1);
		drop(bridge);

		assert_eq!(wallet.listener_count(ProviderEvent::AccountsChanged), 0);
		assert_eq!(wallet.listener_count(ProviderEvent::ChainChanged), 0);
		assert_eq!(wallet.attach_count(), 2);
		assert_eq!(wallet.detach_count(), 2);

		wallet.emit(ProviderEvent::ChainChanged, json!(1));
		assert!(recorder.chains.lock().is_empty());
	}

	#[test]
	fn dropped_sink_is_ignored() {
		let wallet = ScriptedProvider::new();
		let recorder = Arc::new(Recorder::default());
		let sink: Weak<dyn BridgeSink> = Arc::downgrade(&recorder) as Weak<dyn BridgeSink>;
		let _bridge = EventBridge::attach(&wallet.handle(), 1, sink);
		drop(recorder);

		assert_eq!(wallet.emit(ProviderEvent::AccountsChanged, json!([])), 1);
	}
}
