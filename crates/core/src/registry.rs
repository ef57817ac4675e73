//! Provider registry fed by the discovery handshake.
//!
//! Wallets announce themselves with an info record and a provider handle. The
//! registry keeps the first announcement per id, lists providers sorted by
//! display name, and falls back to a single legacy injected provider when
//! nothing has been announced.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use walletlink_protocol::{DiscoveryMessage, ProviderInfo};
use walletlink_runtime::ProviderHandle;

use crate::error::{Error, Result};
use crate::events::EventStream;

/// Id of the synthesized legacy provider entry.
pub const LEGACY_PROVIDER_UUID: &str = "window.ethereum";
/// Reverse-DNS marker of the synthesized legacy provider entry.
pub const LEGACY_PROVIDER_RDNS: &str = "injected";

/// An announced provider: discovery info plus the capability handle.
#[derive(Clone)]
pub struct ProviderDetail {
	pub info: ProviderInfo,
	pub provider: ProviderHandle,
}

impl ProviderDetail {
	pub fn new(info: ProviderInfo, provider: ProviderHandle) -> Self {
		Self { info, provider }
	}

	/// Returns `true` for the synthesized legacy entry.
	pub fn is_legacy(&self) -> bool {
		self.info.uuid == LEGACY_PROVIDER_UUID && self.info.rdns == LEGACY_PROVIDER_RDNS
	}
}

impl std::fmt::Debug for ProviderDetail {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProviderDetail").field("info", &self.info).finish_non_exhaustive()
	}
}

/// Registry of discovered wallet providers.
pub struct ProviderRegistry {
	providers: Mutex<Vec<ProviderDetail>>,
	legacy: Option<ProviderHandle>,
	discovery: broadcast::Sender<DiscoveryMessage>,
}

impl ProviderRegistry {
	/// Creates a registry. `legacy` is the single globally injected provider,
	/// if the host has one.
	pub fn new(legacy: Option<ProviderHandle>) -> Self {
		let (discovery, _) = broadcast::channel(64);
		Self {
			providers: Mutex::new(Vec::new()),
			legacy,
			discovery,
		}
	}

	/// Records a provider the first time its id is seen and broadcasts the
	/// announcement to discovery subscribers.
	///
	/// Returns `false` for duplicates and for malformed info (empty id or
	/// name); both are otherwise ignored.
	pub fn announce(&self, info: ProviderInfo, provider: ProviderHandle) -> bool {
		if !info.is_well_formed() {
			debug!(target: "walletlink.registry", uuid = %info.uuid, name = %info.name, "ignoring malformed announcement");
			return false;
		}

		let mut providers = self.providers.lock();
		if providers.iter().any(|known| known.info.uuid == info.uuid) {
			trace!(target: "walletlink.registry", uuid = %info.uuid, "duplicate announcement");
			return false;
		}

		debug!(target: "walletlink.registry", uuid = %info.uuid, name = %info.name, rdns = %info.rdns, "provider announced");
		providers.push(ProviderDetail {
			info: info.clone(),
			provider,
		});
		drop(providers);

		let _ = self.discovery.send(DiscoveryMessage::AnnounceProvider { info });
		true
	}

	/// Broadcasts a discovery request. Returns how many wallet sources heard it.
	pub fn request_announcements(&self) -> usize {
		let reached = self.discovery.send(DiscoveryMessage::RequestProvider).unwrap_or(0);
		debug!(target: "walletlink.registry", reached, "requested provider announcements");
		reached
	}

	/// Stream of discovery traffic: requests for wallet sources to answer and
	/// accepted announcements.
	pub fn subscribe_discovery(&self) -> EventStream<DiscoveryMessage> {
		EventStream::new(self.discovery.subscribe())
	}

	/// Runs a wallet source: announces `detail` now and again on every
	/// discovery request. Ends when the registry is dropped.
	pub fn spawn_announcer(self: &Arc<Self>, detail: ProviderDetail) -> JoinHandle<()> {
		let mut requests = self.subscribe_discovery();
		let weak: Weak<Self> = Arc::downgrade(self);
		self.announce(detail.info.clone(), Arc::clone(&detail.provider));

		tokio::spawn(async move {
			while let Some(message) = requests.recv().await {
				if message != DiscoveryMessage::RequestProvider {
					continue;
				}
				let Some(registry) = weak.upgrade() else {
					break;
				};
				registry.announce(detail.info.clone(), Arc::clone(&detail.provider));
			}
		})
	}

	/// Known providers sorted by display name, or the legacy fallback when
	/// nothing has been announced.
	pub fn list(&self) -> Vec<ProviderDetail> {
		let mut providers = self.providers.lock().clone();
		if providers.is_empty() {
			return self.legacy_detail().into_iter().collect();
		}
		providers.sort_by(|a, b| a.info.name.cmp(&b.info.name));
		providers
	}

	/// Looks up a listed provider by id.
	pub fn get(&self, uuid: &str) -> Result<ProviderDetail> {
		self.list()
			.into_iter()
			.find(|detail| detail.info.uuid == uuid)
			.ok_or_else(|| Error::UnknownProvider(uuid.to_string()))
	}

	/// Number of real (announced) providers.
	pub fn announced_count(&self) -> usize {
		self.providers.lock().len()
	}

	/// Synthesized entry for the legacy provider, labelled from its flags.
	pub fn legacy_detail(&self) -> Option<ProviderDetail> {
		let provider = self.legacy.as_ref()?;
		let info = ProviderInfo::new(LEGACY_PROVIDER_UUID, provider.flags().injected_name()).with_rdns(LEGACY_PROVIDER_RDNS);
		Some(ProviderDetail {
			info,
			provider: Arc::clone(provider),
		})
	}
}

impl Default for ProviderRegistry {
	fn default() -> Self {
		Self::new(None)
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use walletlink_protocol::ProviderFlags;
	use walletlink_runtime::testing::ScriptedProvider;

	use super::*;

	fn names(registry: &ProviderRegistry) -> Vec<String> {
		registry.list().into_iter().map(|d| d.info.name).collect()
	}

	#[test]
	fn duplicate_announcement_is_ignored() {
		let registry = ProviderRegistry::default();
		let wallet = ScriptedProvider::new();

		assert!(registry.announce(ProviderInfo::new("a", "Ace"), wallet.handle()));
		assert!(!registry.announce(ProviderInfo::new("a", "Ace (again)"), wallet.handle()));

		assert_eq!(registry.announced_count(), 1);
		assert_eq!(names(&registry), ["Ace"]);
	}

	#[test]
	fn malformed_announcement_is_rejected() {
		let registry = ProviderRegistry::default();
		let wallet = ScriptedProvider::new();

		assert!(!registry.announce(ProviderInfo::new("", "Nameless"), wallet.handle()));
		assert!(!registry.announce(ProviderInfo::new("id", ""), wallet.handle()));
		assert!(registry.list().is_empty());
	}

	#[test]
	fn list_is_sorted_regardless_of_arrival() {
		let registry = ProviderRegistry::default();
		for (id, name) in [("3", "Nifty"), ("1", "ace"), ("2", "Ace"), ("4", "Brave")] {
			registry.announce(ProviderInfo::new(id, name), ScriptedProvider::new().handle());
		}
		assert_eq!(names(&registry), ["Ace", "Brave", "Nifty", "ace"]);
	}

	#[test]
	fn legacy_fallback_named_from_flags() {
		let legacy = ScriptedProvider::with_flags(ProviderFlags {
			is_meta_mask: true,
			..Default::default()
		});
		let registry = ProviderRegistry::new(Some(legacy.handle()));

		let listed = registry.list();
		assert_eq!(listed.len(), 1);
		assert!(listed[0].is_legacy());
		assert_eq!(listed[0].info.name, "MetaMask");
		assert_eq!(registry.announced_count(), 0);
		assert!(registry.get(LEGACY_PROVIDER_UUID).is_ok());
	}

	#[test]
	fn legacy_fallback_disappears_after_announcement() {
		let registry = ProviderRegistry::new(Some(ScriptedProvider::new().handle()));
		assert_eq!(names(&registry), ["Injected Wallet"]);

		registry.announce(ProviderInfo::new("n", "Nifty"), ScriptedProvider::new().handle());
		assert_eq!(names(&registry), ["Nifty"]);
		assert!(matches!(registry.get(LEGACY_PROVIDER_UUID), Err(Error::UnknownProvider(_))));
	}

	#[test]
	fn no_legacy_and_no_announcements_is_empty() {
		assert!(ProviderRegistry::default().list().is_empty());
	}

	#[tokio::test]
	async fn accepted_announcements_are_broadcast() {
		let registry = ProviderRegistry::default();
		let mut discovery = registry.subscribe_discovery();
		let wallet = ScriptedProvider::new();

		assert!(registry.announce(ProviderInfo::new("a", "Ace"), wallet.handle()));
		assert!(!registry.announce(ProviderInfo::new("a", "Ace again"), wallet.handle()));
		assert!(!registry.announce(ProviderInfo::new("", "Nameless"), wallet.handle()));

		assert_eq!(
			discovery.try_recv(),
			Some(DiscoveryMessage::AnnounceProvider {
				info: ProviderInfo::new("a", "Ace")
			})
		);
		assert_eq!(discovery.try_recv(), None);
	}

	#[tokio::test]
	async fn announcer_answers_discovery_requests() {
		let registry = Arc::new(ProviderRegistry::default());
		let wallet = ScriptedProvider::new();
		let task = registry.spawn_announcer(ProviderDetail::new(ProviderInfo::new("n", "Nifty"), wallet.handle()));
		assert_eq!(registry.announced_count(), 1);

		let mut late = registry.subscribe_discovery();
		assert_eq!(registry.request_announcements(), 2);
		assert_eq!(late.recv().await, Some(DiscoveryMessage::RequestProvider));

		tokio::time::sleep(Duration::from_millis(10)).await;
		assert_eq!(registry.announced_count(), 1);

		drop(late);
		drop(registry);
		tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
	}
}
