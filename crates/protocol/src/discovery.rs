//! Multi-provider discovery handshake (EIP-6963).
//!
//! The protocol is two messages:
//!
//! 1. The dapp broadcasts [`DiscoveryMessage::RequestProvider`]
//! 2. Every installed wallet answers with [`DiscoveryMessage::AnnounceProvider`]
//!    carrying its [`ProviderInfo`]; the provider handle travels alongside it
//!    out of band
//!
//! Wallets also announce unprompted when they load, so announcements can arrive
//! at any time, before or after a request.

use serde::{Deserialize, Serialize};

use crate::types::ProviderInfo;

/// Event name of the discovery request broadcast.
pub const REQUEST_PROVIDER_EVENT: &str = "eip6963:requestProvider";
/// Event name of a provider announcement.
pub const ANNOUNCE_PROVIDER_EVENT: &str = "eip6963:announceProvider";

/// Discovery message exchanged between a dapp and wallet providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DiscoveryMessage {
	#[serde(rename = "eip6963:requestProvider")]
	RequestProvider,
	#[serde(rename = "eip6963:announceProvider")]
	AnnounceProvider { info: ProviderInfo },
}

impl DiscoveryMessage {
	/// Event name used on the wire.
	pub fn event_name(&self) -> &'static str {
		match self {
			DiscoveryMessage::RequestProvider => REQUEST_PROVIDER_EVENT,
			DiscoveryMessage::AnnounceProvider { .. } => ANNOUNCE_PROVIDER_EVENT,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn announce_message_shape() {
		let msg = DiscoveryMessage::AnnounceProvider {
			info: ProviderInfo::new("abc", "Nifty"),
		};
		let value = serde_json::to_value(&msg).unwrap();
		assert_eq!(value["type"], ANNOUNCE_PROVIDER_EVENT);
		assert_eq!(value["info"]["uuid"], "abc");
		assert_eq!(msg.event_name(), ANNOUNCE_PROVIDER_EVENT);
	}

	#[test]
	fn request_message_round_trips_by_name() {
		let msg: DiscoveryMessage = serde_json::from_value(json!({ "type": "eip6963:requestProvider" })).unwrap();
		assert_eq!(msg, DiscoveryMessage::RequestProvider);
	}
}
