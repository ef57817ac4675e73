//! Core provider types used across the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Well-known EIP-1193 request methods used during connection.
pub mod methods {
	/// Prompts the wallet for account access.
	pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
	/// Lists accounts already exposed to the caller (signer lookup).
	pub const ETH_ACCOUNTS: &str = "eth_accounts";
	/// Returns the current chain id as a hex quantity.
	pub const ETH_CHAIN_ID: &str = "eth_chainId";
}

/// Identity and metadata announced by a wallet provider.
///
/// Mirrors the EIP-6963 `EIP6963ProviderInfo` record. Fields default to empty
/// so that malformed announcements still deserialize and can be rejected by
/// [`is_well_formed`](Self::is_well_formed) instead of failing the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
	/// Stable identifier, unique per provider for the process lifetime.
	#[serde(default)]
	pub uuid: String,
	/// Human-readable wallet name.
	#[serde(default)]
	pub name: String,
	/// Icon as a data URI. May be empty.
	#[serde(default)]
	pub icon: String,
	/// Reverse-DNS wallet identifier (e.g. `io.metamask`).
	#[serde(default)]
	pub rdns: String,
}

impl ProviderInfo {
	/// Creates an info record with an id and display name.
	pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			uuid: uuid.into(),
			name: name.into(),
			..Default::default()
		}
	}

	/// Sets the reverse-DNS identifier.
	pub fn with_rdns(mut self, rdns: impl Into<String>) -> Self {
		self.rdns = rdns.into();
		self
	}

	/// Sets the icon data URI.
	pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
		self.icon = icon.into();
		self
	}

	/// Returns `true` when both the id and display name are present.
	pub fn is_well_formed(&self) -> bool {
		!self.uuid.is_empty() && !self.name.is_empty()
	}
}

/// Self-reported provider flags, as injected wallets expose them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFlags {
	#[serde(default)]
	pub is_meta_mask: bool,
	#[serde(default)]
	pub is_coinbase_wallet: bool,
}

impl ProviderFlags {
	/// Best-effort display label for an injected provider without EIP-6963 info.
	pub fn injected_name(&self) -> &'static str {
		if self.is_meta_mask {
			"MetaMask"
		} else if self.is_coinbase_wallet {
			"Coinbase Wallet"
		} else {
			INJECTED_WALLET_NAME
		}
	}
}

/// Label used when nothing better is known about an injected provider.
pub const INJECTED_WALLET_NAME: &str = "Injected Wallet";

/// Arguments of an EIP-1193 `request` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestArguments {
	pub method: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub params: Option<Value>,
}

impl RequestArguments {
	/// A request without parameters.
	pub fn new(method: impl Into<String>) -> Self {
		Self {
			method: method.into(),
			params: None,
		}
	}
}

/// Notification channels a provider pushes to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderEvent {
	#[serde(rename = "accountsChanged")]
	AccountsChanged,
	#[serde(rename = "chainChanged")]
	ChainChanged,
}

impl ProviderEvent {
	pub const ALL: [ProviderEvent; 2] = [ProviderEvent::AccountsChanged, ProviderEvent::ChainChanged];

	/// Channel name as used by EIP-1193 `on` / `removeListener`.
	pub fn as_str(&self) -> &'static str {
		match self {
			ProviderEvent::AccountsChanged => "accountsChanged",
			ProviderEvent::ChainChanged => "chainChanged",
		}
	}
}

impl std::fmt::Display for ProviderEvent {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for ProviderEvent {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"accountsChanged" => Ok(ProviderEvent::AccountsChanged),
			"chainChanged" => Ok(ProviderEvent::ChainChanged),
			_ => Err(format!("unknown provider event: {s}")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn provider_info_tolerates_missing_fields() {
		let info: ProviderInfo = serde_json::from_value(json!({ "name": "Ace" })).unwrap();
		assert_eq!(info.name, "Ace");
		assert!(info.uuid.is_empty());
		assert!(!info.is_well_formed());
	}

	#[test]
	fn provider_info_well_formed() {
		let info = ProviderInfo::new("1f0c", "Ace").with_rdns("com.ace");
		assert!(info.is_well_formed());
		assert_eq!(info.rdns, "com.ace");
	}

	#[test]
	fn injected_name_prefers_metamask() {
		let flags = ProviderFlags {
			is_meta_mask: true,
			is_coinbase_wallet: true,
		};
		assert_eq!(flags.injected_name(), "MetaMask");
		assert_eq!(
			ProviderFlags {
				is_coinbase_wallet: true,
				..Default::default()
			}
			.injected_name(),
			"Coinbase Wallet"
		);
		assert_eq!(ProviderFlags::default().injected_name(), "Injected Wallet");
	}

	#[test]
	fn request_arguments_skip_empty_params() {
		let args = RequestArguments::new(methods::ETH_CHAIN_ID);
		assert_eq!(serde_json::to_value(&args).unwrap(), json!({ "method": "eth_chainId" }));
	}

	#[test]
	fn provider_event_names() {
		assert_eq!(ProviderEvent::AccountsChanged.as_str(), "accountsChanged");
		assert_eq!("chainChanged".parse::<ProviderEvent>().unwrap(), ProviderEvent::ChainChanged);
		assert!("connect".parse::<ProviderEvent>().is_err());
	}
}
