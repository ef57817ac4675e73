use serde::Serialize;
use walletlink::{NO_WALLET_MESSAGE, ProviderDetail};

use crate::config::Config;
use crate::error::Result;
use crate::wallets::Wallets;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvidersData {
	pub providers: Vec<ProviderRow>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRow {
	pub uuid: String,
	pub name: String,
	#[serde(skip_serializing_if = "String::is_empty")]
	pub rdns: String,
	pub legacy: bool,
}

impl From<&ProviderDetail> for ProviderRow {
	fn from(detail: &ProviderDetail) -> Self {
		Self {
			uuid: detail.info.uuid.clone(),
			name: detail.info.name.clone(),
			rdns: detail.info.rdns.clone(),
			legacy: detail.is_legacy(),
		}
	}
}

pub fn run(config: &Config) -> Result<ProvidersData> {
	let wallets = Wallets::start(config)?;
	let providers: Vec<ProviderRow> = wallets.registry().list().iter().map(ProviderRow::from).collect();
	let message = providers.is_empty().then_some(NO_WALLET_MESSAGE);
	Ok(ProvidersData { providers, message })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::ProviderEntry;

	#[tokio::test]
	async fn empty_config_reports_no_wallet() {
		let data = run(&Config::default()).unwrap();
		assert!(data.providers.is_empty());
		assert_eq!(data.message, Some(NO_WALLET_MESSAGE));
	}

	#[tokio::test]
	async fn rows_are_sorted_and_marked() {
		let config = Config {
			providers: vec![
				ProviderEntry {
					uuid: "z".into(),
					name: "Zed".into(),
					rdns: "io.zed".into(),
					rpc_url: "http://127.0.0.1:1".into(),
					..Default::default()
				},
				ProviderEntry {
					uuid: "b".into(),
					name: "Brave".into(),
					rpc_url: "http://127.0.0.1:1".into(),
					..Default::default()
				},
			],
			..Default::default()
		};
		let data = run(&config).unwrap();

		let uuids: Vec<_> = data.providers.iter().map(|row| row.uuid.as_str()).collect();
		assert_eq!(uuids, ["b", "z"]);
		assert!(data.providers.iter().all(|row| !row.legacy));
		assert_eq!(data.message, None);

		let json = serde_json::to_value(&data).unwrap();
		assert!(json["providers"][0].get("rdns").is_none());
		assert_eq!(json["providers"][1]["rdns"], "io.zed");
	}
}
