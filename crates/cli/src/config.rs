//! Wallet provider configuration.
//!
//! The user config lives at `$XDG_CONFIG_HOME/walletlink/config.json` (or
//! whatever `--config` names). A project config at
//! `./.walletlink/config.json` is merged on top: providers replace entries
//! with the same id or are appended, scalar settings override when present.
//! `WALLETLINK_LEGACY_RPC_URL` supplies a legacy provider when neither file
//! configures one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use walletlink_protocol::{ProviderFlags, ProviderInfo};

use crate::error::{CliError, Result};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const CONFIG_DIR: &str = "walletlink";
pub const CONFIG_FILE: &str = "config.json";
pub const PROJECT_DIR: &str = ".walletlink";
pub const LEGACY_RPC_URL_ENV: &str = "WALLETLINK_LEGACY_RPC_URL";
/// Poll interval for providers that do not set one.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
	pub schema: u32,
	pub providers: Vec<ProviderEntry>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub legacy: Option<ProviderEntry>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub connect_timeout_ms: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub request_timeout_ms: Option<u64>,
}

/// One wallet reachable over JSON-RPC.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderEntry {
	pub uuid: String,
	pub name: String,
	pub rdns: String,
	pub icon: String,
	pub rpc_url: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub poll_interval_ms: Option<u64>,
	pub is_meta_mask: bool,
	pub is_coinbase_wallet: bool,
}

impl ProviderEntry {
	pub fn legacy(rpc_url: impl Into<String>) -> Self {
		Self {
			rpc_url: rpc_url.into(),
			..Default::default()
		}
	}

	pub fn info(&self) -> ProviderInfo {
		ProviderInfo::new(self.uuid.clone(), self.name.clone())
			.with_rdns(self.rdns.clone())
			.with_icon(self.icon.clone())
	}

	pub fn flags(&self) -> ProviderFlags {
		ProviderFlags {
			is_meta_mask: self.is_meta_mask,
			is_coinbase_wallet: self.is_coinbase_wallet,
		}
	}

	pub fn poll_interval(&self) -> Duration {
		self.poll_interval_ms.map(Duration::from_millis).unwrap_or(DEFAULT_POLL_INTERVAL)
	}
}

impl Config {
	/// Loads the effective config: the explicit file (which must exist) or the
	/// user config (optional), then the project config under `cwd`, then the
	/// environment fallback.
	pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
		let mut config = match explicit {
			Some(path) => Self::read(path)?,
			None => match user_config_path() {
				Some(path) if path.is_file() => Self::read(&path)?,
				_ => Self::default(),
			},
		};

		let project = project_config_path(cwd);
		if project.is_file() {
			config.merge(Self::read(&project)?);
		}

		config.apply_legacy_env(std::env::var(LEGACY_RPC_URL_ENV).ok());
		Ok(config)
	}

	/// Reads and validates one config file.
	pub fn read(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path).map_err(|err| CliError::config(path, err))?;
		let config: Config = serde_json::from_str(&raw).map_err(|err| CliError::config(path, err))?;
		config.validate().map_err(|reason| CliError::config(path, reason))?;
		debug!(path = %path.display(), providers = config.providers.len(), "loaded config");
		Ok(config)
	}

	fn validate(&self) -> std::result::Result<(), String> {
		if self.schema > CONFIG_SCHEMA_VERSION {
			return Err(format!("unsupported schema {} (newest known is {CONFIG_SCHEMA_VERSION})", self.schema));
		}
		for entry in &self.providers {
			if entry.uuid.trim().is_empty() || entry.name.trim().is_empty() {
				return Err("every provider needs a uuid and a name".to_string());
			}
			if entry.rpc_url.trim().is_empty() {
				return Err(format!("provider {} has no rpcUrl", entry.uuid));
			}
		}
		if let Some(legacy) = &self.legacy {
			if legacy.rpc_url.trim().is_empty() {
				return Err("legacy provider has no rpcUrl".to_string());
			}
		}
		Ok(())
	}

	/// Layers `overlay` on top of `self`.
	pub fn merge(&mut self, overlay: Config) {
		self.schema = self.schema.max(overlay.schema);
		for entry in overlay.providers {
			match self.providers.iter_mut().find(|existing| existing.uuid == entry.uuid) {
				Some(existing) => *existing = entry,
				None => self.providers.push(entry),
			}
		}
		if overlay.legacy.is_some() {
			self.legacy = overlay.legacy;
		}
		if overlay.connect_timeout_ms.is_some() {
			self.connect_timeout_ms = overlay.connect_timeout_ms;
		}
		if overlay.request_timeout_ms.is_some() {
			self.request_timeout_ms = overlay.request_timeout_ms;
		}
	}

	/// Uses `rpc_url` as the legacy provider unless one is configured.
	pub fn apply_legacy_env(&mut self, rpc_url: Option<String>) {
		if self.legacy.is_some() {
			return;
		}
		if let Some(url) = rpc_url.filter(|url| !url.trim().is_empty()) {
			self.legacy = Some(ProviderEntry::legacy(url.trim()));
		}
	}

	pub fn connect_timeout(&self) -> Option<Duration> {
		self.connect_timeout_ms.map(Duration::from_millis)
	}

	pub fn request_timeout(&self) -> Option<Duration> {
		self.request_timeout_ms.map(Duration::from_millis)
	}
}

/// `$XDG_CONFIG_HOME/walletlink/config.json`, if a config dir is known.
pub fn user_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

pub fn project_config_path(cwd: &Path) -> PathBuf {
	cwd.join(PROJECT_DIR).join(CONFIG_FILE)
}
