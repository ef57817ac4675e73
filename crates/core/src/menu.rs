//! View-model of the "Connect Wallet" control.
//!
//! Holds only presentation state (menu open, error visibility); everything
//! else is read from the [`ProviderRegistry`] and the [`WalletSession`].

use std::sync::Arc;

use parking_lot::Mutex;
use walletlink_protocol::{INJECTED_WALLET_NAME, shorten_address};

use crate::error::{ConnectionError, Result};
use crate::registry::{ProviderDetail, ProviderRegistry};
use crate::session::{ConnectOutcome, WalletSession};

/// Button label while no account is connected.
pub const CONNECT_LABEL: &str = "Connect Wallet";
/// Shown in place of entries when the registry is empty.
pub const NO_WALLET_MESSAGE: &str = "No injected wallet detected.";

#[derive(Debug, Default)]
struct MenuState {
	open: bool,
	error_hidden: bool,
}

pub struct WalletMenu {
	registry: Arc<ProviderRegistry>,
	session: WalletSession,
	state: Mutex<MenuState>,
}

impl WalletMenu {
	pub fn new(registry: Arc<ProviderRegistry>, session: WalletSession) -> Self {
		Self {
			registry,
			session,
			state: Mutex::new(MenuState::default()),
		}
	}

	pub fn session(&self) -> &WalletSession {
		&self.session
	}

	pub fn registry(&self) -> &Arc<ProviderRegistry> {
		&self.registry
	}

	pub fn is_open(&self) -> bool {
		self.state.lock().open
	}

	/// Shortened address when connected, otherwise [`CONNECT_LABEL`].
	pub fn label(&self) -> String {
		match self.session.address() {
			Some(address) if self.session.is_connected() => shorten_address(&address),
			_ => CONNECT_LABEL.to_string(),
		}
	}

	/// Button press: toggles the menu while connected, otherwise clears the
	/// displayed error and opens the provider list.
	pub fn click(&self) {
		let connected = self.session.is_connected();
		let mut state = self.state.lock();
		if connected {
			state.open = !state.open;
		} else {
			state.error_hidden = true;
			state.open = true;
		}
	}

	/// Escape key or a click outside the menu.
	pub fn dismiss(&self) {
		self.state.lock().open = false;
	}

	/// Picks a provider from the list and connects to it.
	///
	/// A failure that is still current reopens the menu so the error shows
	/// next to the list.
	pub async fn select(&self, uuid: &str) -> Result<ConnectOutcome> {
		let detail = self.registry.get(uuid)?;
		self.state.lock().open = false;

		let outcome = self.session.connect(&detail).await;
		if let ConnectOutcome::Failed(_) = outcome {
			let mut state = self.state.lock();
			state.open = true;
			state.error_hidden = false;
		}
		Ok(outcome)
	}

	/// "Clear connection".
	pub fn disconnect(&self) {
		self.state.lock().open = false;
		self.session.disconnect();
	}

	/// Error to render inline above the provider list.
	pub fn error(&self) -> Option<ConnectionError> {
		if self.state.lock().error_hidden {
			return None;
		}
		self.session.last_error()
	}

	pub fn entries(&self) -> Vec<ProviderDetail> {
		self.registry.list()
	}

	/// Name of the provider the session is using.
	pub fn active_provider_name(&self) -> String {
		self.session
			.active_provider()
			.map(|info| info.name)
			.filter(|name| !name.is_empty())
			.unwrap_or_else(|| INJECTED_WALLET_NAME.to_string())
	}
}
