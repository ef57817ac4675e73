//! walletlink: injected wallet discovery and race-safe connection sessions
//!
//! This crate is the connection manager a dapp puts in front of the chain:
//!
//! - [`ProviderRegistry`] collects wallets announced through the EIP-6963
//!   handshake, dedups them by id and lists them sorted by name, falling back to
//!   the legacy injected provider when nothing was announced
//! - [`WalletSession`] owns the single active connection and gates every async
//!   result on a generation counter, so overlapping connects, disconnect during
//!   connect and provider swaps never leave stale state or stray listeners
//! - an event bridge ties the active provider's `accountsChanged` and
//!   `chainChanged` notifications to the session for one generation
//! - [`WalletMenu`] is the "Connect Wallet" control's view-model
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use walletlink::{ProviderRegistry, WalletSession};
//!
//! let registry = Arc::new(ProviderRegistry::new(None));
//! registry.announce(info, provider);
//!
//! let session = WalletSession::new();
//! let mut events = session.events();
//! let detail = registry.get(&info.uuid)?;
//! match session.connect(&detail).await {
//!     ConnectOutcome::Connected(snapshot) => println!("{:?}", snapshot.address),
//!     ConnectOutcome::Failed(err) => eprintln!("{err}"),
//!     ConnectOutcome::Stale => {}
//! }
//! ```

mod bridge;
pub mod error;
pub mod events;
pub mod menu;
pub mod registry;
pub mod session;

pub use error::{CONNECTION_FAILED_MESSAGE, ConnectionError, Error, Result, USER_REJECTED_MESSAGE};
pub use events::{DisconnectReason, EventStream, EventWaiter, SessionEvent};
pub use menu::{CONNECT_LABEL, NO_WALLET_MESSAGE, WalletMenu};
pub use registry::{LEGACY_PROVIDER_RDNS, LEGACY_PROVIDER_UUID, ProviderDetail, ProviderRegistry};
pub use session::{ConnectOutcome, ConnectionStatus, DEFAULT_EVENT_CAPACITY, SessionConfig, SessionSnapshot, WalletSession};
pub use walletlink_protocol as protocol;
pub use walletlink_runtime as runtime;
