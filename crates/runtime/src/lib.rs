//! Wallet provider runtime - provider capability, listeners and transports
//!
//! This crate provides the layer between wallet providers and the connection
//! session:
//!
//! - **Provider**: the EIP-1193 capability (`request`, `on`, `remove_listener`)
//! - **Listeners**: per-channel listener registry and RAII [`Subscription`]s
//! - **HTTP transport**: a JSON-RPC provider for Ethereum-compatible nodes, with
//!   a polling watcher standing in for push notifications
//! - **Testing**: a scripted provider with deferred replies (feature `testing`)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  walletlink  │  Registry, session, event bridge
//! └──────┬───────┘
//!        │ holds ProviderHandle, owns Subscriptions
//! ┌──────▼───────┐
//! │   runtime    │  This crate
//! │  ┌────────┐  │
//! │  │Provider│  │  request / on / remove_listener
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │  HTTP  │  │  JSON-RPC + polling watcher
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod error;
pub mod handlers;
pub mod http;
pub mod provider;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Error, Result};
pub use handlers::{HandlerId, Listener, ListenerRegistry, Subscription, next_handler_id};
pub use http::{HttpProvider, HttpProviderOptions, WatchState, Watcher};
pub use provider::{Provider, ProviderFuture, ProviderHandle, subscribe};
