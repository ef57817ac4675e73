//! Wire types for injected wallet providers.
//!
//! This crate contains the serde-serializable shapes exchanged with wallet
//! providers: the EIP-6963 discovery records, EIP-1193 request arguments and
//! error objects, the JSON-RPC 2.0 envelope used by HTTP providers, and the
//! notification channel names.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: no I/O, no async
//! - **Lenient on input**: provider payloads are untrusted, so the parsing
//!   helpers in [`chain`] return `None` instead of failing
//! - **Stable**: changes only when the wire conventions change
//!
//! The provider capability itself and the session state machine live in
//! `walletlink-runtime` and `walletlink`.

pub mod chain;
pub mod discovery;
pub mod rpc;
pub mod types;

pub use chain::*;
pub use discovery::*;
pub use rpc::*;
pub use types::*;
