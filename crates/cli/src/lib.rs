//! `wl`: wallet discovery and connection from the command line.
//!
//! Wallets are configured as JSON-RPC endpoints (see [`config`]). Each one is
//! announced into a [`walletlink::ProviderRegistry`] the way an injected
//! wallet answers a page's discovery request, and `wl connect` drives a
//! [`walletlink::WalletSession`] against the chosen entry.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod wallets;
