//! Error types for wallet sessions.
//!
//! Connect failures are never returned to the caller as `Err`: they are
//! classified into a [`ConnectionError`] and stored on the session as its last
//! error. [`Error`] covers the remaining fallible calls (lookups, waiters).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// User-facing message for a declined account request.
pub const USER_REJECTED_MESSAGE: &str = "Connection request was rejected.";
/// User-facing message for every other connect failure.
pub const CONNECTION_FAILED_MESSAGE: &str = "Wallet connection was cancelled or failed.";

/// Why the last connect attempt failed.
///
/// `Display` yields the message shown to the user; [`detail`](Self::detail)
/// keeps the provider's own wording for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConnectionError {
	/// The account request was explicitly declined.
	#[error("Connection request was rejected.")]
	UserRejected { detail: String },

	/// Any other failure during account or network resolution.
	#[error("Wallet connection was cancelled or failed.")]
	ConnectionFailed { detail: String },
}

impl ConnectionError {
	/// Classifies a provider error: code 4001 or "user rejected" wording is a
	/// rejection, everything else a generic failure.
	pub fn classify(err: &walletlink_runtime::Error) -> Self {
		if err.is_user_rejection() {
			ConnectionError::UserRejected { detail: err.to_string() }
		} else {
			ConnectionError::ConnectionFailed { detail: err.to_string() }
		}
	}

	pub fn failed(detail: impl Into<String>) -> Self {
		ConnectionError::ConnectionFailed { detail: detail.into() }
	}

	/// The provider's own description of the failure.
	pub fn detail(&self) -> &str {
		match self {
			ConnectionError::UserRejected { detail } | ConnectionError::ConnectionFailed { detail } => detail,
		}
	}

	pub fn is_user_rejection(&self) -> bool {
		matches!(self, ConnectionError::UserRejected { .. })
	}
}

/// Errors returned by registry lookups and event waiters.
#[derive(Debug, Error)]
pub enum Error {
	/// No provider with this id is announced (and it is not the legacy fallback).
	#[error("Unknown wallet provider: {0}")]
	UnknownProvider(String),

	/// Timeout waiting for a session event.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// The event source was dropped.
	#[error("Event channel closed")]
	ChannelClosed,

	/// Provider round trip failed outside a connect attempt.
	#[error(transparent)]
	Provider(#[from] walletlink_runtime::Error),
}
