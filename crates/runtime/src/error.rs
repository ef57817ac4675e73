//! Error types for provider round trips.

use thiserror::Error;
use walletlink_protocol::{RpcError, codes};

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a provider request can produce.
#[derive(Debug, Error)]
pub enum Error {
	/// The provider answered with an EIP-1193 / JSON-RPC error object.
	#[error("Provider error: {0}")]
	Rpc(RpcError),

	/// The request never reached the provider or its answer never came back.
	#[error("Transport error: {0}")]
	Transport(String),

	/// The provider answered with something that is not a usable response.
	#[error("Invalid provider response: {0}")]
	InvalidResponse(String),

	/// Timeout waiting for the provider.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// The provider went away while the request was pending.
	#[error("Provider closed")]
	Closed,
}

impl From<RpcError> for Error {
	fn from(err: RpcError) -> Self {
		Error::Rpc(err)
	}
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			Error::Timeout(err.to_string())
		} else if err.is_decode() {
			Error::InvalidResponse(err.to_string())
		} else {
			Error::Transport(err.to_string())
		}
	}
}

impl Error {
	/// Returns the provider error code if this is an RPC error.
	pub fn rpc_code(&self) -> Option<i64> {
		match self {
			Error::Rpc(err) => Some(err.code),
			_ => None,
		}
	}

	/// Returns true if the user explicitly declined the request.
	pub fn is_user_rejection(&self) -> bool {
		match self {
			Error::Rpc(err) => err.is_user_rejection(),
			other => other.to_string().to_lowercase().contains("user rejected"),
		}
	}

	/// Returns true if the provider does not know the requested method.
	pub fn is_method_not_found(&self) -> bool {
		matches!(self.rpc_code(), Some(codes::METHOD_NOT_FOUND) | Some(codes::UNSUPPORTED_METHOD))
	}

	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejection_by_code() {
		let err = Error::from(RpcError::user_rejected());
		assert!(err.is_user_rejection());
		assert_eq!(err.rpc_code(), Some(codes::USER_REJECTED_REQUEST));
	}

	#[test]
	fn rejection_by_transport_message() {
		let err = Error::Transport("User rejected the connection".into());
		assert!(err.is_user_rejection());
		assert!(!Error::Transport("connection refused".into()).is_user_rejection());
	}

	#[test]
	fn method_not_found_codes() {
		assert!(Error::from(RpcError::method_not_found("eth_requestAccounts")).is_method_not_found());
		assert!(Error::from(RpcError::new(codes::UNSUPPORTED_METHOD, "nope")).is_method_not_found());
		assert!(!Error::Closed.is_method_not_found());
	}
}
