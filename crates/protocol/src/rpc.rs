//! JSON-RPC 2.0 envelopes and EIP-1193 provider error objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// EIP-1193 and JSON-RPC error codes the connection flow cares about.
pub mod codes {
	/// The user rejected the request.
	pub const USER_REJECTED_REQUEST: i64 = 4001;
	/// The requested method or account has not been authorized by the user.
	pub const UNAUTHORIZED: i64 = 4100;
	/// The provider does not support the requested method.
	pub const UNSUPPORTED_METHOD: i64 = 4200;
	/// The provider is disconnected from all chains.
	pub const DISCONNECTED: i64 = 4900;
	/// The provider is not connected to the requested chain.
	pub const CHAIN_DISCONNECTED: i64 = 4901;
	/// JSON-RPC: method does not exist.
	pub const METHOD_NOT_FOUND: i64 = -32601;
	/// JSON-RPC: internal error.
	pub const INTERNAL_ERROR: i64 = -32603;
}

pub const JSONRPC_VERSION: &str = "2.0";

/// Error object returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

impl RpcError {
	pub fn new(code: i64, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
			data: None,
		}
	}

	/// The canonical "user rejected the request" error.
	pub fn user_rejected() -> Self {
		Self::new(codes::USER_REJECTED_REQUEST, "User rejected the request.")
	}

	/// The canonical "method not found" error for `method`.
	pub fn method_not_found(method: &str) -> Self {
		Self::new(codes::METHOD_NOT_FOUND, format!("the method {method} does not exist/is not available"))
	}

	/// Returns `true` for an explicit user rejection, by code or wording.
	pub fn is_user_rejection(&self) -> bool {
		self.code == codes::USER_REJECTED_REQUEST || self.message.to_lowercase().contains("user rejected")
	}
}

impl std::fmt::Display for RpcError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} (code {})", self.message, self.code)
	}
}

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
	pub jsonrpc: String,
	pub id: u64,
	pub method: String,
	#[serde(default)]
	pub params: Value,
}

impl RpcRequest {
	/// Builds a request; missing params are sent as an empty positional list.
	pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
		Self {
			jsonrpc: JSONRPC_VERSION.to_string(),
			id,
			method: method.into(),
			params: params.unwrap_or_else(|| Value::Array(Vec::new())),
		}
	}
}

/// A JSON-RPC 2.0 response. Exactly one of `result` / `error` is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
	#[serde(default)]
	pub jsonrpc: Option<String>,
	#[serde(default)]
	pub id: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<RpcError>,
}

impl RpcResponse {
	pub fn success(id: u64, result: Value) -> Self {
		Self {
			jsonrpc: Some(JSONRPC_VERSION.to_string()),
			id: Some(id),
			result: Some(result),
			error: None,
		}
	}

	pub fn failure(id: u64, error: RpcError) -> Self {
		Self {
			jsonrpc: Some(JSONRPC_VERSION.to_string()),
			id: Some(id),
			result: None,
			error: Some(error),
		}
	}
}
