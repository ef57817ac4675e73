use std::path::PathBuf;

use thiserror::Error;
use walletlink::ConnectionError;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("config error in {}: {message}", .path.display())]
	Config { path: PathBuf, message: String },

	#[error("unknown wallet provider: {0}")]
	UnknownProvider(String),

	/// A connect attempt that failed while current.
	#[error("{0}")]
	Connection(ConnectionError),

	#[error(transparent)]
	Provider(#[from] walletlink_runtime::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl From<walletlink::Error> for CliError {
	fn from(err: walletlink::Error) -> Self {
		match err {
			walletlink::Error::UnknownProvider(id) => CliError::UnknownProvider(id),
			walletlink::Error::Provider(err) => CliError::Provider(err),
			other => CliError::Anyhow(anyhow::Error::new(other)),
		}
	}
}

impl CliError {
	pub fn config(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
		CliError::Config {
			path: path.into(),
			message: message.to_string(),
		}
	}

	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, message, details) = match self {
			CliError::Config { path, message } => (
				ErrorCode::ConfigError,
				self.to_string(),
				Some(serde_json::json!({ "path": path, "reason": message })),
			),
			CliError::UnknownProvider(id) => (
				ErrorCode::UnknownProvider,
				format!("No wallet provider with id {id}. Run `wl providers` to list them."),
				Some(serde_json::json!({ "id": id })),
			),
			CliError::Connection(err) => {
				let code = if err.is_user_rejection() {
					ErrorCode::ConnectionRejected
				} else {
					ErrorCode::ConnectionFailed
				};
				(code, err.to_string(), Some(serde_json::json!({ "detail": err.detail() })))
			}
			CliError::Provider(err) => {
				let code = if err.is_timeout() {
					ErrorCode::Timeout
				} else {
					ErrorCode::ProviderError
				};
				(code, err.to_string(), err.rpc_code().map(|rpc| serde_json::json!({ "rpcCode": rpc })))
			}
			CliError::Io(err) => (ErrorCode::IoError, err.to_string(), None),
			CliError::Json(err) => (ErrorCode::InternalError, format!("JSON error: {err}"), None),
			CliError::Anyhow(err) => (ErrorCode::InternalError, format!("{err:#}"), None),
		};

		CommandError { code, message, details }
	}
}

#[cfg(test)]
mod tests {
	use walletlink_protocol::RpcError;

	use super::*;

	#[test]
	fn rejection_maps_to_rejected_code() {
		let err = CliError::Connection(ConnectionError::classify(&RpcError::user_rejected().into()));
		let command_error = err.to_command_error();
		assert_eq!(command_error.code, ErrorCode::ConnectionRejected);
		assert_eq!(command_error.message, walletlink::USER_REJECTED_MESSAGE);
	}

	#[test]
	fn unknown_provider_from_session_error() {
		let err: CliError = walletlink::Error::UnknownProvider("nope".into()).into();
		assert!(matches!(err, CliError::UnknownProvider(ref id) if id == "nope"));
		assert_eq!(err.to_command_error().details.unwrap()["id"], "nope");
	}

	#[test]
	fn provider_rpc_code_in_details() {
		let err = CliError::Provider(RpcError::new(-32601, "method not found").into());
		let command_error = err.to_command_error();
		assert_eq!(command_error.code, ErrorCode::ProviderError);
		assert_eq!(command_error.details.unwrap()["rpcCode"], -32601);
	}

	#[test]
	fn config_error_names_path() {
		let err = CliError::config("/tmp/wl.json", "expected value");
		assert_eq!(err.to_string(), "config error in /tmp/wl.json: expected value");
		assert_eq!(err.to_command_error().code, ErrorCode::ConfigError);
	}
}
