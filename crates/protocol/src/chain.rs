//! Lenient parsing of provider-reported chain ids and account lists.
//!
//! Providers report chain ids as numbers, hex quantities (`"0x38"`) or decimal
//! strings, and account lists as loosely typed arrays. Nothing here fails: an
//! unusable value becomes `None` and the caller decides what that means.

use serde_json::Value;

/// Largest integer exactly representable as an IEEE-754 double (2^53 - 1).
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Parses a chain id from a provider payload.
///
/// Accepts a non-negative integral number up to [`MAX_SAFE_INTEGER`], or a
/// string in `0x`-prefixed hex or plain decimal. Anything else yields `None`.
///
/// ```ignore
/// assert_eq!(parse_chain_id(&json!("0x38")), Some(56));
/// assert_eq!(parse_chain_id(&json!("56")), Some(56));
/// assert_eq!(parse_chain_id(&json!("bsc")), None);
/// ```
pub fn parse_chain_id(value: &Value) -> Option<u64> {
	match value {
		Value::Number(n) => {
			if let Some(v) = n.as_u64() {
				return (v <= MAX_SAFE_INTEGER).then_some(v);
			}
			if n.is_i64() {
				return None;
			}
			let f = n.as_f64()?;
			if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= MAX_SAFE_INTEGER as f64 {
				Some(f as u64)
			} else {
				None
			}
		}
		Value::String(s) => parse_chain_id_str(s),
		_ => None,
	}
}

/// Parses a chain id string: `0x`-prefixed hex or decimal, surrounding
/// whitespace ignored.
pub fn parse_chain_id_str(raw: &str) -> Option<u64> {
	let normalized = raw.trim();
	let parsed = match normalized.strip_prefix("0x") {
		Some(hex) => u64::from_str_radix(hex, 16).ok()?,
		None => normalized.parse::<u64>().ok()?,
	};
	(parsed <= MAX_SAFE_INTEGER).then_some(parsed)
}

/// Formats a chain id as the hex quantity providers emit (`56` -> `"0x38"`).
pub fn format_chain_id(chain_id: u64) -> String {
	format!("{chain_id:#x}")
}

/// Returns the primary account of a provider account list.
///
/// The list is usable only when it is an array whose first element is a
/// non-empty string. Additional accounts are ignored.
pub fn primary_account(value: &Value) -> Option<String> {
	match value.as_array()?.first()? {
		Value::String(account) if !account.is_empty() => Some(account.clone()),
		_ => None,
	}
}

/// Shortens a hex address for display: `0x1234567890ab` -> `0x1234…90ab`.
///
/// Only applies to `0x` followed by at least eight hex digits; anything else is
/// returned trimmed but otherwise untouched.
pub fn shorten_address(address: &str) -> String {
	let normalized = address.trim();
	let is_hex_address = normalized
		.strip_prefix("0x")
		.is_some_and(|digits| digits.len() >= 8 && digits.chars().all(|c| c.is_ascii_hexdigit()));

	if !is_hex_address {
		return normalized.to_string();
	}

	let head = &normalized[..6];
	let tail = &normalized[normalized.len() - 4..];
	format!("{head}…{tail}")
}
