//! Error types for record identity handling.

use thiserror::Error;

/// Errors raised while parsing identity keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
	/// The key does not have the `user|package|id|tag|uid` shape.
	#[error("malformed notification key: {0}")]
	Malformed(String),
	/// A numeric component could not be parsed.
	#[error("invalid {component} in notification key: {key}")]
	InvalidNumber {
		/// Which component failed (`user`, `id` or `uid`).
		component: &'static str,
		/// The full key.
		key: String,
	},
}

/// Result type for record operations.
pub type Result<T> = std::result::Result<T, KeyError>;
