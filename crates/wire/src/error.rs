//! Error types for frame encoding and version negotiation.

use thiserror::Error;

/// Errors raised by the write-back protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
	/// The payload could not be (de)serialized.
	#[error("codec error: {0}")]
	Codec(#[from] postcard::Error),
	/// The frame does not start with the protocol magic.
	#[error("not a write-back frame")]
	BadMagic,
	/// The frame or offer names a version this build does not know.
	#[error("unsupported protocol version {0}")]
	UnsupportedVersion(u32),
	/// The engine requires a newer protocol than this build supports.
	#[error("incompatible host: engine requires protocol >= {required}, this build supports <= {supported}")]
	IncompatibleHost {
		/// Minimum version the engine accepts.
		required: u32,
		/// Maximum version this build speaks.
		supported: u32,
	},
	/// The payload kind is not allowed under the frame's version.
	#[error("{kind} payload not allowed under protocol version {version}")]
	ModeMismatch {
		/// Frame version.
		version: u32,
		/// Payload kind.
		kind: &'static str,
	},
}

/// Result type for wire operations.
pub type Result<T> = std::result::Result<T, WireError>;
