//! Error types crossing and surrounding the dispatch boundary.

use std::fmt;
use std::path::PathBuf;

use nevo_wire::WireError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error categories that may cross the process boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteErrorKind {
	/// Permission or identity violation.
	Security,
	/// A payload could not be read.
	BadPayload,
	/// An argument was out of range or malformed.
	IllegalArgument,
	/// A required value was missing.
	NullReference,
	/// The call was made in a state that does not allow it.
	IllegalState,
	/// A blocking call was made where blocking is forbidden.
	BlockingCall,
	/// The operation is not supported.
	Unsupported,
}

impl RemoteErrorKind {
	/// Stable name of the kind.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Security => "security",
			Self::BadPayload => "bad-payload",
			Self::IllegalArgument => "illegal-argument",
			Self::NullReference => "null-reference",
			Self::IllegalState => "illegal-state",
			Self::BlockingCall => "blocking-call",
			Self::Unsupported => "unsupported",
		}
	}
}

impl fmt::Display for RemoteErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The only error shape sent back to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct RemoteError {
	/// Category.
	pub kind: RemoteErrorKind,
	/// Human readable description.
	pub message: String,
}

impl RemoteError {
	/// Creates a remote error.
	pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
		}
	}
}

/// Errors returned by decorator implementations.
///
/// The named variants pass through to the engine unchanged. Anything else
/// arrives as [`RemoteErrorKind::IllegalState`].
#[derive(Debug, Error)]
pub enum DecoratorFault {
	/// Permission or identity violation.
	#[error("security violation: {0}")]
	Security(String),
	/// A payload could not be read.
	#[error("bad payload: {0}")]
	BadPayload(String),
	/// An argument was out of range or malformed.
	#[error("illegal argument: {0}")]
	IllegalArgument(String),
	/// A required value was missing.
	#[error("missing value: {0}")]
	NullReference(String),
	/// Wrong state for the operation.
	#[error("illegal state: {0}")]
	IllegalState(String),
	/// A blocking call was made where blocking is forbidden.
	#[error("blocking call: {0}")]
	BlockingCall(String),
	/// The operation is not supported.
	#[error("unsupported: {0}")]
	Unsupported(String),
	/// Any other failure.
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl DecoratorFault {
	/// Maps this fault onto the error sent to the engine.
	pub fn into_remote(self) -> RemoteError {
		let (kind, message) = match self {
			Self::Security(m) => (RemoteErrorKind::Security, m),
			Self::BadPayload(m) => (RemoteErrorKind::BadPayload, m),
			Self::IllegalArgument(m) => (RemoteErrorKind::IllegalArgument, m),
			Self::NullReference(m) => (RemoteErrorKind::NullReference, m),
			Self::IllegalState(m) => (RemoteErrorKind::IllegalState, m),
			Self::BlockingCall(m) => (RemoteErrorKind::BlockingCall, m),
			Self::Unsupported(m) => (RemoteErrorKind::Unsupported, m),
			Self::Other(e) => (RemoteErrorKind::IllegalState, format!("{e:#}")),
		};
		RemoteError { kind, message }
	}
}

/// Errors returned by the dispatch endpoint to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
	/// The caller failed identity verification.
	#[error("unauthorized caller: {0}")]
	Unauthorized(String),
	/// A call arrived before a successful bind.
	#[error("decorator is not connected")]
	NotConnected,
	/// A second bind arrived on a bound endpoint.
	#[error("decorator is already connected")]
	AlreadyConnected,
	/// No write-back protocol is shared with the engine.
	#[error("incompatible host: {0}")]
	IncompatibleHost(WireError),
	/// The decorated record could not be encoded.
	#[error("write-back failed: {0}")]
	Encode(WireError),
	/// Decorator logic failed.
	#[error("decorator failed: {0}")]
	Fault(#[from] RemoteError),
}

impl DispatchError {
	/// The cross-process form of this error.
	pub fn to_remote(&self) -> RemoteError {
		match self {
			Self::Unauthorized(m) => RemoteError::new(RemoteErrorKind::Security, m.clone()),
			Self::Fault(e) => e.clone(),
			other => RemoteError::new(RemoteErrorKind::IllegalState, other.to_string()),
		}
	}
}

/// Errors reported by the engine's controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
	/// The engine connection is gone.
	#[error("controller disconnected")]
	Disconnected,
	/// The engine rejected the request.
	#[error("controller rejected request: {0}")]
	Rejected(String),
}

/// Errors loading decorator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML.
	#[error("config parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A trusted signature is not a hex digest.
	#[error("invalid signature digest: {0}")]
	InvalidSignature(String),

	/// The configured protocol version is unknown.
	#[error("unsupported protocol version in config: {0}")]
	UnsupportedVersion(u32),
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
