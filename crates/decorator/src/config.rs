//! Decorator configuration.

use std::path::Path;

use nevo_record::{LATEST_PLATFORM_LEVEL, PlatformLevel};
use nevo_wire::ProtocolVersion;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings of one decorator process.
///
/// ```toml
/// name = "big-text"
/// max_protocol_version = 2
/// platform_level = 29
/// trusted_signatures = ["9f1c2a3b4c5d6e7f"]
/// own_uid = 10123
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoratorConfig {
	/// Name used in logs.
	pub name: String,
	/// Newest write-back protocol this decorator negotiates.
	pub max_protocol_version: u32,
	/// Host platform level the setters are gated on.
	pub platform_level: PlatformLevel,
	/// Hex digests of trusted engine signing certificates.
	pub trusted_signatures: Vec<String>,
	/// Uid of this process; callers with the same uid are trusted.
	pub own_uid: Option<i32>,
}

impl Default for DecoratorConfig {
	fn default() -> Self {
		Self {
			name: "decorator".to_owned(),
			max_protocol_version: ProtocolVersion::LATEST.0,
			platform_level: LATEST_PLATFORM_LEVEL,
			trusted_signatures: Vec::new(),
			own_uid: None,
		}
	}
}

impl DecoratorConfig {
	/// Parses a TOML document.
	pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(source)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads and parses a TOML file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml(&source)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.max_protocol_version > ProtocolVersion::LATEST.0 {
			return Err(ConfigError::UnsupportedVersion(self.max_protocol_version));
		}
		self.trusted_digests().map(drop)
	}

	/// Trusted digests, parsed.
	pub fn trusted_digests(&self) -> Result<Vec<u64>, ConfigError> {
		self.trusted_signatures
			.iter()
			.map(|hex| u64::from_str_radix(hex, 16).map_err(|_| ConfigError::InvalidSignature(hex.clone())))
			.collect()
	}

	/// Newest protocol version, typed.
	pub fn protocol_ceiling(&self) -> ProtocolVersion {
		ProtocolVersion(self.max_protocol_version)
	}
}
