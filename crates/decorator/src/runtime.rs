//! Process-wide decorator state.

use nevo_record::HostFeatures;
use nevo_wire::CodecResolver;

use crate::config::DecoratorConfig;
use crate::error::ConfigError;
use crate::peer::TrustPolicy;

/// State shared by every endpoint of one decorator process.
///
/// Holds the trust policy and the write-back codec table. Each bind
/// negotiates its own version against the table, so a process should create
/// one runtime at startup and share it across reconnects.
#[derive(Debug)]
pub struct DecoratorRuntime {
	config: DecoratorConfig,
	trust: TrustPolicy,
	features: HostFeatures,
	resolver: CodecResolver,
}

impl DecoratorRuntime {
	/// Builds the runtime from `config`.
	pub fn new(config: DecoratorConfig) -> Result<Self, ConfigError> {
		let trust = TrustPolicy::new(config.own_uid, config.trusted_digests()?);
		Ok(Self {
			features: HostFeatures::for_platform_level(config.platform_level),
			resolver: CodecResolver::new(config.protocol_ceiling()),
			trust,
			config,
		})
	}

	/// Decorator name.
	pub fn name(&self) -> &str {
		&self.config.name
	}

	/// Configuration the runtime was built from.
	pub fn config(&self) -> &DecoratorConfig {
		&self.config
	}

	/// Caller trust policy.
	pub fn trust(&self) -> &TrustPolicy {
		&self.trust
	}

	/// Host features.
	pub fn features(&self) -> HostFeatures {
		self.features
	}

	/// Write-back codec resolver.
	pub fn resolver(&self) -> &CodecResolver {
		&self.resolver
	}
}
