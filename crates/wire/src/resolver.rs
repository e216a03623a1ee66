//! Bind-time protocol negotiation.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::codec::Codec;
use crate::error::{Result, WireError};
use crate::frame::ProtocolVersion;

/// Protocol range the engine announces when binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOffer {
	/// Newest version the engine speaks.
	pub protocol_version: u32,
	/// Oldest version the engine accepts.
	pub min_protocol_version: u32,
}

impl Default for ConnectOffer {
	fn default() -> Self {
		Self {
			protocol_version: ProtocolVersion::LATEST.0,
			min_protocol_version: 0,
		}
	}
}

/// Picks the [`Codec`] for each engine that binds.
///
/// The table of codecs this build speaks is fixed when the resolver is
/// created. Every offer is negotiated on its own, so an engine rebinding after
/// a lost connection may settle on a different version than its predecessor.
#[derive(Debug)]
pub struct CodecResolver {
	supported: ProtocolVersion,
	codecs: Vec<Codec>,
}

impl CodecResolver {
	/// Creates a resolver for builds speaking up to `supported`.
	///
	/// Versions above [`ProtocolVersion::LATEST`] are clamped.
	pub fn new(supported: ProtocolVersion) -> Self {
		let supported = supported.min(ProtocolVersion::LATEST);
		let codecs = (0..=supported.0)
			.filter_map(|v| Codec::for_version(ProtocolVersion(v)).ok())
			.collect();
		Self { supported, codecs }
	}

	/// Newest version this resolver will negotiate.
	pub fn supported(&self) -> ProtocolVersion {
		self.supported
	}

	/// Negotiates `offer` and returns the codec for the agreed version.
	pub fn resolve(&self, offer: &ConnectOffer) -> Result<Codec> {
		let resolved = negotiate(self.supported, offer).and_then(|version| {
			self.codecs
				.get(version.0 as usize)
				.copied()
				.ok_or(WireError::UnsupportedVersion(version.0))
		});
		match &resolved {
			Ok(codec) => info!(version = %codec.version(), offered = offer.protocol_version, "write-back protocol resolved"),
			Err(e) => error!(error = %e, offered = offer.protocol_version, "write-back protocol resolution failed"),
		}
		resolved
	}
}

impl Default for CodecResolver {
	fn default() -> Self {
		Self::new(ProtocolVersion::LATEST)
	}
}

fn negotiate(supported: ProtocolVersion, offer: &ConnectOffer) -> Result<ProtocolVersion> {
	if offer.min_protocol_version > supported.0 {
		return Err(WireError::IncompatibleHost {
			required: offer.min_protocol_version,
			supported: supported.0,
		});
	}
	Ok(ProtocolVersion(offer.protocol_version.min(supported.0)))
}
