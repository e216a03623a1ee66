//! Per-version write-back encoders.

use std::fmt;

use nevo_record::{MutableEnvelope, WriteBack};
use tracing::debug;

use crate::error::{Result, WireError};
use crate::frame::{DeltaV1, DeltaV2, FullRecord, OverrideGroupChange, Payload, ProtocolVersion, TagMarker, encode};

/// Outcome of encoding one decorated envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
	/// Nothing to send back; the engine keeps its record.
	Unchanged,
	/// A full-record frame.
	Full(Vec<u8>),
	/// A delta frame.
	Incremental(Vec<u8>),
}

impl Encoded {
	/// Frame bytes, if any.
	pub fn bytes(&self) -> Option<&[u8]> {
		match self {
			Self::Unchanged => None,
			Self::Full(bytes) | Self::Incremental(bytes) => Some(bytes),
		}
	}

	/// Short name of the encoding, for logs.
	pub fn mode(&self) -> &'static str {
		match self {
			Self::Unchanged => "unchanged",
			Self::Full(_) => "full",
			Self::Incremental(_) => "incremental",
		}
	}
}

/// Builds a delta payload, or `None` when the change cannot be expressed as one.
type DeltaEncoder = fn(&MutableEnvelope) -> Option<Payload>;

/// The encoder set of one negotiated protocol version.
#[derive(Clone, Copy)]
pub struct Codec {
	version: ProtocolVersion,
	delta: Option<DeltaEncoder>,
}

impl Codec {
	/// Looks up the encoders for `version`.
	pub fn for_version(version: ProtocolVersion) -> Result<Self> {
		let delta: Option<DeltaEncoder> = match version.0 {
			0 => None,
			1 => Some(encode_v1 as DeltaEncoder),
			2 => Some(encode_v2 as DeltaEncoder),
			other => return Err(WireError::UnsupportedVersion(other)),
		};
		Ok(Self { version, delta })
	}

	/// Negotiated version.
	pub fn version(&self) -> ProtocolVersion {
		self.version
	}

	/// Whether this codec can produce deltas.
	pub fn supports_incremental(&self) -> bool {
		self.delta.is_some()
	}

	/// Encodes `envelope` according to its write-back mode.
	///
	/// Incremental write-back falls back to a full record when this version has
	/// no delta encoding or the delta cannot express the change.
	pub fn encode(&self, envelope: &MutableEnvelope) -> Result<Encoded> {
		match envelope.write_back() {
			WriteBack::Skip => Ok(Encoded::Unchanged),
			WriteBack::Full => self.encode_full(envelope),
			WriteBack::Incremental => match self.delta.and_then(|delta| delta(envelope)) {
				Some(payload) => Ok(Encoded::Incremental(encode(self.version, &payload)?)),
				None => {
					debug!(key = %envelope.original_key(), version = %self.version, "falling back to full write-back");
					self.encode_full(envelope)
				}
			},
		}
	}

	/// Encodes `envelope` as a full record.
	pub fn encode_full(&self, envelope: &MutableEnvelope) -> Result<Encoded> {
		let payload = Payload::Full(Box::new(FullRecord {
			posted: envelope.to_posted(),
			original_tag: envelope.original_tag().map(str::to_owned),
			original_id: envelope.original_id(),
			original_key: envelope.original_key().to_owned(),
		}));
		Ok(Encoded::Full(encode(self.version, &payload)?))
	}
}

impl fmt::Debug for Codec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Codec")
			.field("version", &self.version)
			.field("incremental", &self.supports_incremental())
			.finish()
	}
}

fn delta_v1(envelope: &MutableEnvelope) -> DeltaV1 {
	let notification = envelope.notification();
	DeltaV1 {
		tag: TagMarker::from_override(envelope.tag_override()),
		id: envelope.id_override(),
		fields: notification.field_changes(),
		extras: notification.extras_diff().into_iter().collect(),
	}
}

fn encode_v1(envelope: &MutableEnvelope) -> Option<Payload> {
	if envelope.override_group_marker().is_some() {
		return None;
	}
	Some(Payload::DeltaV1(delta_v1(envelope)))
}

fn encode_v2(envelope: &MutableEnvelope) -> Option<Payload> {
	let override_group = envelope.override_group_marker().map(|original| OverrideGroupChange {
		original: original.map(str::to_owned),
		value: envelope.override_group_key().map(str::to_owned),
	});
	Some(Payload::DeltaV2(DeltaV2 {
		base: delta_v1(envelope),
		override_group,
	}))
}
