//! Frame layout: magic, little-endian version, postcard payload.

use std::collections::BTreeSet;
use std::fmt;

use nevo_record::{ExtraOp, FieldChange, PostedNotification};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WireError};

/// Magic bytes identifying a write-back frame.
pub const MAGIC: &[u8; 4] = b"NEVO";

/// A write-back protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ProtocolVersion(pub u32);

impl ProtocolVersion {
	/// Full records only.
	pub const FULL_ONLY: Self = Self(0);
	/// Deltas with tag/id markers and field changes.
	pub const INCREMENTAL: Self = Self(1);
	/// Deltas with the override-group marker; channel operations.
	pub const OVERRIDE_GROUP: Self = Self(2);
	/// Newest version this build speaks.
	pub const LATEST: Self = Self::OVERRIDE_GROUP;

	/// Whether deltas may be sent.
	pub fn supports_incremental(self) -> bool {
		self >= Self::INCREMENTAL
	}

	/// Whether deltas may carry a group override change.
	pub fn supports_override_group(self) -> bool {
		self >= Self::OVERRIDE_GROUP
	}

	/// Whether the engine serves notification channel operations.
	pub fn supports_channels(self) -> bool {
		self >= Self::OVERRIDE_GROUP
	}
}

impl fmt::Display for ProtocolVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "v{}", self.0)
	}
}

/// The complete effective record, plus the identity it was decorated under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullRecord {
	/// Effective record.
	pub posted: PostedNotification,
	/// Tag the record was received with.
	pub original_tag: Option<String>,
	/// Id the record was received with.
	pub original_id: i32,
	/// Key the record was received with.
	pub original_key: String,
}

/// Change of the tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TagMarker {
	/// Tag is unchanged.
	#[default]
	Unchanged,
	/// Tag was removed.
	Cleared,
	/// Tag was set to this value.
	Set(String),
}

impl TagMarker {
	/// Marker for an optional tag override.
	pub fn from_override(tag: Option<Option<&str>>) -> Self {
		match tag {
			None => Self::Unchanged,
			Some(None) => Self::Cleared,
			Some(Some(tag)) => Self::Set(tag.to_owned()),
		}
	}
}

/// Protocol 1 delta.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeltaV1 {
	/// Tag change.
	pub tag: TagMarker,
	/// New id, if changed.
	pub id: Option<i32>,
	/// Changed fields.
	pub fields: Vec<FieldChange>,
	/// Changed extras keys.
	pub extras: Vec<(String, ExtraOp)>,
}

/// Change of the group override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideGroupChange {
	/// Value the decorator saw before changing it.
	pub original: Option<String>,
	/// New value.
	pub value: Option<String>,
}

/// Protocol 2 delta.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeltaV2 {
	/// Protocol 1 content.
	pub base: DeltaV1,
	/// Group override change, if any.
	pub override_group: Option<OverrideGroupChange>,
}

/// Frame payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
	/// Complete record.
	Full(Box<FullRecord>),
	/// Protocol 1 delta.
	DeltaV1(DeltaV1),
	/// Protocol 2 delta.
	DeltaV2(DeltaV2),
}

impl Payload {
	fn kind(&self) -> &'static str {
		match self {
			Self::Full(_) => "full",
			Self::DeltaV1(_) => "delta-v1",
			Self::DeltaV2(_) => "delta-v2",
		}
	}

	fn allowed_under(&self, version: ProtocolVersion) -> bool {
		match self {
			Self::Full(_) => true,
			Self::DeltaV1(_) => version == ProtocolVersion::INCREMENTAL,
			Self::DeltaV2(_) => version == ProtocolVersion::OVERRIDE_GROUP,
		}
	}

	/// Names of everything a delta changes; `None` for full records.
	///
	/// Fields use their field name, extras keys are prefixed with `extras.`,
	/// identity markers are `tag`, `id` and `override_group`.
	pub fn changed_keys(&self) -> Option<BTreeSet<String>> {
		let (base, override_group) = match self {
			Self::Full(_) => return None,
			Self::DeltaV1(delta) => (delta, None),
			Self::DeltaV2(delta) => (&delta.base, delta.override_group.as_ref()),
		};
		let mut keys = BTreeSet::new();
		if base.tag != TagMarker::Unchanged {
			keys.insert("tag".to_owned());
		}
		if base.id.is_some() {
			keys.insert("id".to_owned());
		}
		if override_group.is_some() {
			keys.insert("override_group".to_owned());
		}
		keys.extend(base.fields.iter().map(|change| change.name().to_owned()));
		keys.extend(base.extras.iter().map(|(key, _)| format!("extras.{key}")));
		Some(keys)
	}
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
	/// Version the frame was written with.
	pub version: ProtocolVersion,
	/// Payload.
	pub payload: Payload,
}

/// Writes `payload` as a frame of `version`.
pub fn encode(version: ProtocolVersion, payload: &Payload) -> Result<Vec<u8>> {
	if !payload.allowed_under(version) {
		return Err(WireError::ModeMismatch {
			version: version.0,
			kind: payload.kind(),
		});
	}
	let mut buf = Vec::with_capacity(64);
	buf.extend_from_slice(MAGIC);
	buf.extend_from_slice(&version.0.to_le_bytes());
	Ok(postcard::to_extend(payload, buf)?)
}

/// Reads a frame, checking magic, version and payload kind.
pub fn decode(bytes: &[u8]) -> Result<Frame> {
	let rest = bytes.strip_prefix(MAGIC.as_slice()).ok_or(WireError::BadMagic)?;
	let (version, body) = rest.split_first_chunk::<4>().ok_or(WireError::BadMagic)?;
	let version = ProtocolVersion(u32::from_le_bytes(*version));
	if version > ProtocolVersion::LATEST {
		return Err(WireError::UnsupportedVersion(version.0));
	}
	let payload: Payload = postcard::from_bytes(body)?;
	if !payload.allowed_under(version) {
		return Err(WireError::ModeMismatch {
			version: version.0,
			kind: payload.kind(),
		});
	}
	Ok(Frame { version, payload })
}
