//! Engine-side reconstruction of decorated records.

use nevo_record::{ExtraOp, PostedNotification};
use tracing::{debug, warn};

use crate::error::Result;
use crate::frame::{DeltaV1, DeltaV2, OverrideGroupChange, Payload, TagMarker, decode};

/// Rebuilds the decorated record from a write-back frame.
///
/// `original` must be the record that was handed to the decorator. Deltas are
/// applied on a copy of it; full records replace it.
pub fn merge(original: &PostedNotification, frame: &[u8]) -> Result<PostedNotification> {
	let frame = decode(frame)?;
	match frame.payload {
		Payload::Full(full) => {
			let key = original.key();
			if full.original_key != key {
				warn!(expected = %key, received = %full.original_key, "full write-back for a different record");
			}
			Ok(full.posted)
		}
		Payload::DeltaV1(delta) => Ok(apply_delta(original.clone(), delta, None)),
		Payload::DeltaV2(DeltaV2 { base, override_group }) => Ok(apply_delta(original.clone(), base, override_group)),
	}
}

fn apply_delta(mut posted: PostedNotification, delta: DeltaV1, override_group: Option<OverrideGroupChange>) -> PostedNotification {
	match delta.tag {
		TagMarker::Unchanged => {}
		TagMarker::Cleared => posted.identity.tag = None,
		TagMarker::Set(tag) => posted.identity.tag = Some(tag),
	}
	if let Some(id) = delta.id {
		posted.identity.id = id;
	}
	for change in delta.fields {
		posted.notification.apply_change(change);
	}
	for (key, op) in delta.extras {
		match op {
			ExtraOp::Set(value) => {
				posted.notification.extras.insert(key, value);
			}
			ExtraOp::Remove => {
				posted.notification.extras.remove(&key);
			}
		}
	}
	if let Some(change) = override_group {
		if posted.override_group_key != change.original {
			debug!(key = %posted.key(), "group override changed since the decorator saw it");
		}
		posted.override_group_key = change.value;
	}
	posted
}
