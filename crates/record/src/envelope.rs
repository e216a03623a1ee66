//! Identity envelope around a mutable notification.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::features::HostFeatures;
use crate::identity::{Identity, UserId};
use crate::mutable::MutableNotification;
use crate::notification::Notification;

/// A notification as posted to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedNotification {
	/// Identity fields.
	pub identity: Identity,
	/// Group override applied by the engine or a decorator.
	pub override_group_key: Option<String>,
	/// Payload.
	pub notification: Notification,
}

impl PostedNotification {
	/// Creates a posted notification without group override.
	pub fn new(identity: Identity, notification: Notification) -> Self {
		Self {
			identity,
			override_group_key: None,
			notification,
		}
	}

	/// Identity key.
	pub fn key(&self) -> String {
		self.identity.key()
	}

	/// Group key.
	pub fn group_key(&self) -> String {
		let n = &self.notification;
		self.identity
			.group_key(self.override_group_key.as_deref(), n.group(), n.sort_key(), n.channel_id())
	}
}

/// How a decorated envelope travels back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WriteBack {
	/// Nothing is written back.
	Skip,
	/// The complete effective record is written back.
	#[default]
	Full,
	/// Only the difference against the original is written back.
	Incremental,
}

/// A posted notification opened for one decoration pass.
///
/// Tag, id and override group can be changed here. The key is recomputed from
/// a stand-in identity only while the effective tag or id differs from the
/// original, so an envelope without identity overrides never re-derives it.
#[derive(Debug)]
pub struct MutableEnvelope {
	identity: Identity,
	original_key: String,
	original_override_group: Option<String>,
	tag: Option<String>,
	id: i32,
	key: Option<String>,
	override_group_key: Option<String>,
	override_group_origin: Option<Option<String>>,
	notification: MutableNotification,
	write_back: WriteBack,
	dirty: bool,
}

impl MutableEnvelope {
	/// Opens `posted` for decoration on a host with `features`.
	pub fn new(posted: PostedNotification, features: HostFeatures) -> Self {
		let PostedNotification {
			identity,
			override_group_key,
			notification,
		} = posted;
		Self {
			original_key: identity.key(),
			original_override_group: override_group_key.clone(),
			tag: identity.tag.clone(),
			id: identity.id,
			key: None,
			override_group_key,
			override_group_origin: None,
			notification: MutableNotification::new(Arc::new(notification), features),
			write_back: WriteBack::default(),
			dirty: false,
			identity,
		}
	}

	/// Posting package.
	pub fn package(&self) -> &str {
		&self.identity.package
	}

	/// Posting uid.
	pub fn uid(&self) -> i32 {
		self.identity.uid
	}

	/// Owning user.
	pub fn user(&self) -> UserId {
		self.identity.user
	}

	/// Post time.
	pub fn post_time(&self) -> i64 {
		self.identity.post_time
	}

	/// Effective tag.
	pub fn tag(&self) -> Option<&str> {
		self.tag.as_deref()
	}

	/// Tag before decoration.
	pub fn original_tag(&self) -> Option<&str> {
		self.identity.tag.as_deref()
	}

	/// Effective id.
	pub fn id(&self) -> i32 {
		self.id
	}

	/// Id before decoration.
	pub fn original_id(&self) -> i32 {
		self.identity.id
	}

	/// Effective key.
	pub fn key(&self) -> &str {
		self.key.as_deref().unwrap_or(&self.original_key)
	}

	/// Key before decoration.
	pub fn original_key(&self) -> &str {
		&self.original_key
	}

	/// Sets the tag.
	pub fn set_tag(&mut self, tag: Option<String>) {
		if tag == self.tag {
			return;
		}
		self.tag = tag;
		self.dirty = true;
		self.update_key();
	}

	/// Sets the id.
	pub fn set_id(&mut self, id: i32) {
		if id == self.id {
			return;
		}
		self.id = id;
		self.dirty = true;
		self.update_key();
	}

	fn update_key(&mut self) {
		self.key = self.has_identity_override().then(|| self.effective_identity().key());
	}

	fn has_identity_override(&self) -> bool {
		self.tag != self.identity.tag || self.id != self.identity.id
	}

	/// The effective tag, if it differs from the original.
	pub fn tag_override(&self) -> Option<Option<&str>> {
		(self.tag != self.identity.tag).then_some(self.tag.as_deref())
	}

	/// The effective id, if it differs from the original.
	pub fn id_override(&self) -> Option<i32> {
		(self.id != self.identity.id).then_some(self.id)
	}

	/// Identity with the effective tag and id.
	pub fn effective_identity(&self) -> Identity {
		Identity {
			tag: self.tag.clone(),
			id: self.id,
			..self.identity.clone()
		}
	}

	/// Identity before decoration.
	pub fn original_identity(&self) -> &Identity {
		&self.identity
	}

	/// Effective group override.
	pub fn override_group_key(&self) -> Option<&str> {
		self.override_group_key.as_deref()
	}

	/// Group override before decoration.
	pub fn original_override_group_key(&self) -> Option<&str> {
		self.original_override_group.as_deref()
	}

	/// Sets the group override.
	///
	/// The first change records the original value as a marker; setting the
	/// recorded value back drops the marker again.
	pub fn set_override_group_key(&mut self, key: Option<String>) {
		if key == self.override_group_key {
			return;
		}
		match &self.override_group_origin {
			None => self.override_group_origin = Some(self.override_group_key.clone()),
			Some(origin) if *origin == key => self.override_group_origin = None,
			Some(_) => {}
		}
		self.override_group_key = key;
		self.dirty = true;
	}

	/// The recorded original group override, present while it was changed.
	pub fn override_group_marker(&self) -> Option<Option<&str>> {
		self.override_group_origin.as_ref().map(Option::as_deref)
	}

	/// Effective group key.
	pub fn group_key(&self) -> String {
		let n = &self.notification;
		self.effective_identity()
			.group_key(self.override_group_key.as_deref(), n.group(), n.sort_key(), n.channel_id())
	}

	/// The notification.
	pub fn notification(&self) -> &MutableNotification {
		&self.notification
	}

	/// The notification, for editing.
	pub fn notification_mut(&mut self) -> &mut MutableNotification {
		&mut self.notification
	}

	/// Pending write-back mode.
	pub fn write_back(&self) -> WriteBack {
		self.write_back
	}

	/// Selects the write-back mode.
	pub fn set_write_back(&mut self, mode: WriteBack) {
		self.write_back = mode;
	}

	/// Returns true once anything was written.
	pub fn is_dirty(&self) -> bool {
		self.dirty || self.notification.is_dirty()
	}

	/// Returns true if any effective value differs from the original.
	pub fn is_changed(&self) -> bool {
		self.has_identity_override() || self.override_group_origin.is_some() || self.notification.is_changed()
	}

	/// Materializes the effective posted notification.
	pub fn to_posted(&self) -> PostedNotification {
		PostedNotification {
			identity: self.effective_identity(),
			override_group_key: self.override_group_key.clone(),
			notification: self.notification.to_notification(),
		}
	}
}

impl fmt::Display for MutableEnvelope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.key {
			Some(key) => write!(f, "MutableEnvelope({} -> {key})", self.original_key),
			None => write!(f, "MutableEnvelope({})", self.original_key),
		}
	}
}
