//! The mutation facade over a notification.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nevo_overlay::{Change, ChangeObserver, OverlayMap, Value};
use tracing::trace;

use crate::extras;
use crate::features::HostFeatures;
use crate::notification::{Action, BubbleMetadata, GroupAlertBehavior, Icon, Notification, NotificationFlags, PublicFields};
use crate::patch::{FieldChange, Fields, NotificationPatch};

/// Net change of one extras key against the original.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ExtraOp {
	/// The key now holds this value.
	Set(Value),
	/// The key was removed.
	Remove,
}

/// Set on any mutation, including ones that end up equal to the original.
#[derive(Debug, Default)]
struct DirtyFlag(AtomicBool);

impl DirtyFlag {
	fn mark(&self) {
		self.0.store(true, Ordering::Release);
	}

	fn get(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}
}

impl ChangeObserver for DirtyFlag {
	fn on_changed(&self, _key: &str, _change: Change<'_>) {
		self.mark();
	}
}

/// A notification open for decoration.
///
/// The original record is kept intact. Public fields are edited on a live
/// copy, extras through an [`OverlayMap`], and build-time-only fields through
/// a [`NotificationPatch`]. Getters always return the effective value.
#[derive(Debug)]
pub struct MutableNotification {
	original: Arc<Notification>,
	fields: PublicFields,
	patch: NotificationPatch,
	extras: OverlayMap,
	features: HostFeatures,
	dirty: Arc<DirtyFlag>,
}

impl MutableNotification {
	/// Opens `original` for decoration on a host with `features`.
	pub fn new(original: impl Into<Arc<Notification>>, features: HostFeatures) -> Self {
		let original = original.into();
		let extras = OverlayMap::new(original.extras.clone());
		let dirty = Arc::new(DirtyFlag::default());
		extras.observe(dirty.clone());
		Self {
			fields: original.fields.clone(),
			original,
			patch: NotificationPatch::default(),
			extras,
			features,
			dirty,
		}
	}

	/// The record as it was before decoration.
	pub fn original(&self) -> &Notification {
		&self.original
	}

	/// Host features the setters are gated on.
	pub fn features(&self) -> HostFeatures {
		self.features
	}

	/// Directly assignable fields.
	pub fn fields(&self) -> &PublicFields {
		&self.fields
	}

	/// Directly assignable fields, for editing.
	pub fn fields_mut(&mut self) -> &mut PublicFields {
		self.dirty.mark();
		&mut self.fields
	}

	/// Extras overlay.
	pub fn extras(&self) -> &OverlayMap {
		&self.extras
	}

	/// Returns true once anything was written, even if written back to the original.
	pub fn is_dirty(&self) -> bool {
		self.dirty.get()
	}

	fn supports(&self, feature: HostFeatures, field: &'static str) -> bool {
		let supported = self.features.contains(feature);
		if !supported {
			trace!(field, features = ?self.features, "field not supported by host, ignoring");
		}
		supported
	}

	fn touched(&self, changed: bool) {
		if changed {
			self.dirty.mark();
		}
	}

	/// Adds `flags`. Returns false if they were all set already.
	pub fn add_flags(&mut self, flags: NotificationFlags) -> bool {
		if self.fields.flags.contains(flags) {
			return false;
		}
		self.fields_mut().flags.insert(flags);
		true
	}

	/// Removes `flags`. Returns false if none of them was set.
	pub fn remove_flags(&mut self, flags: NotificationFlags) -> bool {
		if !self.fields.flags.intersects(flags) {
			return false;
		}
		self.fields_mut().flags.remove(flags);
		true
	}

	/// Adds `action`, replacing an existing action with the same title.
	pub fn add_action(&mut self, action: Action) {
		let actions = &mut self.fields_mut().actions;
		let existing = action
			.title
			.as_ref()
			.and_then(|title| actions.iter().position(|a| a.title.as_ref() == Some(title)));
		match existing {
			Some(index) => actions[index] = action,
			None => actions.push(action),
		}
	}

	/// Appends a person URI to the people list in extras.
	pub fn add_person(&mut self, uri: impl Into<String>) {
		let key = if self.features.contains(HostFeatures::PEOPLE_LIST) {
			extras::PEOPLE_LIST
		} else {
			extras::PEOPLE
		};
		let mut people = self.extras.get_str_list(key).unwrap_or_default();
		people.push(uri.into());
		self.extras.set(key, people);
	}

	/// Group.
	pub fn group(&self) -> Option<&str> {
		self.patch.group().unwrap_or(self.original.group())
	}

	/// Sets the group.
	pub fn set_group(&mut self, group: Option<String>) {
		let changed = self.patch.set_group(group, &self.original);
		self.touched(changed);
	}

	/// Sort key.
	pub fn sort_key(&self) -> Option<&str> {
		self.patch.sort_key().unwrap_or(self.original.sort_key())
	}

	/// Sets the sort key.
	pub fn set_sort_key(&mut self, sort_key: Option<String>) {
		let changed = self.patch.set_sort_key(sort_key, &self.original);
		self.touched(changed);
	}

	/// Small icon.
	pub fn small_icon(&self) -> Option<&Icon> {
		self.patch.small_icon().unwrap_or(self.original.small_icon())
	}

	/// Sets the small icon.
	pub fn set_small_icon(&mut self, icon: Option<Icon>) {
		let changed = self.patch.set_small_icon(icon, &self.original);
		self.touched(changed);
	}

	/// Large icon.
	pub fn large_icon(&self) -> Option<&Icon> {
		self.patch.large_icon().unwrap_or(self.original.large_icon())
	}

	/// Sets the large icon.
	pub fn set_large_icon(&mut self, icon: Option<Icon>) {
		let changed = self.patch.set_large_icon(icon, &self.original);
		self.touched(changed);
	}

	/// Timeout in milliseconds.
	pub fn timeout_after(&self) -> i64 {
		self.patch.timeout_after().unwrap_or(self.original.timeout_after())
	}

	/// Sets the timeout. Ignored on hosts without [`HostFeatures::TIMEOUT`].
	pub fn set_timeout_after(&mut self, millis: i64) {
		if self.supports(HostFeatures::TIMEOUT, "timeout_after") {
			let changed = self.patch.set_timeout_after(millis, &self.original);
			self.touched(changed);
		}
	}

	/// Channel id.
	pub fn channel_id(&self) -> Option<&str> {
		self.patch.channel_id().unwrap_or(self.original.channel_id())
	}

	/// Sets the channel. Ignored on hosts without [`HostFeatures::CHANNELS`].
	pub fn set_channel_id(&mut self, channel_id: Option<String>) {
		if self.supports(HostFeatures::CHANNELS, "channel_id") {
			let changed = self.patch.set_channel_id(channel_id, &self.original);
			self.touched(changed);
		}
	}

	/// Group alert behavior.
	pub fn group_alert_behavior(&self) -> GroupAlertBehavior {
		self.patch.group_alert_behavior().unwrap_or(self.original.group_alert_behavior())
	}

	/// Sets the group alert behavior. Ignored on hosts without [`HostFeatures::GROUP_ALERT`].
	pub fn set_group_alert_behavior(&mut self, behavior: GroupAlertBehavior) {
		if self.supports(HostFeatures::GROUP_ALERT, "group_alert_behavior") {
			let changed = self.patch.set_group_alert_behavior(behavior, &self.original);
			self.touched(changed);
		}
	}

	/// Bubble metadata.
	pub fn bubble_metadata(&self) -> Option<&BubbleMetadata> {
		self.patch.bubble_metadata().unwrap_or(self.original.bubble_metadata())
	}

	/// Sets the bubble metadata. Ignored on hosts without [`HostFeatures::BUBBLES`].
	pub fn set_bubble_metadata(&mut self, metadata: Option<BubbleMetadata>) {
		if self.supports(HostFeatures::BUBBLES, "bubble_metadata") {
			let changed = self.patch.set_bubble_metadata(metadata, &self.original);
			self.touched(changed);
		}
	}

	/// Whether system generated actions are allowed.
	pub fn allow_system_generated_actions(&self) -> bool {
		self.patch
			.allow_system_generated_actions()
			.unwrap_or(self.original.allow_system_generated_actions())
	}

	/// Allows or forbids system generated actions. Ignored on hosts without
	/// [`HostFeatures::SYSTEM_ACTIONS`].
	pub fn set_allow_system_generated_actions(&mut self, allowed: bool) {
		if self.supports(HostFeatures::SYSTEM_ACTIONS, "allow_system_generated_actions") {
			let changed = self.patch.set_allow_system_generated_actions(allowed, &self.original);
			self.touched(changed);
		}
	}

	/// Locus id.
	pub fn locus_id(&self) -> Option<&str> {
		self.patch.locus_id().unwrap_or(self.original.locus_id())
	}

	/// Sets the locus id. Ignored on hosts without [`HostFeatures::LOCUS`].
	pub fn set_locus_id(&mut self, locus_id: Option<String>) {
		if self.supports(HostFeatures::LOCUS, "locus_id") {
			let changed = self.patch.set_locus_id(locus_id, &self.original);
			self.touched(changed);
		}
	}

	/// Pending build-time-only field values.
	pub fn patch(&self) -> &NotificationPatch {
		&self.patch
	}

	/// Every field whose effective value differs from the original, in field order.
	pub fn field_changes(&self) -> Vec<FieldChange> {
		let mut changes = diff_public(&self.original.fields, &self.fields);
		changes.extend(self.patch.changes());
		changes
	}

	/// Extras keys whose effective value differs from the original.
	pub fn extras_diff(&self) -> BTreeMap<String, ExtraOp> {
		let original = &self.original.extras;
		self.extras
			.changed_keys()
			.into_iter()
			.filter_map(|key| {
				let op = match (self.extras.get(&key), original.get(&key)) {
					(Some(live), Some(orig)) if live == *orig => return None,
					(None, None) => return None,
					(Some(live), _) => ExtraOp::Set(live),
					(None, Some(_)) => ExtraOp::Remove,
				};
				Some((key, op))
			})
			.collect()
	}

	/// Set of fields whose effective value differs from the original.
	pub fn changed_fields(&self) -> Fields {
		let mut fields = self.field_changes().iter().fold(Fields::empty(), |acc, c| acc | c.field());
		fields.set(Fields::EXTRAS, !self.extras_diff().is_empty());
		fields
	}

	/// Returns true if any effective value differs from the original.
	pub fn is_changed(&self) -> bool {
		!self.changed_fields().is_empty()
	}

	/// Materializes the effective record.
	pub fn to_notification(&self) -> Notification {
		let mut out = Notification::clone(&self.original);
		out.fields = self.fields.clone();
		out.extras = self.extras.snapshot();
		for change in self.patch.changes() {
			out.apply_change(change);
		}
		out
	}
}

fn diff_public(original: &PublicFields, live: &PublicFields) -> Vec<FieldChange> {
	let mut out = Vec::new();
	if live.when != original.when {
		out.push(FieldChange::When(live.when));
	}
	if live.number != original.number {
		out.push(FieldChange::Number(live.number));
	}
	if live.flags != original.flags {
		out.push(FieldChange::Flags(live.flags));
	}
	if live.priority != original.priority {
		out.push(FieldChange::Priority(live.priority));
	}
	if live.color != original.color {
		out.push(FieldChange::Color(live.color));
	}
	if live.category != original.category {
		out.push(FieldChange::Category(live.category.clone()));
	}
	if live.visibility != original.visibility {
		out.push(FieldChange::Visibility(live.visibility));
	}
	if live.ticker_text != original.ticker_text {
		out.push(FieldChange::TickerText(live.ticker_text.clone()));
	}
	if live.vibrate != original.vibrate {
		out.push(FieldChange::Vibrate(live.vibrate.clone()));
	}
	if live.actions != original.actions {
		out.push(FieldChange::Actions(live.actions.clone()));
	}
	out
}
