//! Typed changes to notification fields.

use serde::{Deserialize, Serialize};

use crate::notification::{Action, BubbleMetadata, GroupAlertBehavior, Icon, Notification, NotificationFlags};

bitflags::bitflags! {
	/// A set of notification fields.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
	pub struct Fields: u32 {
		/// `when`.
		const WHEN = 1 << 0;
		/// `number`.
		const NUMBER = 1 << 1;
		/// `flags`.
		const FLAGS = 1 << 2;
		/// `priority`.
		const PRIORITY = 1 << 3;
		/// `color`.
		const COLOR = 1 << 4;
		/// `category`.
		const CATEGORY = 1 << 5;
		/// `visibility`.
		const VISIBILITY = 1 << 6;
		/// `ticker_text`.
		const TICKER_TEXT = 1 << 7;
		/// `vibrate`.
		const VIBRATE = 1 << 8;
		/// `actions`.
		const ACTIONS = 1 << 9;
		/// `group`.
		const GROUP = 1 << 10;
		/// `sort_key`.
		const SORT_KEY = 1 << 11;
		/// `small_icon`.
		const SMALL_ICON = 1 << 12;
		/// `large_icon`.
		const LARGE_ICON = 1 << 13;
		/// `timeout_after`.
		const TIMEOUT_AFTER = 1 << 14;
		/// `channel_id`.
		const CHANNEL_ID = 1 << 15;
		/// `group_alert_behavior`.
		const GROUP_ALERT_BEHAVIOR = 1 << 16;
		/// `bubble_metadata`.
		const BUBBLE_METADATA = 1 << 17;
		/// `allow_system_generated_actions`.
		const ALLOW_SYSTEM_GENERATED_ACTIONS = 1 << 18;
		/// `locus_id`.
		const LOCUS_ID = 1 << 19;
		/// Any key of `extras`.
		const EXTRAS = 1 << 20;
	}
}

/// A new value for exactly one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldChange {
	/// New `when`.
	When(i64),
	/// New `number`.
	Number(i32),
	/// New `flags`.
	Flags(NotificationFlags),
	/// New `priority`.
	Priority(i32),
	/// New `color`.
	Color(u32),
	/// New `category`.
	Category(Option<String>),
	/// New `visibility`.
	Visibility(i32),
	/// New `ticker_text`.
	TickerText(Option<String>),
	/// New `vibrate`.
	Vibrate(Option<Vec<i64>>),
	/// New `actions`.
	Actions(Vec<Action>),
	/// New `group`.
	Group(Option<String>),
	/// New `sort_key`.
	SortKey(Option<String>),
	/// New `small_icon`.
	SmallIcon(Option<Icon>),
	/// New `large_icon`.
	LargeIcon(Option<Icon>),
	/// New `timeout_after`.
	TimeoutAfter(i64),
	/// New `channel_id`.
	ChannelId(Option<String>),
	/// New `group_alert_behavior`.
	GroupAlertBehavior(GroupAlertBehavior),
	/// New `bubble_metadata`.
	BubbleMetadata(Option<BubbleMetadata>),
	/// New `allow_system_generated_actions`.
	AllowSystemGeneratedActions(bool),
	/// New `locus_id`.
	LocusId(Option<String>),
}

impl FieldChange {
	/// The field this change targets.
	pub fn field(&self) -> Fields {
		match self {
			Self::When(_) => Fields::WHEN,
			Self::Number(_) => Fields::NUMBER,
			Self::Flags(_) => Fields::FLAGS,
			Self::Priority(_) => Fields::PRIORITY,
			Self::Color(_) => Fields::COLOR,
			Self::Category(_) => Fields::CATEGORY,
			Self::Visibility(_) => Fields::VISIBILITY,
			Self::TickerText(_) => Fields::TICKER_TEXT,
			Self::Vibrate(_) => Fields::VIBRATE,
			Self::Actions(_) => Fields::ACTIONS,
			Self::Group(_) => Fields::GROUP,
			Self::SortKey(_) => Fields::SORT_KEY,
			Self::SmallIcon(_) => Fields::SMALL_ICON,
			Self::LargeIcon(_) => Fields::LARGE_ICON,
			Self::TimeoutAfter(_) => Fields::TIMEOUT_AFTER,
			Self::ChannelId(_) => Fields::CHANNEL_ID,
			Self::GroupAlertBehavior(_) => Fields::GROUP_ALERT_BEHAVIOR,
			Self::BubbleMetadata(_) => Fields::BUBBLE_METADATA,
			Self::AllowSystemGeneratedActions(_) => Fields::ALLOW_SYSTEM_GENERATED_ACTIONS,
			Self::LocusId(_) => Fields::LOCUS_ID,
		}
	}

	/// Lowercase field name, as used in change sets.
	pub fn name(&self) -> &'static str {
		match self {
			Self::When(_) => "when",
			Self::Number(_) => "number",
			Self::Flags(_) => "flags",
			Self::Priority(_) => "priority",
			Self::Color(_) => "color",
			Self::Category(_) => "category",
			Self::Visibility(_) => "visibility",
			Self::TickerText(_) => "ticker_text",
			Self::Vibrate(_) => "vibrate",
			Self::Actions(_) => "actions",
			Self::Group(_) => "group",
			Self::SortKey(_) => "sort_key",
			Self::SmallIcon(_) => "small_icon",
			Self::LargeIcon(_) => "large_icon",
			Self::TimeoutAfter(_) => "timeout_after",
			Self::ChannelId(_) => "channel_id",
			Self::GroupAlertBehavior(_) => "group_alert_behavior",
			Self::BubbleMetadata(_) => "bubble_metadata",
			Self::AllowSystemGeneratedActions(_) => "allow_system_generated_actions",
			Self::LocusId(_) => "locus_id",
		}
	}
}

/// Pending values for the build-time-only fields of a [`Notification`].
///
/// A slot is filled only while its value differs from the original; writing
/// the original value back empties the slot again. The mask always equals the
/// set of filled slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationPatch {
	group: Option<Option<String>>,
	sort_key: Option<Option<String>>,
	small_icon: Option<Option<Icon>>,
	large_icon: Option<Option<Icon>>,
	timeout_after: Option<i64>,
	channel_id: Option<Option<String>>,
	group_alert_behavior: Option<GroupAlertBehavior>,
	bubble_metadata: Option<Option<BubbleMetadata>>,
	allow_system_generated_actions: Option<bool>,
	locus_id: Option<Option<String>>,
	mask: Fields,
}

/// Stores `value` unless it equals `original`. Returns true if the slot changed.
fn put<T: PartialEq>(slot: &mut Option<T>, mask: &mut Fields, field: Fields, value: T, original: &T) -> bool {
	let next = (value != *original).then_some(value);
	if *slot == next {
		return false;
	}
	mask.set(field, next.is_some());
	*slot = next;
	true
}

impl NotificationPatch {
	/// Fields with a pending value.
	pub fn mask(&self) -> Fields {
		self.mask
	}

	/// Returns true if no field is pending.
	pub fn is_empty(&self) -> bool {
		self.mask.is_empty()
	}

	pub(crate) fn group(&self) -> Option<Option<&str>> {
		self.group.as_ref().map(Option::as_deref)
	}

	pub(crate) fn set_group(&mut self, value: Option<String>, original: &Notification) -> bool {
		let original = original.group().map(str::to_owned);
		put(&mut self.group, &mut self.mask, Fields::GROUP, value, &original)
	}

	pub(crate) fn sort_key(&self) -> Option<Option<&str>> {
		self.sort_key.as_ref().map(Option::as_deref)
	}

	pub(crate) fn set_sort_key(&mut self, value: Option<String>, original: &Notification) -> bool {
		let original = original.sort_key().map(str::to_owned);
		put(&mut self.sort_key, &mut self.mask, Fields::SORT_KEY, value, &original)
	}

	pub(crate) fn small_icon(&self) -> Option<Option<&Icon>> {
		self.small_icon.as_ref().map(Option::as_ref)
	}

	pub(crate) fn set_small_icon(&mut self, value: Option<Icon>, original: &Notification) -> bool {
		let original = original.small_icon().cloned();
		put(&mut self.small_icon, &mut self.mask, Fields::SMALL_ICON, value, &original)
	}

	pub(crate) fn large_icon(&self) -> Option<Option<&Icon>> {
		self.large_icon.as_ref().map(Option::as_ref)
	}

	pub(crate) fn set_large_icon(&mut self, value: Option<Icon>, original: &Notification) -> bool {
		let original = original.large_icon().cloned();
		put(&mut self.large_icon, &mut self.mask, Fields::LARGE_ICON, value, &original)
	}

	pub(crate) fn timeout_after(&self) -> Option<i64> {
		self.timeout_after
	}

	pub(crate) fn set_timeout_after(&mut self, value: i64, original: &Notification) -> bool {
		put(&mut self.timeout_after, &mut self.mask, Fields::TIMEOUT_AFTER, value, &original.timeout_after())
	}

	pub(crate) fn channel_id(&self) -> Option<Option<&str>> {
		self.channel_id.as_ref().map(Option::as_deref)
	}

	pub(crate) fn set_channel_id(&mut self, value: Option<String>, original: &Notification) -> bool {
		let original = original.channel_id().map(str::to_owned);
		put(&mut self.channel_id, &mut self.mask, Fields::CHANNEL_ID, value, &original)
	}

	pub(crate) fn group_alert_behavior(&self) -> Option<GroupAlertBehavior> {
		self.group_alert_behavior
	}

	pub(crate) fn set_group_alert_behavior(&mut self, value: GroupAlertBehavior, original: &Notification) -> bool {
		let original = original.group_alert_behavior();
		put(&mut self.group_alert_behavior, &mut self.mask, Fields::GROUP_ALERT_BEHAVIOR, value, &original)
	}

	pub(crate) fn bubble_metadata(&self) -> Option<Option<&BubbleMetadata>> {
		self.bubble_metadata.as_ref().map(Option::as_ref)
	}

	pub(crate) fn set_bubble_metadata(&mut self, value: Option<BubbleMetadata>, original: &Notification) -> bool {
		let original = original.bubble_metadata().cloned();
		put(&mut self.bubble_metadata, &mut self.mask, Fields::BUBBLE_METADATA, value, &original)
	}

	pub(crate) fn allow_system_generated_actions(&self) -> Option<bool> {
		self.allow_system_generated_actions
	}

	pub(crate) fn set_allow_system_generated_actions(&mut self, value: bool, original: &Notification) -> bool {
		let original = original.allow_system_generated_actions();
		put(
			&mut self.allow_system_generated_actions,
			&mut self.mask,
			Fields::ALLOW_SYSTEM_GENERATED_ACTIONS,
			value,
			&original,
		)
	}

	pub(crate) fn locus_id(&self) -> Option<Option<&str>> {
		self.locus_id.as_ref().map(Option::as_deref)
	}

	pub(crate) fn set_locus_id(&mut self, value: Option<String>, original: &Notification) -> bool {
		let original = original.locus_id().map(str::to_owned);
		put(&mut self.locus_id, &mut self.mask, Fields::LOCUS_ID, value, &original)
	}

	/// Pending values as individual changes, in field order.
	pub fn changes(&self) -> Vec<FieldChange> {
		let mut out = Vec::new();
		if let Some(v) = &self.group {
			out.push(FieldChange::Group(v.clone()));
		}
		if let Some(v) = &self.sort_key {
			out.push(FieldChange::SortKey(v.clone()));
		}
		if let Some(v) = &self.small_icon {
			out.push(FieldChange::SmallIcon(v.clone()));
		}
		if let Some(v) = &self.large_icon {
			out.push(FieldChange::LargeIcon(v.clone()));
		}
		if let Some(v) = self.timeout_after {
			out.push(FieldChange::TimeoutAfter(v));
		}
		if let Some(v) = &self.channel_id {
			out.push(FieldChange::ChannelId(v.clone()));
		}
		if let Some(v) = self.group_alert_behavior {
			out.push(FieldChange::GroupAlertBehavior(v));
		}
		if let Some(v) = &self.bubble_metadata {
			out.push(FieldChange::BubbleMetadata(v.clone()));
		}
		if let Some(v) = self.allow_system_generated_actions {
			out.push(FieldChange::AllowSystemGeneratedActions(v));
		}
		if let Some(v) = &self.locus_id {
			out.push(FieldChange::LocusId(v.clone()));
		}
		out
	}
}
