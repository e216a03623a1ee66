//! The notification record as owned by the engine.

use nevo_overlay::Bundle;
use serde::{Deserialize, Serialize};

use crate::patch::FieldChange;

bitflags::bitflags! {
	/// Behavioral flags of a notification.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
	pub struct NotificationFlags: u32 {
		/// Drive the notification LED.
		const SHOW_LIGHTS = 0x0001;
		/// Refers to something ongoing, such as a call.
		const ONGOING_EVENT = 0x0002;
		/// Repeat the alert until acknowledged.
		const INSISTENT = 0x0004;
		/// Alert only the first time it is posted.
		const ONLY_ALERT_ONCE = 0x0008;
		/// Cancel when the user taps it.
		const AUTO_CANCEL = 0x0010;
		/// Keep it when the user clears all.
		const NO_CLEAR = 0x0020;
		/// Belongs to a running foreground service.
		const FOREGROUND_SERVICE = 0x0040;
		/// Legacy high priority marker.
		const HIGH_PRIORITY = 0x0080;
		/// Do not bridge to remote devices.
		const LOCAL_ONLY = 0x0100;
		/// Summary of a notification group.
		const GROUP_SUMMARY = 0x0200;
		/// Bubble should be shown.
		const BUBBLE = 0x1000;
	}
}

/// An icon reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Icon {
	/// A drawable resource inside a package.
	Resource {
		/// Package holding the resource.
		package: String,
		/// Resource id.
		id: i32,
	},
	/// Encoded bitmap bytes.
	Data(Vec<u8>),
	/// Content URI.
	Uri(String),
}

/// A user-visible action button.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
	/// Button label. Actions with equal titles are considered the same action.
	pub title: Option<String>,
	/// Button icon.
	pub icon: Option<Icon>,
	/// Opaque intent reference fired when tapped.
	pub intent: Option<String>,
	/// Action extras.
	pub extras: Bundle,
}

impl Action {
	/// Creates an action with a title and intent.
	pub fn new(title: impl Into<String>, intent: impl Into<String>) -> Self {
		Self {
			title: Some(title.into()),
			intent: Some(intent.into()),
			..Self::default()
		}
	}
}

/// Bubble presentation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BubbleMetadata {
	/// Intent reference for the expanded bubble.
	pub intent: String,
	/// Desired expanded height in dp.
	pub desired_height: i32,
	/// Collapsed bubble icon.
	pub icon: Option<Icon>,
	/// Expand as soon as posted.
	pub auto_expand: bool,
	/// Hide the notification in the shade while the bubble is shown.
	pub suppress_notification: bool,
}

/// Which members of a group may alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GroupAlertBehavior {
	/// Every member alerts.
	#[default]
	All,
	/// Only the summary alerts.
	Summary,
	/// Only children alert.
	Children,
}

/// Fields a decorator may assign directly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicFields {
	/// Event time in milliseconds since the epoch.
	pub when: i64,
	/// Count badge.
	pub number: i32,
	/// Behavioral flags.
	pub flags: NotificationFlags,
	/// Legacy priority, from -2 to 2.
	pub priority: i32,
	/// Accent color, ARGB.
	pub color: u32,
	/// System category.
	pub category: Option<String>,
	/// Lock screen visibility, from -1 to 1.
	pub visibility: i32,
	/// Accessibility ticker text.
	pub ticker_text: Option<String>,
	/// Vibration pattern.
	pub vibrate: Option<Vec<i64>>,
	/// Action buttons.
	pub actions: Vec<Action>,
}

/// Fields that can only be set when the record is built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
struct SealedFields {
	group: Option<String>,
	sort_key: Option<String>,
	small_icon: Option<Icon>,
	large_icon: Option<Icon>,
	timeout_after: i64,
	channel_id: Option<String>,
	group_alert_behavior: GroupAlertBehavior,
	bubble_metadata: Option<BubbleMetadata>,
	allow_system_generated_actions: bool,
	locus_id: Option<String>,
}

/// A notification payload.
///
/// Public fields and extras are plain data. The remaining fields are fixed
/// once built; decorators change them through
/// [`MutableNotification`](crate::MutableNotification), and only the engine
/// applies such changes back through [`Notification::apply_change`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
	/// Directly assignable fields.
	pub fields: PublicFields,
	/// Free-form payload.
	pub extras: Bundle,
	sealed: SealedFields,
}

impl Notification {
	/// Starts building a notification.
	pub fn builder() -> NotificationBuilder {
		NotificationBuilder::default()
	}

	/// Group this notification belongs to.
	pub fn group(&self) -> Option<&str> {
		self.sealed.group.as_deref()
	}

	/// Sort key within its group.
	pub fn sort_key(&self) -> Option<&str> {
		self.sealed.sort_key.as_deref()
	}

	/// Status bar icon.
	pub fn small_icon(&self) -> Option<&Icon> {
		self.sealed.small_icon.as_ref()
	}

	/// Content icon.
	pub fn large_icon(&self) -> Option<&Icon> {
		self.sealed.large_icon.as_ref()
	}

	/// Milliseconds after which the notification is cancelled, 0 for never.
	pub fn timeout_after(&self) -> i64 {
		self.sealed.timeout_after
	}

	/// Channel the notification is posted to.
	pub fn channel_id(&self) -> Option<&str> {
		self.sealed.channel_id.as_deref()
	}

	/// Group alerting policy.
	pub fn group_alert_behavior(&self) -> GroupAlertBehavior {
		self.sealed.group_alert_behavior
	}

	/// Bubble metadata.
	pub fn bubble_metadata(&self) -> Option<&BubbleMetadata> {
		self.sealed.bubble_metadata.as_ref()
	}

	/// Whether the system may add contextual actions.
	pub fn allow_system_generated_actions(&self) -> bool {
		self.sealed.allow_system_generated_actions
	}

	/// Locus (conversation) id.
	pub fn locus_id(&self) -> Option<&str> {
		self.sealed.locus_id.as_deref()
	}

	/// Applies one field change in place.
	pub fn apply_change(&mut self, change: FieldChange) {
		let fields = &mut self.fields;
		let sealed = &mut self.sealed;
		match change {
			FieldChange::When(v) => fields.when = v,
			FieldChange::Number(v) => fields.number = v,
			FieldChange::Flags(v) => fields.flags = v,
			FieldChange::Priority(v) => fields.priority = v,
			FieldChange::Color(v) => fields.color = v,
			FieldChange::Category(v) => fields.category = v,
			FieldChange::Visibility(v) => fields.visibility = v,
			FieldChange::TickerText(v) => fields.ticker_text = v,
			FieldChange::Vibrate(v) => fields.vibrate = v,
			FieldChange::Actions(v) => fields.actions = v,
			FieldChange::Group(v) => sealed.group = v,
			FieldChange::SortKey(v) => sealed.sort_key = v,
			FieldChange::SmallIcon(v) => sealed.small_icon = v,
			FieldChange::LargeIcon(v) => sealed.large_icon = v,
			FieldChange::TimeoutAfter(v) => sealed.timeout_after = v,
			FieldChange::ChannelId(v) => sealed.channel_id = v,
			FieldChange::GroupAlertBehavior(v) => sealed.group_alert_behavior = v,
			FieldChange::BubbleMetadata(v) => sealed.bubble_metadata = v,
			FieldChange::AllowSystemGeneratedActions(v) => sealed.allow_system_generated_actions = v,
			FieldChange::LocusId(v) => sealed.locus_id = v,
		}
	}
}

/// Builder for [`Notification`].
#[derive(Debug, Clone, Default)]
pub struct NotificationBuilder {
	inner: Notification,
}

impl NotificationBuilder {
	/// Sets the directly assignable fields.
	pub fn fields(mut self, fields: PublicFields) -> Self {
		self.inner.fields = fields;
		self
	}

	/// Sets the extras.
	pub fn extras(mut self, extras: Bundle) -> Self {
		self.inner.extras = extras;
		self
	}

	/// Sets one extra.
	pub fn extra(mut self, key: impl Into<String>, value: impl Into<nevo_overlay::Value>) -> Self {
		self.inner.extras.insert(key.into(), value.into());
		self
	}

	/// Sets the group.
	pub fn group(mut self, group: impl Into<String>) -> Self {
		self.inner.sealed.group = Some(group.into());
		self
	}

	/// Sets the sort key.
	pub fn sort_key(mut self, sort_key: impl Into<String>) -> Self {
		self.inner.sealed.sort_key = Some(sort_key.into());
		self
	}

	/// Sets the small icon.
	pub fn small_icon(mut self, icon: Icon) -> Self {
		self.inner.sealed.small_icon = Some(icon);
		self
	}

	/// Sets the large icon.
	pub fn large_icon(mut self, icon: Icon) -> Self {
		self.inner.sealed.large_icon = Some(icon);
		self
	}

	/// Sets the timeout in milliseconds.
	pub fn timeout_after(mut self, millis: i64) -> Self {
		self.inner.sealed.timeout_after = millis;
		self
	}

	/// Sets the channel id.
	pub fn channel_id(mut self, channel_id: impl Into<String>) -> Self {
		self.inner.sealed.channel_id = Some(channel_id.into());
		self
	}

	/// Sets the group alert behavior.
	pub fn group_alert_behavior(mut self, behavior: GroupAlertBehavior) -> Self {
		self.inner.sealed.group_alert_behavior = behavior;
		self
	}

	/// Sets the bubble metadata.
	pub fn bubble_metadata(mut self, metadata: BubbleMetadata) -> Self {
		self.inner.sealed.bubble_metadata = Some(metadata);
		self
	}

	/// Allows or forbids system generated actions.
	pub fn allow_system_generated_actions(mut self, allowed: bool) -> Self {
		self.inner.sealed.allow_system_generated_actions = allowed;
		self
	}

	/// Sets the locus id.
	pub fn locus_id(mut self, locus_id: impl Into<String>) -> Self {
		self.inner.sealed.locus_id = Some(locus_id.into());
		self
	}

	/// Finishes the notification.
	pub fn build(self) -> Notification {
		self.inner
	}
}
