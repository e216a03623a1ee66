//! Requests a decorator can make back to the engine.

use std::sync::Arc;
use std::time::Duration;

use nevo_record::{Bundle, PostedNotification, UserId};
use nevo_wire::ProtocolVersion;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ControllerError;

/// A notification channel of some package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
	/// Channel id, unique per package and user.
	pub id: String,
	/// User-visible name.
	pub name: String,
	/// Importance, from 0 (none) to 5 (max).
	pub importance: i32,
	/// User-visible description.
	pub description: Option<String>,
}

/// A record-level action performed by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerAction {
	/// Removes the record.
	Cancel {
		/// Target key.
		key: String,
	},
	/// Reposts a previously removed record.
	Revive {
		/// Target key.
		key: String,
	},
	/// Runs the record through decoration again.
	Recast {
		/// Target key.
		key: String,
		/// Extras merged into the record before decoration.
		fill_in_extras: Option<Bundle>,
	},
	/// Hides the record for a while.
	Snooze {
		/// Target key.
		key: String,
		/// Snooze duration.
		duration: Duration,
	},
}

/// The engine side of a bound connection.
pub trait Controller: Send + Sync {
	/// Returns the current records for `keys`, skipping unknown keys.
	fn latest_notifications(&self, keys: &[String]) -> Result<Vec<PostedNotification>, ControllerError>;

	/// Returns up to `limit` records posted under `key`, oldest first, ending
	/// with the one currently being decorated.
	fn archived_notifications(&self, key: &str, limit: usize) -> Result<Vec<PostedNotification>, ControllerError>;

	/// Performs a record-level action.
	fn perform_action(&self, action: ControllerAction) -> Result<(), ControllerError>;

	/// Looks up a notification channel.
	fn notification_channel(
		&self,
		package: &str,
		user: UserId,
		channel: &str,
	) -> Result<Option<NotificationChannel>, ControllerError>;

	/// Creates or updates notification channels.
	fn create_notification_channels(
		&self,
		package: &str,
		user: UserId,
		channels: &[NotificationChannel],
	) -> Result<(), ControllerError>;

	/// Deletes a notification channel.
	fn delete_notification_channel(&self, package: &str, user: UserId, channel: &str) -> Result<(), ControllerError>;
}

/// Forwarding wrapper around the bound [`Controller`].
///
/// Every request may fail independently. Failures are logged and swallowed so
/// the decorator keeps running; callers observe an empty result instead.
/// Channel requests are skipped when the negotiated protocol predates them.
#[derive(Clone)]
pub struct ControllerHandle {
	inner: Arc<dyn Controller>,
	version: ProtocolVersion,
}

impl ControllerHandle {
	/// Wraps `inner` for a connection negotiated at `version`.
	pub fn new(inner: Arc<dyn Controller>, version: ProtocolVersion) -> Self {
		Self { inner, version }
	}

	/// Negotiated protocol version.
	pub fn version(&self) -> ProtocolVersion {
		self.version
	}

	/// Current records for `keys`. Empty on failure.
	pub fn latest_notifications(&self, keys: &[String]) -> Vec<PostedNotification> {
		self.inner.latest_notifications(keys).unwrap_or_else(|e| {
			warn!(error = %e, count = keys.len(), "failed to fetch latest notifications");
			Vec::new()
		})
	}

	/// Posting history of `key`. Empty on failure.
	pub fn archived_notifications(&self, key: &str, limit: usize) -> Vec<PostedNotification> {
		self.inner.archived_notifications(key, limit).unwrap_or_else(|e| {
			warn!(error = %e, key, limit, "failed to fetch archived notifications");
			Vec::new()
		})
	}

	/// Cancels the record under `key`.
	pub fn cancel(&self, key: &str) {
		self.perform(ControllerAction::Cancel { key: key.to_owned() });
	}

	/// Revives the record under `key`.
	pub fn revive(&self, key: &str) {
		self.perform(ControllerAction::Revive { key: key.to_owned() });
	}

	/// Sends the record under `key` through decoration again.
	pub fn recast(&self, key: &str, fill_in_extras: Option<Bundle>) {
		self.perform(ControllerAction::Recast {
			key: key.to_owned(),
			fill_in_extras,
		});
	}

	/// Snoozes the record under `key`.
	pub fn snooze(&self, key: &str, duration: Duration) {
		self.perform(ControllerAction::Snooze {
			key: key.to_owned(),
			duration,
		});
	}

	fn perform(&self, action: ControllerAction) {
		if let Err(e) = self.inner.perform_action(action.clone()) {
			warn!(error = %e, ?action, "controller action failed");
		}
	}

	fn channels_supported(&self, op: &'static str) -> bool {
		let supported = self.version.supports_channels();
		if !supported {
			debug!(op, version = %self.version, "channel operation not supported by engine");
		}
		supported
	}

	/// Looks up a channel. `None` on failure or when unsupported.
	pub fn notification_channel(&self, package: &str, user: UserId, channel: &str) -> Option<NotificationChannel> {
		if !self.channels_supported("notification_channel") {
			return None;
		}
		self.inner
			.notification_channel(package, user, channel)
			.unwrap_or_else(|e| {
				warn!(error = %e, package, channel, "failed to get notification channel");
				None
			})
	}

	/// Creates or updates channels.
	pub fn create_notification_channels(&self, package: &str, user: UserId, channels: &[NotificationChannel]) {
		if !self.channels_supported("create_notification_channels") {
			return;
		}
		if let Err(e) = self.inner.create_notification_channels(package, user, channels) {
			warn!(error = %e, package, count = channels.len(), "failed to create notification channels");
		}
	}

	/// Deletes a channel.
	pub fn delete_notification_channel(&self, package: &str, user: UserId, channel: &str) {
		if !self.channels_supported("delete_notification_channel") {
			return;
		}
		if let Err(e) = self.inner.delete_notification_channel(package, user, channel) {
			warn!(error = %e, package, channel, "failed to delete notification channel");
		}
	}
}

impl std::fmt::Debug for ControllerHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ControllerHandle").field("version", &self.version).finish_non_exhaustive()
	}
}
