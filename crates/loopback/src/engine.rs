//! An in-process stand-in for the engine side of a decorator connection.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use nevo_decorator::{
	Capabilities, Controller, ControllerAction, ControllerError, Decorator, DecoratorEndpoint, DecoratorRuntime,
	NotificationChannel, PeerIdentity,
};
use nevo_record::{PostedNotification, UserId};
use nevo_wire::{ConnectOffer, ProtocolVersion, decode, merge};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

/// Engine-side record store answering controller requests.
#[derive(Debug, Default)]
pub struct LoopbackController {
	records: Mutex<HashMap<String, PostedNotification>>,
	archive: Mutex<HashMap<String, Vec<PostedNotification>>>,
	channels: Mutex<HashMap<(String, UserId), Vec<NotificationChannel>>>,
	actions: Mutex<Vec<ControllerAction>>,
}

impl LoopbackController {
	/// Stores `record` under its key and appends it to the key's history.
	pub fn post(&self, record: PostedNotification) {
		let key = record.key();
		self.archive.lock().entry(key.clone()).or_default().push(record.clone());
		self.records.lock().insert(key, record);
	}

	/// Actions requested so far.
	pub fn actions(&self) -> Vec<ControllerAction> {
		self.actions.lock().clone()
	}
}

impl Controller for LoopbackController {
	fn latest_notifications(&self, keys: &[String]) -> Result<Vec<PostedNotification>, ControllerError> {
		let records = self.records.lock();
		Ok(keys.iter().filter_map(|key| records.get(key).cloned()).collect())
	}

	fn archived_notifications(&self, key: &str, limit: usize) -> Result<Vec<PostedNotification>, ControllerError> {
		let archive = self.archive.lock();
		let history = archive.get(key).map(Vec::as_slice).unwrap_or_default();
		Ok(history[history.len().saturating_sub(limit)..].to_vec())
	}

	fn perform_action(&self, action: ControllerAction) -> Result<(), ControllerError> {
		debug!(?action, "controller action");
		if let ControllerAction::Cancel { key } = &action {
			self.records.lock().remove(key);
		}
		self.actions.lock().push(action);
		Ok(())
	}

	fn notification_channel(
		&self,
		package: &str,
		user: UserId,
		channel_id: &str,
	) -> Result<Option<NotificationChannel>, ControllerError> {
		let channels = self.channels.lock();
		Ok(channels
			.get(&(package.to_owned(), user))
			.and_then(|list| list.iter().find(|c| c.id == channel_id).cloned()))
	}

	fn create_notification_channels(
		&self,
		package: &str,
		user: UserId,
		channels: &[NotificationChannel],
	) -> Result<(), ControllerError> {
		let mut all = self.channels.lock();
		let list = all.entry((package.to_owned(), user)).or_default();
		for channel in channels {
			list.retain(|c| c.id != channel.id);
			list.push(channel.clone());
		}
		Ok(())
	}

	fn delete_notification_channel(&self, package: &str, user: UserId, channel_id: &str) -> Result<(), ControllerError> {
		if let Some(list) = self.channels.lock().get_mut(&(package.to_owned(), user)) {
			list.retain(|c| c.id != channel_id);
		}
		Ok(())
	}
}

/// Outcome of one loopback run.
#[derive(Debug, Serialize)]
pub struct Report {
	/// Decorator name.
	pub decorator: String,
	/// Negotiated protocol version.
	pub protocol_version: u32,
	/// Capability bits declared at bind.
	pub capabilities: u32,
	/// Write-back mode: `unchanged`, `full` or `incremental`.
	pub mode: &'static str,
	/// Encoded frame size in bytes.
	pub frame_len: usize,
	/// Keys named by an incremental frame.
	pub changed_keys: Option<BTreeSet<String>>,
	/// Record as the engine holds it after merging.
	pub record: PostedNotification,
}

/// Binds `decorator` to a fresh loopback engine and decorates `posted` once.
///
/// The engine runs under the runtime's own uid so it is trusted without a
/// signature.
pub fn run(
	runtime: Arc<DecoratorRuntime>,
	decorator: Arc<dyn Decorator>,
	protocol: ProtocolVersion,
	posted: PostedNotification,
) -> Result<Report> {
	let engine = PeerIdentity::from_uid(runtime.config().own_uid.unwrap_or_default());
	let controller = Arc::new(LoopbackController::default());
	controller.post(posted.clone());

	let endpoint = DecoratorEndpoint::new(runtime.clone(), decorator);
	let offer = ConnectOffer {
		protocol_version: protocol.0,
		..ConnectOffer::default()
	};
	let capabilities = endpoint
		.on_connect(&engine, controller.clone(), &offer)
		.context("binding decorator")?;
	let version = endpoint.protocol_version().unwrap_or(ProtocolVersion::FULL_ONLY);
	info!(%version, capabilities = %describe(capabilities), "bound");

	let encoded = endpoint.apply(&engine, posted.clone()).context("applying decorator")?;
	let (record, frame_len, changed_keys) = match encoded.bytes() {
		Some(bytes) => {
			let frame = decode(bytes).context("decoding write-back")?;
			let merged = merge(&posted, bytes).context("merging write-back")?;
			controller.post(merged.clone());
			(merged, bytes.len(), frame.payload.changed_keys())
		}
		None => (posted, 0, None),
	};
	info!(mode = encoded.mode(), frame_len, actions = controller.actions().len(), "write-back");

	Ok(Report {
		decorator: runtime.name().to_owned(),
		protocol_version: version.0,
		capabilities: capabilities.bits(),
		mode: encoded.mode(),
		frame_len,
		changed_keys,
		record,
	})
}

/// Record decorated when no input file is given.
pub fn sample() -> PostedNotification {
	use nevo_record::{Identity, Notification, extras};

	let identity = Identity {
		package: "com.example.chat".to_owned(),
		tag: Some("thread".to_owned()),
		id: 7,
		uid: 10_211,
		user: UserId(0),
		post_time: 1_700_000_000_000,
	};
	let notification = Notification::builder()
		.channel_id("messages")
		.group("threads")
		.extra(extras::TITLE, "Ada")
		.extra(extras::TEXT, "Are we still on for the design review tomorrow morning?")
		.build();
	PostedNotification::new(identity, notification)
}

/// Capability bits as a readable list.
fn describe(capabilities: Capabilities) -> String {
	let names: Vec<_> = capabilities.iter_names().map(|(name, _)| name).collect();
	if names.is_empty() { "none".to_owned() } else { names.join(" | ") }
}
