//! Many records decorated at once by one endpoint.

use std::sync::Arc;

use nevo_decorator::{
	Capabilities, Context, Controller, ControllerAction, ControllerError, Decorator, DecoratorConfig, DecoratorEndpoint,
	DecoratorFault, DecoratorRuntime, NotificationChannel, PeerIdentity,
};
use nevo_record::{Identity, MutableEnvelope, Notification, PostedNotification, UserId, Value};
use nevo_wire::{ConnectOffer, merge};

const ENGINE_UID: i32 = 1000;
const THREADS: i32 = 8;
const PER_THREAD: i32 = 64;

struct NullController;

impl Controller for NullController {
	fn latest_notifications(&self, _keys: &[String]) -> Result<Vec<PostedNotification>, ControllerError> {
		Ok(Vec::new())
	}

	fn archived_notifications(&self, _key: &str, _limit: usize) -> Result<Vec<PostedNotification>, ControllerError> {
		Ok(Vec::new())
	}

	fn perform_action(&self, _action: ControllerAction) -> Result<(), ControllerError> {
		Ok(())
	}

	fn notification_channel(&self, _: &str, _: UserId, _: &str) -> Result<Option<NotificationChannel>, ControllerError> {
		Ok(None)
	}

	fn create_notification_channels(&self, _: &str, _: UserId, _: &[NotificationChannel]) -> Result<(), ControllerError> {
		Ok(())
	}

	fn delete_notification_channel(&self, _: &str, _: UserId, _: &str) -> Result<(), ControllerError> {
		Ok(())
	}
}

/// Stamps each record with its own id and fails if it sees anyone else's stamp.
struct Stamp;

impl Decorator for Stamp {
	fn capabilities(&self) -> Capabilities {
		Capabilities::DECORATES
	}

	fn apply(&self, _cx: &Context<'_>, envelope: &mut MutableEnvelope) -> Result<bool, DecoratorFault> {
		let extras = envelope.notification().extras();
		if extras.contains_key("stamp") {
			return Err(DecoratorFault::IllegalState(format!("foreign stamp on {}", envelope.key())));
		}
		let id = envelope.id();
		extras.set("stamp", i64::from(id));
		let child = extras.child("per-record");
		for i in 0..8 {
			child.set(format!("k{i}"), i64::from(id * 100 + i));
		}
		envelope.set_tag(Some(format!("t{id}")));
		Ok(true)
	}
}

fn posted(id: i32) -> PostedNotification {
	let identity = Identity {
		package: "com.example.feed".to_owned(),
		tag: None,
		id,
		uid: 10400,
		user: UserId(0),
		post_time: 0,
	};
	PostedNotification::new(identity, Notification::builder().extra("android.title", "item").build())
}

#[test]
fn concurrent_applies_on_distinct_keys_do_not_interfere() {
	let config = DecoratorConfig {
		own_uid: Some(ENGINE_UID),
		..DecoratorConfig::default()
	};
	let runtime = Arc::new(DecoratorRuntime::new(config).unwrap());
	let endpoint = DecoratorEndpoint::new(runtime, Arc::new(Stamp));
	let engine = PeerIdentity::from_uid(ENGINE_UID);
	endpoint
		.on_connect(&engine, Arc::new(NullController), &ConnectOffer::default())
		.unwrap();

	std::thread::scope(|scope| {
		for t in 0..THREADS {
			let endpoint = &endpoint;
			let engine = &engine;
			scope.spawn(move || {
				for n in 0..PER_THREAD {
					let id = t * PER_THREAD + n;
					let original = posted(id);
					let encoded = endpoint.apply(engine, original.clone()).unwrap();
					let merged = merge(&original, encoded.bytes().unwrap()).unwrap();

					assert_eq!(merged.identity.tag, Some(format!("t{id}")));
					assert_eq!(merged.notification.extras.get("stamp"), Some(&Value::Int(i64::from(id))));
					let per_record = merged.notification.extras.get("per-record").and_then(Value::as_map).unwrap();
					assert_eq!(per_record.len(), 8);
					assert_eq!(per_record.get("k7"), Some(&Value::Int(i64::from(id * 100 + 7))));
				}
			});
		}
	});
}
