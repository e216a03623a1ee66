use std::collections::BTreeSet;
use std::sync::Arc;

use nevo_decorator::{Controller, DecoratorConfig, DecoratorRuntime, NotificationChannel};
use nevo_record::{PostedNotification, UserId, Value, extras};
use nevo_wire::ProtocolVersion;
use pretty_assertions::assert_eq;

use crate::decorators::{Builtin, HEADS_UP};
use crate::engine::{self, LoopbackController};

fn runtime(name: &str) -> Arc<DecoratorRuntime> {
	let config = DecoratorConfig {
		name: name.to_owned(),
		own_uid: Some(1000),
		..DecoratorConfig::default()
	};
	Arc::new(DecoratorRuntime::new(config).unwrap())
}

fn with_text(text: &str) -> PostedNotification {
	let mut posted = engine::sample();
	posted.notification.extras.insert(extras::TEXT.to_owned(), Value::from(text));
	posted
}

#[test]
fn test_big_text_promotes_long_text_incrementally() {
	let report = engine::run(
		runtime("big-text"),
		Builtin::BigText.instantiate(),
		ProtocolVersion::LATEST,
		engine::sample(),
	)
	.unwrap();

	assert_eq!(report.mode, "incremental");
	let expected: BTreeSet<String> = [extras::TITLE_BIG, extras::BIG_TEXT, extras::TEMPLATE]
		.into_iter()
		.map(|k| format!("extras.{k}"))
		.collect();
	assert_eq!(report.changed_keys, Some(expected));

	let merged = &report.record.notification.extras;
	assert_eq!(merged.get(extras::TEMPLATE), Some(&Value::from(extras::TEMPLATE_BIG_TEXT)));
	assert_eq!(merged.get(extras::TITLE_BIG), Some(&Value::from("Ada")));
	assert_eq!(merged.get(extras::BIG_TEXT), merged.get(extras::TEXT));
	assert_eq!(report.record.identity, engine::sample().identity);
}

#[test]
fn test_big_text_leaves_short_text_alone() {
	let posted = with_text("See you");
	let report = engine::run(runtime("big-text"), Builtin::BigText.instantiate(), ProtocolVersion::LATEST, posted.clone())
		.unwrap();

	assert_eq!(report.mode, "unchanged");
	assert_eq!(report.frame_len, 0);
	assert_eq!(report.record, posted);
}

#[test]
fn test_big_text_skips_styled_records() {
	let mut posted = engine::sample();
	posted
		.notification
		.extras
		.insert(extras::TEMPLATE.to_owned(), Value::from(extras::TEMPLATE_MESSAGING));
	let report = engine::run(runtime("big-text"), Builtin::BigText.instantiate(), ProtocolVersion::LATEST, posted.clone())
		.unwrap();

	assert_eq!(report.mode, "unchanged");
	assert_eq!(report.record, posted);
}

#[test]
fn test_no_heads_up_sends_full_record_to_old_engines() {
	let report = engine::run(
		runtime("no-heads-up"),
		Builtin::NoHeadsUp.instantiate(),
		ProtocolVersion::FULL_ONLY,
		engine::sample(),
	)
	.unwrap();

	assert_eq!(report.protocol_version, 0);
	assert_eq!(report.mode, "full");
	assert_eq!(report.changed_keys, None);
	assert_eq!(report.record.notification.extras.get(HEADS_UP), Some(&Value::Int(0)));
}

#[test]
fn test_untrusted_engine_is_refused() {
	let config = DecoratorConfig {
		own_uid: None,
		..DecoratorConfig::default()
	};
	let runtime = Arc::new(DecoratorRuntime::new(config).unwrap());
	let err = engine::run(runtime, Builtin::NoHeadsUp.instantiate(), ProtocolVersion::LATEST, engine::sample())
		.unwrap_err();

	assert!(format!("{err:#}").starts_with("binding decorator"));
}

#[test]
fn test_json_input_fills_missing_fields() {
	let source = r#"{
		"identity": { "package": "com.example.mail", "tag": null, "id": 3, "uid": 10300, "user": 0, "post_time": 0 },
		"notification": { "extras": { "android.text": { "Str": "Quarterly report attached, please review" } } }
	}"#;
	let posted: PostedNotification = serde_json::from_str(source).unwrap();

	assert_eq!(posted.key(), "0|com.example.mail|3|null|10300");
	assert_eq!(posted.override_group_key, None);
	assert_eq!(posted.notification.channel_id(), None);

	let report = engine::run(runtime("big-text"), Builtin::BigText.instantiate(), ProtocolVersion::LATEST, posted).unwrap();
	assert_eq!(report.mode, "incremental");
	assert_eq!(report.record.notification.extras.get(extras::TITLE_BIG), None);
}

#[test]
fn test_loopback_controller_keeps_channels_per_package() {
	let controller = LoopbackController::default();
	let channel = NotificationChannel {
		id: "alerts".to_owned(),
		name: "Alerts".to_owned(),
		importance: 4,
		description: None,
	};
	controller
		.create_notification_channels("com.example.chat", UserId(0), std::slice::from_ref(&channel))
		.unwrap();

	assert_eq!(
		controller.notification_channel("com.example.chat", UserId(0), "alerts").unwrap(),
		Some(channel)
	);
	assert_eq!(controller.notification_channel("com.example.mail", UserId(0), "alerts").unwrap(), None);

	controller
		.delete_notification_channel("com.example.chat", UserId(0), "alerts")
		.unwrap();
	assert_eq!(controller.notification_channel("com.example.chat", UserId(0), "alerts").unwrap(), None);
}

#[test]
fn test_cancel_drops_the_stored_record() {
	let controller = LoopbackController::default();
	let posted = engine::sample();
	let key = posted.key();
	controller.post(posted.clone());

	assert_eq!(controller.latest_notifications(std::slice::from_ref(&key)).unwrap(), vec![posted]);
	controller
		.perform_action(nevo_decorator::ControllerAction::Cancel { key: key.clone() })
		.unwrap();
	assert!(controller.latest_notifications(&[key]).unwrap().is_empty());
	assert_eq!(controller.actions().len(), 1);
}

#[test]
fn test_archive_keeps_latest_posts_last() {
	let controller = LoopbackController::default();
	let first = engine::sample();
	let key = first.key();
	let second = with_text("Moved to Thursday, same room as before");
	controller.post(first.clone());
	controller.post(second.clone());

	assert_eq!(controller.archived_notifications(&key, 10).unwrap(), vec![first, second.clone()]);
	assert_eq!(controller.archived_notifications(&key, 1).unwrap(), vec![second]);
	assert!(controller.archived_notifications("0|com.example.none|1|null|1", 5).unwrap().is_empty());
}
