use nevo_record::{
	Action, GroupAlertBehavior, HostFeatures, Identity, MutableEnvelope, Notification, NotificationFlags, PostedNotification,
	UserId, Value, WriteBack, extras,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn original(tag: Option<&str>) -> PostedNotification {
	let identity = Identity {
		package: "com.example.mail".to_owned(),
		tag: tag.map(str::to_owned),
		id: 11,
		uid: 10200,
		user: UserId(0),
		post_time: 1_700_000_000_000,
	};
	let notification = Notification::builder()
		.group("inbox")
		.channel_id("mail")
		.extra(extras::TITLE, "Bob")
		.extra(extras::TEXT, "Quarterly report attached")
		.extra("android.subText", "work")
		.build();
	PostedNotification::new(identity, notification)
}

fn open(posted: &PostedNotification) -> MutableEnvelope {
	MutableEnvelope::new(posted.clone(), HostFeatures::all())
}

fn codec(version: ProtocolVersion) -> Codec {
	Codec::for_version(version).unwrap()
}

#[test]
fn test_skip_emits_nothing() {
	let posted = original(None);
	let mut env = open(&posted);
	env.notification_mut().extras().set("headsup", 0);
	env.set_write_back(WriteBack::Skip);
	assert_eq!(codec(ProtocolVersion::LATEST).encode(&env).unwrap(), Encoded::Unchanged);
}

#[test]
fn test_single_field_change_has_single_key() {
	let posted = original(None);
	let mut env = open(&posted);
	env.notification_mut().fields_mut().number = 4;
	env.set_write_back(WriteBack::Incremental);
	let encoded = codec(ProtocolVersion::LATEST).encode(&env).unwrap();
	let Encoded::Incremental(bytes) = encoded else {
		panic!("expected incremental encoding, got {encoded:?}");
	};
	let frame = decode(&bytes).unwrap();
	let keys = frame.payload.changed_keys().unwrap();
	assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec!["number".to_owned()]);
}

#[test]
fn test_single_extra_change_has_single_key() {
	let posted = original(None);
	let mut env = open(&posted);
	let overlay = env.notification_mut().extras();
	overlay.set(extras::TITLE, "Bob");
	overlay.set("headsup", 0);
	env.set_write_back(WriteBack::Incremental);
	let bytes = codec(ProtocolVersion::INCREMENTAL).encode(&env).unwrap();
	let frame = decode(bytes.bytes().unwrap()).unwrap();
	assert_eq!(frame.version, ProtocolVersion::INCREMENTAL);
	assert_eq!(frame.payload.changed_keys().unwrap().len(), 1);
}

#[test]
fn test_full_only_engine_gets_full_record() {
	let posted = original(None);
	let mut env = open(&posted);
	env.set_tag(Some("G".to_owned()));
	env.notification_mut().extras().set("headsup", 0);
	env.set_write_back(WriteBack::Incremental);

	let encoded = codec(ProtocolVersion::FULL_ONLY).encode(&env).unwrap();
	assert_eq!(encoded.mode(), "full");
	let frame = decode(encoded.bytes().unwrap()).unwrap();
	assert_eq!(frame.payload.changed_keys(), None);
	let Payload::Full(full) = &frame.payload else {
		panic!("expected full payload");
	};
	assert_eq!(full.original_tag, None);
	assert_eq!(full.original_key, posted.key());

	let merged = merge(&posted, encoded.bytes().unwrap()).unwrap();
	assert_eq!(merged.identity.tag.as_deref(), Some("G"));
	assert_eq!(merged.notification.extras.get("headsup"), Some(&Value::Int(0)));
	assert_eq!(merged, env.to_posted());
}

#[test]
fn test_restored_tag_sends_no_marker() {
	let posted = original(Some("T"));
	let mut env = open(&posted);
	env.set_tag(Some("X".to_owned()));
	env.set_tag(Some("T".to_owned()));
	env.notification_mut().fields_mut().when = 5;
	env.set_write_back(WriteBack::Incremental);
	let encoded = codec(ProtocolVersion::LATEST).encode(&env).unwrap();
	let frame = decode(encoded.bytes().unwrap()).unwrap();
	let Payload::DeltaV2(delta) = frame.payload else {
		panic!("expected v2 delta");
	};
	assert_eq!(delta.base.tag, TagMarker::Unchanged);
	assert_eq!(delta.base.id, None);
	assert_eq!(env.key(), posted.key());
}

#[test]
fn test_cleared_tag_round_trips() {
	let posted = original(Some("T"));
	let mut env = open(&posted);
	env.set_tag(None);
	env.set_write_back(WriteBack::Incremental);
	let encoded = codec(ProtocolVersion::INCREMENTAL).encode(&env).unwrap();
	let merged = merge(&posted, encoded.bytes().unwrap()).unwrap();
	assert_eq!(merged.identity.tag, None);
	assert_eq!(merged.key(), env.key());
}

#[test]
fn test_override_group_needs_v2_for_delta() {
	let posted = original(None);
	let mut env = open(&posted);
	env.set_override_group_key(Some("ranker".to_owned()));
	env.set_write_back(WriteBack::Incremental);

	let v1 = codec(ProtocolVersion::INCREMENTAL).encode(&env).unwrap();
	assert_eq!(v1.mode(), "full");
	assert_eq!(merge(&posted, v1.bytes().unwrap()).unwrap().override_group_key.as_deref(), Some("ranker"));

	let v2 = codec(ProtocolVersion::OVERRIDE_GROUP).encode(&env).unwrap();
	assert_eq!(v2.mode(), "incremental");
	let frame = decode(v2.bytes().unwrap()).unwrap();
	let Payload::DeltaV2(delta) = frame.payload else {
		panic!("expected v2 delta");
	};
	assert_eq!(
		delta.override_group,
		Some(OverrideGroupChange {
			original: None,
			value: Some("ranker".to_owned()),
		})
	);
	assert_eq!(merge(&posted, v2.bytes().unwrap()).unwrap().group_key(), "0|com.example.mail|g:ranker");
}

#[test]
fn test_decode_rejects_bad_frames() {
	assert_eq!(decode(b"JUNKJUNK"), Err(WireError::BadMagic));
	assert_eq!(decode(b"NEVO"), Err(WireError::BadMagic));
	let mut future = MAGIC.to_vec();
	future.extend_from_slice(&9u32.to_le_bytes());
	assert_eq!(decode(&future), Err(WireError::UnsupportedVersion(9)));

	let delta = Payload::DeltaV1(DeltaV1::default());
	assert!(matches!(
		encode(ProtocolVersion::FULL_ONLY, &delta),
		Err(WireError::ModeMismatch { version: 0, .. })
	));
}

#[test]
fn test_resolver_negotiates_down() {
	let resolver = CodecResolver::new(ProtocolVersion::INCREMENTAL);
	let codec = resolver
		.resolve(&ConnectOffer {
			protocol_version: 2,
			min_protocol_version: 0,
		})
		.unwrap();
	assert_eq!(codec.version(), ProtocolVersion::INCREMENTAL);
}

#[test]
fn test_resolver_renegotiates_every_offer() {
	let resolver = CodecResolver::new(ProtocolVersion::INCREMENTAL);
	let too_new = ConnectOffer {
		protocol_version: 5,
		min_protocol_version: 2,
	};
	assert_eq!(
		resolver.resolve(&too_new).unwrap_err(),
		WireError::IncompatibleHost { required: 2, supported: 1 }
	);
	assert_eq!(resolver.resolve(&ConnectOffer::default()).unwrap().version(), ProtocolVersion::INCREMENTAL);
	let old = ConnectOffer {
		protocol_version: 0,
		min_protocol_version: 0,
	};
	let codec = resolver.resolve(&old).unwrap();
	assert_eq!(codec.version(), ProtocolVersion::FULL_ONLY);
	assert!(!codec.supports_incremental());
}

#[test]
fn test_concurrent_resolution_follows_each_offer() {
	let resolver = CodecResolver::default();
	std::thread::scope(|scope| {
		for i in 0..8u32 {
			let resolver = &resolver;
			scope.spawn(move || {
				let offer = ConnectOffer {
					protocol_version: i % 3,
					min_protocol_version: 0,
				};
				assert_eq!(resolver.resolve(&offer).unwrap().version(), ProtocolVersion(i % 3));
			});
		}
	});
}

#[derive(Debug, Clone)]
enum Edit {
	Tag(Option<String>),
	Id(i32),
	OverrideGroup(Option<String>),
	Number(i32),
	Flags(u32),
	Action(String),
	Group(Option<String>),
	Alert(u8),
	SetExtra(String, i64),
	RemoveExtra(String),
}

fn arb_name() -> impl Strategy<Value = String> {
	prop::sample::select(vec!["a", "b", "T", "inbox"]).prop_map(str::to_owned)
}

fn arb_extra_key() -> impl Strategy<Value = String> {
	prop::sample::select(vec![extras::TITLE, extras::TEXT, "android.subText", "headsup"]).prop_map(str::to_owned)
}

fn arb_edit() -> impl Strategy<Value = Edit> {
	prop_oneof![
		prop::option::of(arb_name()).prop_map(Edit::Tag),
		(9..13i32).prop_map(Edit::Id),
		prop::option::of(arb_name()).prop_map(Edit::OverrideGroup),
		(0..3i32).prop_map(Edit::Number),
		(0..0x400u32).prop_map(Edit::Flags),
		arb_name().prop_map(Edit::Action),
		prop::option::of(arb_name()).prop_map(Edit::Group),
		(0..3u8).prop_map(Edit::Alert),
		(arb_extra_key(), 0..3i64).prop_map(|(k, v)| Edit::SetExtra(k, v)),
		arb_extra_key().prop_map(Edit::RemoveExtra),
	]
}

fn apply(env: &mut MutableEnvelope, edit: Edit) {
	match edit {
		Edit::Tag(tag) => env.set_tag(tag),
		Edit::Id(id) => env.set_id(id),
		Edit::OverrideGroup(group) => env.set_override_group_key(group),
		Edit::Number(n) => env.notification_mut().fields_mut().number = n,
		Edit::Flags(bits) => env.notification_mut().fields_mut().flags = NotificationFlags::from_bits_retain(bits),
		Edit::Action(title) => env.notification_mut().add_action(Action::new(title, "intent:x")),
		Edit::Group(group) => env.notification_mut().set_group(group),
		Edit::Alert(n) => env.notification_mut().set_group_alert_behavior(match n {
			0 => GroupAlertBehavior::All,
			1 => GroupAlertBehavior::Summary,
			_ => GroupAlertBehavior::Children,
		}),
		Edit::SetExtra(key, value) => env.notification().extras().set(key, value),
		Edit::RemoveExtra(key) => env.notification().extras().remove(&key),
	}
}

proptest! {
	#[test]
	fn prop_merge_reproduces_live_record(
		tag in prop::option::of(arb_name()),
		edits in prop::collection::vec(arb_edit(), 0..12),
		version in 0..=2u32,
	) {
		let posted = original(tag.as_deref());
		let mut env = open(&posted);
		for edit in edits {
			apply(&mut env, edit);
		}
		env.set_write_back(WriteBack::Incremental);
		let encoded = codec(ProtocolVersion(version)).encode(&env).unwrap();
		let merged = merge(&posted, encoded.bytes().unwrap()).unwrap();
		prop_assert_eq!(merged.key(), env.key());
		prop_assert_eq!(merged.group_key(), env.group_key());
		prop_assert_eq!(merged, env.to_posted());
	}

	#[test]
	fn prop_delta_lists_only_real_differences(edits in prop::collection::vec(arb_edit(), 0..12)) {
		let posted = original(None);
		let mut env = open(&posted);
		for edit in edits {
			apply(&mut env, edit);
		}
		env.set_write_back(WriteBack::Incremental);
		let encoded = codec(ProtocolVersion::LATEST).encode(&env).unwrap();
		let frame = decode(encoded.bytes().unwrap()).unwrap();
		let keys = frame.payload.changed_keys().unwrap();
		prop_assert_eq!(keys.is_empty(), !env.is_changed());
	}
}
