use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;

use super::*;

fn bundle(entries: &[(&str, Value)]) -> Bundle {
	entries.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
}

#[derive(Default)]
struct CountingObserver {
	sets: AtomicUsize,
	removals: AtomicUsize,
	nested: AtomicUsize,
}

impl ChangeObserver for CountingObserver {
	fn on_changed(&self, _key: &str, change: Change<'_>) {
		let counter = match change {
			Change::Set(_) => &self.sets,
			Change::Removed => &self.removals,
			Change::Nested => &self.nested,
		};
		counter.fetch_add(1, Ordering::SeqCst);
	}
}

#[test]
fn test_get_falls_back_to_default() {
	let map = OverlayMap::new(bundle(&[("title", "Hello".into())]));
	assert_eq!(map.get_str("title").as_deref(), Some("Hello"));
	assert_eq!(map.get_int("number", 7), 7);
	assert!(!map.get_bool("title", false));
	assert_eq!(map.get_or("missing", Value::Int(1)), Value::Int(1));
	assert!(!map.is_changed());
}

#[test]
fn test_set_and_remove_are_tracked() {
	let map = OverlayMap::new(Bundle::new());
	map.set("a", 1);
	map.set("b", "x");
	map.remove("a");
	assert_eq!(map.get("a"), None);
	assert_eq!(map.get_str("b").as_deref(), Some("x"));
	assert!(map.is_changed());
	assert_eq!(map.changed_keys(), BTreeSet::from(["a".to_owned(), "b".to_owned()]));
	assert_eq!(map.entries().get("a"), Some(&EntryOp::Remove));
	assert_eq!(map.entries().get("b"), Some(&EntryOp::Set));
}

#[test]
fn test_rewriting_same_value_still_counts_as_touched() {
	let map = OverlayMap::new(bundle(&[("k", Value::Int(1))]));
	map.set("k", 1);
	assert_eq!(map.changed_keys().len(), 1);
}

#[test]
fn test_clear_reports_each_key() {
	let map = OverlayMap::new(bundle(&[("a", Value::Int(1)), ("b", Value::Int(2))]));
	let observer = Arc::new(CountingObserver::default());
	map.observe(observer.clone());
	map.clear();
	assert!(map.is_empty());
	assert_eq!(observer.removals.load(Ordering::SeqCst), 2);
	assert_eq!(map.changed_keys().len(), 2);
}

#[test]
fn test_observer_sees_every_mutation() {
	let map = OverlayMap::new(Bundle::new());
	let observer = Arc::new(CountingObserver::default());
	map.observe(observer.clone());
	map.set("a", true);
	map.set("a", false);
	map.remove("a");
	assert_eq!(observer.sets.load(Ordering::SeqCst), 2);
	assert_eq!(observer.removals.load(Ordering::SeqCst), 1);
}

#[test]
fn test_existing_child_is_attached() {
	let nested = bundle(&[("inner", Value::Int(3))]);
	let map = OverlayMap::new(bundle(&[("child", Value::Map(nested))]));
	let child = map.child("child");
	assert!(child.is_attached());
	assert_eq!(child.get_int("inner", 0), 3);
	child.set("inner", 4);
	assert_eq!(map.get("child"), Some(Value::Map(bundle(&[("inner", Value::Int(4))]))));
}

#[test]
fn test_on_demand_child_stays_detached_until_written() {
	let map = OverlayMap::new(Bundle::new());
	let child = map.child("lazy");
	assert!(!child.is_attached());
	assert!(child.is_empty());
	assert_eq!(child.get("anything"), None);
	assert!(!map.contains_key("lazy"));
	assert!(!map.is_changed());

	child.set("x", 1);
	assert!(child.is_attached());
	assert!(map.contains_key("lazy"));
	assert_eq!(map.changed_keys(), BTreeSet::from(["lazy".to_owned()]));

	child.set("y", 2);
	let stored = map.get("lazy");
	assert_eq!(stored, Some(Value::Map(bundle(&[("x", Value::Int(1)), ("y", Value::Int(2))]))));
}

#[test]
fn test_nested_on_demand_children_attach_whole_path() {
	let map = OverlayMap::new(Bundle::new());
	let observer = Arc::new(CountingObserver::default());
	map.observe(observer.clone());
	let grandchild = map.child("a").child("b");
	grandchild.set("c", "deep");
	let a = map.get("a").and_then(|v| v.as_map().cloned()).unwrap_or_default();
	assert_eq!(a.get("b").and_then(|v| v.as_map()).and_then(|b| b.get("c")), Some(&Value::from("deep")));
	assert_eq!(observer.nested.load(Ordering::SeqCst), 1);
}

#[test]
fn test_child_replaces_non_map_value_on_attach() {
	let map = OverlayMap::new(bundle(&[("slot", Value::Int(1))]));
	let child = map.child("slot");
	assert!(!child.is_attached());
	child.set("k", true);
	assert_eq!(map.get("slot"), Some(Value::Map(bundle(&[("k", Value::Bool(true))]))));
}

#[test]
fn test_concurrent_writers_on_shared_root() {
	let map = Arc::new(OverlayMap::new(Bundle::new()));
	std::thread::scope(|scope| {
		for t in 0..8 {
			let map = Arc::clone(&map);
			scope.spawn(move || {
				let child = map.child(format!("t{t}"));
				for i in 0..100 {
					child.set(format!("k{i}"), i64::from(i));
				}
			});
		}
	});
	assert_eq!(map.len(), 8);
	for t in 0..8 {
		assert_eq!(map.child(format!("t{t}")).len(), 100);
	}
}

#[test]
fn test_value_is_never_visible_before_its_change() {
	for _ in 0..64 {
		let map = OverlayMap::new(Bundle::new());
		let child = map.child("nested");
		std::thread::scope(|scope| {
			scope.spawn(|| {
				map.set("k", 1);
				child.set("inner", 2);
			});
			scope.spawn(|| {
				for _ in 0..1000 {
					if map.contains_key("k") {
						assert!(map.changed_keys().contains("k"));
					}
					if child.contains_key("inner") {
						assert!(child.is_changed());
						assert!(map.changed_keys().contains("nested"));
					}
				}
			});
		});
	}
}

#[test]
fn test_observer_sees_its_own_change_logged() {
	struct ReadsBack(Arc<OverlayMap>, AtomicUsize);
	impl ChangeObserver for ReadsBack {
		fn on_changed(&self, key: &str, _change: Change<'_>) {
			assert!(self.0.changed_keys().contains(key));
			self.1.fetch_add(1, Ordering::SeqCst);
		}
	}

	let map = Arc::new(OverlayMap::new(Bundle::new()));
	let observer = Arc::new(ReadsBack(Arc::clone(&map), AtomicUsize::new(0)));
	map.observe(observer.clone());
	map.set("a", 1);
	map.remove("a");
	assert_eq!(observer.1.load(Ordering::SeqCst), 2);
}

proptest! {
	#[test]
	fn prop_changed_keys_match_touched_keys(ops in prop::collection::vec((0u8..6, any::<bool>()), 0..40)) {
		let map = OverlayMap::new(Bundle::new());
		let mut touched = BTreeSet::new();
		for (k, is_set) in ops {
			let key = format!("k{k}");
			if is_set {
				map.set(key.clone(), i64::from(k));
			} else {
				map.remove(&key);
			}
			touched.insert(key);
		}
		prop_assert_eq!(map.changed_keys(), touched);
	}
}
