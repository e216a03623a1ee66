//! The overlay map and its change tracking.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::value::{Bundle, Value};

/// A mutation reported to [`ChangeObserver`]s after it has been applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Change<'a> {
	/// The key now holds this value (reported even if the value is unchanged).
	Set(&'a Value),
	/// The key was removed.
	Removed,
	/// A nested overlay under this key was mutated.
	Nested,
}

/// The last operation recorded for a touched key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOp {
	/// The key was written (directly or through a nested overlay).
	Set,
	/// The key was removed.
	Remove,
}

/// Hook notified after every mutation of an [`OverlayMap`].
///
/// Observers run outside the root lock, so they may read the overlay again.
pub trait ChangeObserver: Send + Sync {
	/// Called once per mutated key.
	fn on_changed(&self, key: &str, change: Change<'_>);
}

/// Per-instance change log. Child trackers forward to their parent as [`Change::Nested`].
///
/// Lock order is root bundle, then `entries`.
struct Tracker {
	entries: Mutex<BTreeMap<String, EntryOp>>,
	observers: Mutex<Vec<Arc<dyn ChangeObserver>>>,
	parent: Option<(Arc<Tracker>, String)>,
}

impl Tracker {
	fn new(parent: Option<(Arc<Tracker>, String)>) -> Self {
		Self {
			entries: Mutex::new(BTreeMap::new()),
			observers: Mutex::new(Vec::new()),
			parent,
		}
	}

	/// Logs the change here and in every ancestor. Caller holds the root lock.
	fn log(&self, key: &str, op: EntryOp) {
		self.entries.lock().insert(key.to_owned(), op);
		if let Some((parent, parent_key)) = &self.parent {
			parent.log(parent_key, EntryOp::Set);
		}
	}

	/// Runs observers here and in every ancestor. Caller must not hold the root lock.
	fn notify(&self, key: &str, change: Change<'_>) {
		let observers = self.observers.lock().clone();
		for observer in &observers {
			observer.on_changed(key, change);
		}
		if let Some((parent, parent_key)) = &self.parent {
			parent.notify(parent_key, Change::Nested);
		}
	}
}

/// Change-tracked view over a (possibly nested) bundle.
///
/// All overlays derived from the same root through [`OverlayMap::child`] share
/// one lock, so reads and writes on any of them are serialized against each
/// other. Unrelated roots never contend.
///
/// A child obtained for a key that does not hold a map yet is *on-demand*: it
/// reads as empty and stays detached until its first mutation, which attaches
/// it into the parent exactly once.
pub struct OverlayMap {
	root: Arc<Mutex<Bundle>>,
	path: Vec<String>,
	attached: AtomicBool,
	tracker: Arc<Tracker>,
}

impl OverlayMap {
	/// Creates a root overlay owning `bundle`.
	pub fn new(bundle: Bundle) -> Self {
		Self {
			root: Arc::new(Mutex::new(bundle)),
			path: Vec::new(),
			attached: AtomicBool::new(true),
			tracker: Arc::new(Tracker::new(None)),
		}
	}

	/// Registers an observer for mutations on this overlay and its children.
	pub fn observe(&self, observer: Arc<dyn ChangeObserver>) {
		self.tracker.observers.lock().push(observer);
	}

	/// Sets `key` to `value`.
	pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
		let key = key.into();
		let value = value.into();
		{
			let mut root = self.root.lock();
			self.target_mut(&mut root).insert(key.clone(), value.clone());
			self.tracker.log(&key, EntryOp::Set);
		}
		self.tracker.notify(&key, Change::Set(&value));
	}

	/// Removes `key`. Reported as a change even if the key was absent.
	pub fn remove(&self, key: &str) {
		{
			let mut root = self.root.lock();
			self.target_mut(&mut root).remove(key);
			self.tracker.log(key, EntryOp::Remove);
		}
		self.tracker.notify(key, Change::Removed);
	}

	/// Removes every key, reporting each removed key.
	pub fn clear(&self) {
		let keys: Vec<String> = {
			let mut root = self.root.lock();
			let target = self.target_mut(&mut root);
			let keys: Vec<String> = target.keys().cloned().collect();
			target.clear();
			for key in &keys {
				self.tracker.log(key, EntryOp::Remove);
			}
			keys
		};
		for key in &keys {
			self.tracker.notify(key, Change::Removed);
		}
	}

	/// Returns a copy of the value stored under `key`.
	pub fn get(&self, key: &str) -> Option<Value> {
		self.read(|bundle| bundle.and_then(|b| b.get(key)).cloned())
	}

	/// Returns the value stored under `key`, or `default` when absent.
	pub fn get_or(&self, key: &str, default: Value) -> Value {
		self.get(key).unwrap_or(default)
	}

	/// Returns the boolean under `key`, or `default` when absent or of another type.
	pub fn get_bool(&self, key: &str, default: bool) -> bool {
		self.read(|bundle| bundle.and_then(|b| b.get(key)).and_then(Value::as_bool))
			.unwrap_or(default)
	}

	/// Returns the integer under `key`, or `default` when absent or of another type.
	pub fn get_int(&self, key: &str, default: i64) -> i64 {
		self.read(|bundle| bundle.and_then(|b| b.get(key)).and_then(Value::as_int))
			.unwrap_or(default)
	}

	/// Returns the text under `key`.
	pub fn get_str(&self, key: &str) -> Option<String> {
		self.read(|bundle| bundle.and_then(|b| b.get(key)).and_then(Value::as_str).map(str::to_owned))
	}

	/// Returns the text list under `key`.
	pub fn get_str_list(&self, key: &str) -> Option<Vec<String>> {
		self.read(|bundle| bundle.and_then(|b| b.get(key)).and_then(Value::as_str_list).map(<[String]>::to_vec))
	}

	/// Returns true if `key` is present.
	pub fn contains_key(&self, key: &str) -> bool {
		self.read(|bundle| bundle.is_some_and(|b| b.contains_key(key)))
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.read(|bundle| bundle.map_or(0, Bundle::len))
	}

	/// Returns true if there are no entries.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns a copy of the current contents.
	pub fn snapshot(&self) -> Bundle {
		self.read(|bundle| bundle.cloned().unwrap_or_default())
	}

	/// Returns true if any key has been touched through this instance.
	pub fn is_changed(&self) -> bool {
		self.with_entries(|entries| !entries.is_empty())
	}

	/// Returns the keys touched through this instance (or its children).
	pub fn changed_keys(&self) -> BTreeSet<String> {
		self.with_entries(|entries| entries.keys().cloned().collect())
	}

	/// Returns the last operation recorded per touched key.
	pub fn entries(&self) -> BTreeMap<String, EntryOp> {
		self.with_entries(BTreeMap::clone)
	}

	/// Returns true once this overlay is part of the root bundle.
	pub fn is_attached(&self) -> bool {
		self.attached.load(Ordering::Acquire)
	}

	/// Returns the overlay for the nested bundle under `key`.
	///
	/// If no map is stored under `key` yet, the child is on-demand and will only
	/// be inserted into this overlay when it is first mutated.
	pub fn child(&self, key: impl Into<String>) -> OverlayMap {
		let key = key.into();
		let materialized = self.read(|bundle| bundle.and_then(|b| b.get(&key)).is_some_and(|v| v.as_map().is_some()));
		let mut path = self.path.clone();
		path.push(key.clone());
		OverlayMap {
			root: Arc::clone(&self.root),
			path,
			attached: AtomicBool::new(materialized),
			tracker: Arc::new(Tracker::new(Some((Arc::clone(&self.tracker), key)))),
		}
	}

	fn read<R>(&self, f: impl FnOnce(Option<&Bundle>) -> R) -> R {
		let root = self.root.lock();
		f(descend(&root, &self.path))
	}

	fn with_entries<R>(&self, f: impl FnOnce(&BTreeMap<String, EntryOp>) -> R) -> R {
		let _root = self.root.lock();
		f(&self.tracker.entries.lock())
	}

	/// Resolves the target bundle for a mutation. Caller holds the root lock.
	fn target_mut<'a>(&self, root: &'a mut Bundle) -> &'a mut Bundle {
		if !self.attached.load(Ordering::Acquire) {
			self.attached.store(true, Ordering::Release);
			trace!(path = ?self.path, "attaching on-demand overlay");
		}
		descend_mut(root, &self.path)
	}
}

impl fmt::Debug for OverlayMap {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OverlayMap")
			.field("path", &self.path)
			.field("attached", &self.is_attached())
			.field("changed", &self.changed_keys())
			.finish()
	}
}

fn descend<'a>(bundle: &'a Bundle, path: &[String]) -> Option<&'a Bundle> {
	path.iter().try_fold(bundle, |b, segment| b.get(segment)?.as_map())
}

/// Walks `path`, creating (or replacing non-map values with) empty maps on the way.
fn descend_mut<'a>(mut bundle: &'a mut Bundle, path: &[String]) -> &'a mut Bundle {
	for segment in path {
		let slot = bundle.entry(segment.clone()).or_insert_with(|| Value::Map(Bundle::new()));
		if slot.as_map().is_none() {
			*slot = Value::Map(Bundle::new());
		}
		bundle = match slot.as_map_mut() {
			Some(next) => next,
			None => unreachable!("slot was just replaced with a map"),
		};
	}
	bundle
}
