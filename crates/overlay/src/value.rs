use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ordered string-keyed map of [`Value`]s.
///
/// Ordering keeps wire encodings deterministic, so two equal bundles always
/// produce identical bytes.
pub type Bundle = BTreeMap<String, Value>;

/// A single payload value stored in a [`Bundle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
	/// Boolean flag.
	Bool(bool),
	/// Signed integer (covers both 32 and 64 bit payload fields).
	Int(i64),
	/// Floating point number.
	Double(f64),
	/// Text.
	Str(String),
	/// List of text entries.
	StrList(Vec<String>),
	/// List of integers.
	IntList(Vec<i64>),
	/// Opaque binary blob.
	Bytes(Vec<u8>),
	/// Nested bundle.
	Map(Bundle),
}

impl Value {
	/// Returns the boolean payload, if this is a [`Value::Bool`].
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the integer payload, if this is a [`Value::Int`].
	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns the text payload, if this is a [`Value::Str`].
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the list payload, if this is a [`Value::StrList`].
	pub fn as_str_list(&self) -> Option<&[String]> {
		match self {
			Self::StrList(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the nested bundle, if this is a [`Value::Map`].
	pub fn as_map(&self) -> Option<&Bundle> {
		match self {
			Self::Map(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the nested bundle mutably, if this is a [`Value::Map`].
	pub(crate) fn as_map_mut(&mut self) -> Option<&mut Bundle> {
		match self {
			Self::Map(v) => Some(v),
			_ => None,
		}
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Self::Bool(v)
	}
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Self::Int(i64::from(v))
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Self::Int(v)
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Self::Double(v)
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Self::Str(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Self::Str(v.to_owned())
	}
}

impl From<Vec<String>> for Value {
	fn from(v: Vec<String>) -> Self {
		Self::StrList(v)
	}
}

impl From<Vec<i64>> for Value {
	fn from(v: Vec<i64>) -> Self {
		Self::IntList(v)
	}
}

impl From<Vec<u8>> for Value {
	fn from(v: Vec<u8>) -> Self {
		Self::Bytes(v)
	}
}

impl From<Bundle> for Value {
	fn from(v: Bundle) -> Self {
		Self::Map(v)
	}
}
