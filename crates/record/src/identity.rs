//! Identity fields and the key function shared by engine and decorators.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{KeyError, Result};

const NULL_TAG: &str = "null";

/// Owning user (profile) of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct UserId(pub i32);

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// The identity of a posted notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
	/// Package that posted the notification.
	pub package: String,
	/// Optional tag, scoped to the package.
	pub tag: Option<String>,
	/// Numeric id, scoped to package and tag.
	pub id: i32,
	/// Uid of the posting process.
	pub uid: i32,
	/// Owning user.
	pub user: UserId,
	/// Post time in milliseconds since the epoch.
	pub post_time: i64,
}

impl Identity {
	/// Derives the key: `user|package|id|tag|uid`, with `null` for an absent tag.
	///
	/// Post time does not participate, so reposts keep their key.
	pub fn key(&self) -> String {
		format!(
			"{}|{}|{}|{}|{}",
			self.user,
			self.package,
			self.id,
			self.tag.as_deref().unwrap_or(NULL_TAG),
			self.uid
		)
	}

	/// Derives the group key.
	///
	/// An override group wins over the notification's own group. Without
	/// either, a notification that has a sort key is grouped by channel, and
	/// otherwise it is its own group.
	pub fn group_key(&self, override_group: Option<&str>, group: Option<&str>, sort_key: Option<&str>, channel: Option<&str>) -> String {
		if let Some(group) = override_group.or(group) {
			return format!("{}|{}|g:{group}", self.user, self.package);
		}
		if sort_key.is_none() {
			return self.key();
		}
		format!("{}|{}|c:{}", self.user, self.package, channel.unwrap_or(NULL_TAG))
	}
}

/// Parsed components of a key, as `(user, package, id, tag, uid)`.
pub type KeyParts = (UserId, String, i32, Option<String>, i32);

/// Splits a key produced by [`Identity::key`] back into its components.
///
/// Tags may contain `|`; the uid is always the last component and the package
/// never contains `|`.
pub fn parse_key(key: &str) -> Result<KeyParts> {
	let malformed = || KeyError::Malformed(key.to_owned());
	let (head, uid) = key.rsplit_once('|').ok_or_else(malformed)?;
	let mut parts = head.splitn(4, '|');
	let (Some(user), Some(package), Some(id), Some(tag)) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
		return Err(malformed());
	};
	if package.is_empty() {
		return Err(malformed());
	}
	let number = |component: &'static str, text: &str| {
		text.parse::<i32>().map_err(|_| KeyError::InvalidNumber {
			component,
			key: key.to_owned(),
		})
	};
	let tag = (tag != NULL_TAG).then(|| tag.to_owned());
	Ok((UserId(number("user", user)?), package.to_owned(), number("id", id)?, tag, number("uid", uid)?))
}
