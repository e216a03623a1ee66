//! Notification records and the mutation facade handed to decorators.
//!
//! The engine owns a [`PostedNotification`]. For one decoration pass it is
//! wrapped into a [`MutableEnvelope`], whose [`MutableNotification`] keeps the
//! untouched original next to the decorator's overrides so the exact set of
//! changes can be shipped back.

#![warn(missing_docs)]

mod envelope;
mod error;
/// Well-known extras keys and template names.
pub mod extras;
mod features;
mod identity;
mod mutable;
mod notification;
mod patch;

pub use envelope::{MutableEnvelope, PostedNotification, WriteBack};
pub use error::{KeyError, Result};
pub use features::{HostFeatures, LATEST_PLATFORM_LEVEL, PlatformLevel};
pub use identity::{Identity, KeyParts, UserId, parse_key};
pub use mutable::{ExtraOp, MutableNotification};
pub use nevo_overlay::{Bundle, OverlayMap, Value};
pub use notification::{
	Action, BubbleMetadata, GroupAlertBehavior, Icon, Notification, NotificationBuilder, NotificationFlags, PublicFields,
};
pub use patch::{FieldChange, Fields, NotificationPatch};
