//! The trait decorator implementations provide.

use nevo_record::{HostFeatures, MutableEnvelope, PostedNotification};
use nevo_wire::ProtocolVersion;

use crate::capability::Capabilities;
use crate::controller::ControllerHandle;
use crate::error::DecoratorFault;

/// Why a record was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RemovalReason(pub i32);

impl RemovalReason {
	/// Reason not reported.
	pub const UNKNOWN: Self = Self(0);
	/// The user tapped the record.
	pub const CLICK: Self = Self(1);
	/// The user dismissed the record.
	pub const CANCEL: Self = Self(2);
	/// The user dismissed all records.
	pub const CANCEL_ALL: Self = Self(3);
	/// The posting app cancelled the record.
	pub const APP_CANCEL: Self = Self(8);
	/// A listener cancelled the record.
	pub const LISTENER_CANCEL: Self = Self(10);
	/// The group summary was cancelled.
	pub const GROUP_SUMMARY_CANCELED: Self = Self(12);
	/// The record was snoozed.
	pub const SNOOZED: Self = Self(18);
	/// The record timed out.
	pub const TIMEOUT: Self = Self(19);
}

/// What a decorator sees of its connection during a call.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
	pub(crate) controller: &'a ControllerHandle,
	pub(crate) features: HostFeatures,
}

impl Context<'_> {
	/// Requests back to the engine.
	pub fn controller(&self) -> &ControllerHandle {
		self.controller
	}

	/// Negotiated protocol version.
	pub fn protocol_version(&self) -> ProtocolVersion {
		self.controller.version()
	}

	/// Host features.
	pub fn features(&self) -> HostFeatures {
		self.features
	}
}

/// A notification decorator.
///
/// Only the callbacks named in [`Decorator::capabilities`] are ever invoked;
/// the declaration is read once when the engine binds.
pub trait Decorator: Send + Sync {
	/// Callbacks this decorator implements.
	fn capabilities(&self) -> Capabilities;

	/// Called once after a successful bind.
	fn on_connected(&self, _cx: &Context<'_>) -> Result<(), DecoratorFault> {
		Ok(())
	}

	/// Decorates a posted record. Returns true if anything was changed.
	///
	/// Returning false discards every change made to `envelope`.
	fn apply(&self, _cx: &Context<'_>, _envelope: &mut MutableEnvelope) -> Result<bool, DecoratorFault> {
		Ok(false)
	}

	/// Observes a removal by key.
	///
	/// Returns true if the decorator takes care of follow-up removals itself.
	fn on_removed(&self, _cx: &Context<'_>, _key: &str, _reason: RemovalReason) -> Result<bool, DecoratorFault> {
		Ok(false)
	}

	/// Observes a removal with the removed record.
	///
	/// Returns true if the decorator takes care of follow-up removals itself.
	fn on_removed_with_payload(
		&self,
		_cx: &Context<'_>,
		_record: &PostedNotification,
		_reason: RemovalReason,
	) -> Result<bool, DecoratorFault> {
		Ok(false)
	}
}
