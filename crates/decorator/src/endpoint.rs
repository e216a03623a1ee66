//! The remote-callable surface of a decorator.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};

use nevo_record::{MutableEnvelope, PostedNotification, WriteBack};
use nevo_wire::{Codec, ConnectOffer, Encoded, ProtocolVersion};
use tracing::{Span, debug, debug_span, error, info, warn};

use crate::capability::Capabilities;
use crate::controller::{Controller, ControllerHandle};
use crate::decorator::{Context, Decorator, RemovalReason};
use crate::error::{DecoratorFault, DispatchError, RemoteError, RemoteErrorKind, Result};
use crate::peer::PeerIdentity;
use crate::runtime::DecoratorRuntime;

/// State fixed by a successful bind.
#[derive(Debug)]
struct Binding {
	caller_uid: i32,
	controller: ControllerHandle,
	codec: Codec,
	capabilities: Capabilities,
}

/// Dispatch endpoint for one engine connection.
///
/// Starts unbound. [`on_connect`](Self::on_connect) verifies the engine,
/// negotiates the write-back protocol and fixes the capability set; every
/// later call must come from the same caller uid. A lost connection is
/// handled by creating a new endpoint; nothing carries over except the
/// shared [`DecoratorRuntime`].
///
/// Calls for different records may run concurrently on any thread.
pub struct DecoratorEndpoint {
	runtime: Arc<DecoratorRuntime>,
	decorator: Arc<dyn Decorator>,
	binding: OnceLock<Binding>,
}

impl DecoratorEndpoint {
	/// Creates an unbound endpoint serving `decorator`.
	pub fn new(runtime: Arc<DecoratorRuntime>, decorator: Arc<dyn Decorator>) -> Self {
		Self {
			runtime,
			decorator,
			binding: OnceLock::new(),
		}
	}

	/// Shared runtime.
	pub fn runtime(&self) -> &Arc<DecoratorRuntime> {
		&self.runtime
	}

	/// Returns true once bound.
	pub fn is_connected(&self) -> bool {
		self.binding.get().is_some()
	}

	/// Capabilities fixed at bind.
	pub fn capabilities(&self) -> Option<Capabilities> {
		self.binding.get().map(|b| b.capabilities)
	}

	/// Negotiated protocol version.
	pub fn protocol_version(&self) -> Option<ProtocolVersion> {
		self.binding.get().map(|b| b.codec.version())
	}

	/// Binds the engine and returns the decorator's capabilities.
	///
	/// # Errors
	///
	/// [`DispatchError::Unauthorized`] if `peer` is not trusted,
	/// [`DispatchError::IncompatibleHost`] if no protocol version is shared,
	/// [`DispatchError::AlreadyConnected`] on a second bind, and
	/// [`DispatchError::Fault`] if the decorator's bind hook fails. A failed
	/// bind leaves the endpoint unbound.
	pub fn on_connect(&self, peer: &PeerIdentity, controller: Arc<dyn Controller>, offer: &ConnectOffer) -> Result<Capabilities> {
		let _guard = self.span("on_connect").entered();
		if self.is_connected() {
			return Err(DispatchError::AlreadyConnected);
		}
		if let Err(e) = self.runtime.trust().verify(peer) {
			warn!(uid = peer.uid, packages = ?peer.packages, error = %e, "rejected bind");
			return Err(e);
		}
		let codec = self.runtime.resolver().resolve(offer).map_err(DispatchError::IncompatibleHost)?;
		let capabilities = self.decorator.capabilities();
		let binding = Binding {
			caller_uid: peer.uid,
			controller: ControllerHandle::new(controller, codec.version()),
			codec,
			capabilities,
		};
		{
			let cx = self.context(&binding);
			self.guarded("on_connected", || self.decorator.on_connected(&cx))?;
		}
		self.binding.set(binding).map_err(|_| DispatchError::AlreadyConnected)?;
		info!(caller_uid = peer.uid, version = %codec.version(), ?capabilities, "connected");
		Ok(capabilities)
	}

	/// Decorates `posted` and encodes the write-back for the engine.
	pub fn apply(&self, peer: &PeerIdentity, posted: PostedNotification) -> Result<Encoded> {
		let binding = self.authorize(peer)?;
		let mut envelope = MutableEnvelope::new(posted, self.runtime.features());
		self.apply_envelope(peer, &mut envelope)?;
		binding.codec.encode(&envelope).map_err(DispatchError::Encode)
	}

	/// Decorates `envelope` in place and selects its write-back mode.
	///
	/// On error the envelope is marked [`WriteBack::Skip`]. An unauthorized
	/// call never reaches the decorator and leaves the envelope untouched.
	pub fn apply_envelope(&self, peer: &PeerIdentity, envelope: &mut MutableEnvelope) -> Result<()> {
		let _guard = self.span("apply").entered();
		let binding = self.authorize(peer)?;
		if !binding.capabilities.contains(Capabilities::DECORATES) {
			envelope.set_write_back(WriteBack::Skip);
			return Ok(());
		}
		let cx = self.context(binding);
		match self.guarded("apply", || self.decorator.apply(&cx, envelope)) {
			Ok(true) => envelope.set_write_back(WriteBack::Incremental),
			Ok(false) => {
				if envelope.is_dirty() {
					debug!(key = %envelope.original_key(), "apply reported no change, discarding edits");
				}
				envelope.set_write_back(WriteBack::Skip);
			}
			Err(e) => {
				envelope.set_write_back(WriteBack::Skip);
				return Err(e);
			}
		}
		Ok(())
	}

	/// Reports a removal by key. Returns true if the decorator claims the follow-up.
	pub fn on_removed(&self, peer: &PeerIdentity, key: &str, reason: RemovalReason) -> Result<bool> {
		let _guard = self.span("on_removed").entered();
		let binding = self.authorize(peer)?;
		if !binding.capabilities.contains(Capabilities::OBSERVES_REMOVAL_BY_KEY) {
			return Ok(false);
		}
		let cx = self.context(binding);
		self.guarded("on_removed", || self.decorator.on_removed(&cx, key, reason))
	}

	/// Reports a removal with the removed record. Returns true if the decorator claims the follow-up.
	pub fn on_removed_with_payload(&self, peer: &PeerIdentity, record: &PostedNotification, reason: RemovalReason) -> Result<bool> {
		let _guard = self.span("on_removed_with_payload").entered();
		let binding = self.authorize(peer)?;
		if !binding.capabilities.contains(Capabilities::OBSERVES_REMOVAL_WITH_PAYLOAD) {
			return Ok(false);
		}
		let cx = self.context(binding);
		self.guarded("on_removed_with_payload", || self.decorator.on_removed_with_payload(&cx, record, reason))
	}

	fn span(&self, op: &'static str) -> Span {
		debug_span!("decorator", name = %self.runtime.name(), op)
	}

	fn binding(&self) -> Result<&Binding> {
		self.binding.get().ok_or(DispatchError::NotConnected)
	}

	fn authorize(&self, peer: &PeerIdentity) -> Result<&Binding> {
		let binding = self.binding()?;
		if peer.uid != binding.caller_uid {
			error!(expected = binding.caller_uid, actual = peer.uid, "caller does not match bound engine");
			return Err(DispatchError::Unauthorized(format!(
				"uid {} is not the bound caller",
				peer.uid
			)));
		}
		Ok(binding)
	}

	fn context<'a>(&self, binding: &'a Binding) -> Context<'a> {
		Context {
			controller: &binding.controller,
			features: self.runtime.features(),
		}
	}

	/// Runs decorator code, turning failures and panics into remote errors.
	fn guarded<T>(&self, op: &'static str, f: impl FnOnce() -> std::result::Result<T, DecoratorFault>) -> Result<T> {
		match catch_unwind(AssertUnwindSafe(f)) {
			Ok(Ok(value)) => Ok(value),
			Ok(Err(fault)) => {
				error!(op, error = ?fault, "decorator failed");
				Err(DispatchError::Fault(fault.into_remote()))
			}
			Err(panic) => {
				let message = panic_message(panic.as_ref());
				error!(op, %message, "decorator panicked");
				Err(DispatchError::Fault(RemoteError::new(RemoteErrorKind::IllegalState, message)))
			}
		}
	}
}

impl std::fmt::Debug for DecoratorEndpoint {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DecoratorEndpoint")
			.field("name", &self.runtime.name())
			.field("binding", &self.binding.get())
			.finish_non_exhaustive()
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_owned()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"decorator panicked".to_owned()
	}
}
