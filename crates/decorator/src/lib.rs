//! Decorator side of the notification decoration protocol.
//!
//! A decorator process creates one [`DecoratorRuntime`] at startup and serves
//! each engine connection through a [`DecoratorEndpoint`]. The endpoint
//! authenticates the engine, negotiates the write-back protocol per bind, routes
//! calls to the [`Decorator`] according to its declared [`Capabilities`] and
//! keeps decorator failures from escaping as anything but a [`RemoteError`].

#![warn(missing_docs)]

mod capability;
mod config;
mod controller;
mod decorator;
mod endpoint;
mod error;
mod peer;
mod runtime;

pub use capability::Capabilities;
pub use config::DecoratorConfig;
pub use controller::{Controller, ControllerAction, ControllerHandle, NotificationChannel};
pub use decorator::{Context, Decorator, RemovalReason};
pub use endpoint::DecoratorEndpoint;
pub use error::{ConfigError, ControllerError, DecoratorFault, DispatchError, RemoteError, RemoteErrorKind, Result};
pub use peer::{PeerIdentity, TrustPolicy, signature_digest};
pub use runtime::DecoratorRuntime;
