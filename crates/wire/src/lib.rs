//! Write-back protocol between decorators and the engine.
//!
//! A decorated [`MutableEnvelope`](nevo_record::MutableEnvelope) travels back
//! either as a full record or as a delta against the record the engine sent.
//! Which encodings exist is fixed per [`ProtocolVersion`]; the version is
//! negotiated at each bind by the [`CodecResolver`] and the resulting
//! [`Codec`] is used for every call after that.
//!
//! The engine side turns a frame back into a record with [`merge`].

#![warn(missing_docs)]

mod codec;
mod error;
mod frame;
mod merge;
mod resolver;

pub use codec::{Codec, Encoded};
pub use error::{Result, WireError};
pub use frame::{DeltaV1, DeltaV2, Frame, FullRecord, MAGIC, OverrideGroupChange, Payload, ProtocolVersion, TagMarker, decode, encode};
pub use merge::merge;
pub use resolver::{CodecResolver, ConnectOffer};

#[cfg(test)]
mod tests;
