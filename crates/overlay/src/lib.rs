//! Change-tracked key/value overlay.
//!
//! This crate provides the container that decorators mutate when they touch the
//! free-form part of a record (its extras):
//! * [`Value`] / [`Bundle`]: the serializable payload types
//! * [`OverlayMap`]: a view over a root bundle that records which keys were touched
//! * [`ChangeObserver`]: hook invoked after every mutation

#![warn(missing_docs)]

mod map;
mod value;

pub use map::{Change, ChangeObserver, EntryOp, OverlayMap};
pub use value::{Bundle, Value};

#[cfg(test)]
mod tests;
