//! Decorators shipped with the loopback binary.

use std::sync::Arc;

use clap::ValueEnum;
use nevo_decorator::{Capabilities, Context, Decorator, DecoratorFault};
use nevo_record::{MutableEnvelope, extras};
use tracing::trace;

/// Extras key read by the engine to suppress heads-up display.
pub const HEADS_UP: &str = "headsup";

/// Shortest text promoted to the big text layout.
pub const MIN_BIG_TEXT_LEN: usize = 20;

/// Built-in decorator selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Builtin {
	/// Disables heads-up display for every record.
	NoHeadsUp,
	/// Shows long text in the expanded big text layout.
	BigText,
}

impl Builtin {
	/// Name used for the runtime when the config does not set one.
	pub fn name(self) -> &'static str {
		match self {
			Self::NoHeadsUp => "no-heads-up",
			Self::BigText => "big-text",
		}
	}

	/// Instantiates the decorator.
	pub fn instantiate(self) -> Arc<dyn Decorator> {
		match self {
			Self::NoHeadsUp => Arc::new(NoHeadsUp),
			Self::BigText => Arc::new(BigText),
		}
	}
}

/// Marks every record as not eligible for heads-up display.
#[derive(Debug, Default)]
pub struct NoHeadsUp;

impl Decorator for NoHeadsUp {
	fn capabilities(&self) -> Capabilities {
		Capabilities::DECORATES
	}

	fn apply(&self, _cx: &Context<'_>, envelope: &mut MutableEnvelope) -> Result<bool, DecoratorFault> {
		envelope.notification().extras().set(HEADS_UP, 0i64);
		Ok(true)
	}
}

/// Promotes long plain text to the big text template.
#[derive(Debug, Default)]
pub struct BigText;

impl Decorator for BigText {
	fn capabilities(&self) -> Capabilities {
		Capabilities::DECORATES
	}

	fn apply(&self, _cx: &Context<'_>, envelope: &mut MutableEnvelope) -> Result<bool, DecoratorFault> {
		let overlay = envelope.notification().extras();
		if overlay.get_str(extras::TEMPLATE).is_some() {
			trace!(key = %envelope.key(), "already styled");
			return Ok(false);
		}
		let Some(text) = overlay.get_str(extras::TEXT) else {
			return Ok(false);
		};
		if text.chars().count() < MIN_BIG_TEXT_LEN {
			return Ok(false);
		}
		if let Some(title) = overlay.get_str(extras::TITLE) {
			overlay.set(extras::TITLE_BIG, title);
		}
		overlay.set(extras::BIG_TEXT, text);
		overlay.set(extras::TEMPLATE, extras::TEMPLATE_BIG_TEXT);
		Ok(true)
	}
}
