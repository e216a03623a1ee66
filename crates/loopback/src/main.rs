//! Nevo loopback binary.
//!
//! Binds a built-in decorator to an in-process engine, decorates one record
//! and prints the negotiated write-back and the merged record as JSON.

mod decorators;
mod engine;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use nevo_decorator::{DecoratorConfig, DecoratorRuntime};
use nevo_record::PostedNotification;
use nevo_wire::ProtocolVersion;
use tracing::info;

use crate::decorators::Builtin;

/// Uid the loopback engine runs under when the config names none.
const LOOPBACK_UID: i32 = 1000;

/// Loopback command line arguments.
#[derive(Parser, Debug)]
#[command(name = "nevo-loopback")]
#[command(about = "Run a notification decorator against an in-process engine")]
struct Args {
	/// Decorator to run
	#[arg(short, long, value_enum, default_value = "big-text")]
	decorator: Builtin,

	/// Decorator config (TOML)
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Posted record to decorate (JSON); a sample record if omitted
	#[arg(short, long, value_name = "PATH")]
	input: Option<PathBuf>,

	/// Protocol version the engine offers
	#[arg(short, long, default_value_t = ProtocolVersion::LATEST.0)]
	protocol: u32,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let mut config = match &args.config {
		Some(path) => DecoratorConfig::load(path)?,
		None => DecoratorConfig {
			name: args.decorator.name().to_owned(),
			..DecoratorConfig::default()
		},
	};
	config.own_uid.get_or_insert(LOOPBACK_UID);

	let posted = match &args.input {
		Some(path) => read_record(path)?,
		None => engine::sample(),
	};

	info!(decorator = args.decorator.name(), protocol = args.protocol, "starting nevo-loopback");

	let runtime = Arc::new(DecoratorRuntime::new(config)?);
	let report = engine::run(runtime, args.decorator.instantiate(), ProtocolVersion(args.protocol), posted)?;
	println!("{}", serde_json::to_string_pretty(&report)?);

	Ok(())
}

fn read_record(path: &Path) -> anyhow::Result<PostedNotification> {
	let source = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
	serde_json::from_str(&source).with_context(|| format!("parsing {}", path.display()))
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::fmt::format::FmtSpan;
	use tracing_subscriber::prelude::*;

	// NEVO_LOG takes precedence over the verbose flag
	let filter = EnvFilter::try_from_env("NEVO_LOG").unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("nevo=trace,debug")
		} else {
			EnvFilter::new("info")
		}
	});

	let stderr_layer = tracing_subscriber::fmt::layer()
		.with_writer(std::io::stderr)
		.with_span_events(FmtSpan::CLOSE)
		.with_target(verbose);

	tracing_subscriber::registry().with(filter).with(stderr_layer).init();
}

#[cfg(test)]
mod tests;
