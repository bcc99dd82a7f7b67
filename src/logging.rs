//! Tracing subscriber setup.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Builds the event filter: `RUST_LOG` when set and valid, else `fallback`.
///
/// An unparsable `fallback` degrades to `info` with a note on stderr.
pub fn build_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(fallback).unwrap_or_else(|err| {
            eprintln!("invalid log filter \"{fallback}\" ({err}); defaulting to info");
            EnvFilter::new("info")
        })
    })
}

/// Installs the global subscriber (fmt layer to stderr).
///
/// Calling it again after a subscriber is installed is a no-op.
pub fn init_tracing(fallback: &str) {
    tracing_subscriber::registry()
        .with(build_filter(fallback))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .ok();
}
