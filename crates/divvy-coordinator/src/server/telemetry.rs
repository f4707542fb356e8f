//! Console telemetry.
//!
//! Subscribes to standard `tracing` logs printed to the console via
//! `tracing_subscriber::fmt`, filtered by `RUST_LOG` (default `info`).
//! Initialized once by the binary; tests and embedders install their own
//! subscribers.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
