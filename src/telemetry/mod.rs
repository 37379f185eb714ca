//! Tracing initialization for embedders.
//!
//! The core itself only emits through the `tracing` macros; hosts that do
//! not install their own subscriber can call [`init_telemetry`] once at
//! startup.
//!
//! Respects `RUST_LOG` via `EnvFilter`, defaulting to `info`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber with console output.
///
/// Call at most once per process. Embedders that already install a
/// subscriber should skip this entirely.
pub fn init_telemetry() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Tracing initialized");
}
