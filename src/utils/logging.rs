// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the console subscriber, honouring `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls leave the existing subscriber in place.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr);

    if subscriber.try_init().is_err() {
        tracing::debug!("Global tracing subscriber already initialized");
    }
}
