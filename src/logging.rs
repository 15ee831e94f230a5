//! Tracing subscriber setup for binaries embedding the pool.
//!
//! Libraries only emit `tracing` events; call [`init`] once from the host
//! application if nothing else installs a subscriber.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global subscriber with the given default level and format
/// ("json" or "pretty"). `RUST_LOG` overrides the level when set.
pub fn init(level: &str, format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("rondo={}", level).into());

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
