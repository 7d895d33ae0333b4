//! Logging infrastructure.
//!
//! The library only emits `tracing` events. Applications install a
//! subscriber once at startup with `init_tracing`, or `init_with_config`
//! when the level comes from the `[logging]` config section.
//!
//! # Example
//!
//! ```no_run
//! use dawmark_core::logging::{init_tracing, LogLevel};
//!
//! init_tracing(LogLevel::Debug);
//! tracing::info!("Starting extraction");
//! ```

mod types;

pub use types::{LogConfig, LogLevel};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr with timestamps
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    init_with_config(&LogConfig {
        level: default_level,
        ..LogConfig::default()
    });
}

/// Initialize the global subscriber from a `LogConfig`.
///
/// Returns quietly if a subscriber is already installed.
pub fn init_with_config(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter_str()));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.show_target)
        .with_thread_ids(false);

    let result = if config.compact {
        tracing_subscriber::registry()
            .with(layer.compact())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Global tracing subscriber already set");
    }
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
