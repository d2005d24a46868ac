//! Logging utilities for the caplog data layer.
//!
//! All crates log through `tracing`; this module owns subscriber setup so
//! every entry point (app shell, tests, examples) configures it the same way.

use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber at the default INFO level.
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
///
/// The `RUST_LOG` environment filter still applies on top of the given
/// level, so individual targets can be raised or silenced per run.
pub fn init_with_level(level: Level) {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("caplog={}", level).parse().unwrap());

    // try_init so repeated calls (e.g. from several tests) are harmless.
    let result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_file(true).with_line_number(true))
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Log a result, with different messages for success and error cases.
///
/// Returns the original result so it can be used in a chain.
pub fn log_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    success_message: &str,
    error_context: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => info!("{}", success_message),
        Err(e) => error!("{}: {}", error_context, e),
    }
    result
}
