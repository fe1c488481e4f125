//! # Logging Setup
//!
//! `tracing-subscriber` with an `EnvFilter`; `RUST_LOG` overrides the default
//! level. Output goes to stderr and never mixes with CLI prompts or JSON on
//! stdout.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging with `info` as the default level.
///
/// # Environment
/// - `RUST_LOG`: filter directives, e.g. `RUST_LOG=debug` or
///   `RUST_LOG=sprocket_core=trace`
///
/// # Example
/// ```no_run
/// use sprocket_core::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with_default("info");
}

/// Initialize logging, falling back to `default_filter` when `RUST_LOG` is unset.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_with_default(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .try_init();
}

/// Logging for tests: debug level, captured by the test harness
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
