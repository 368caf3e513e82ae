//! Tracing subscriber set-up for the command line and for tests.
//!
//! The library only emits `tracing` events; installing a subscriber is left to the binary (or to
//! a test), so embedding applications keep control of their own output.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the default subscriber.
///
/// The level filter is read from `RUST_LOG` (e.g. `RUST_LOG=farm_rotations=debug`) and falls back
/// to `info`. Output goes to stderr so that tables printed by the command line stay clean.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Install a `debug` subscriber writing through the test harness. Safe to call repeatedly.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
