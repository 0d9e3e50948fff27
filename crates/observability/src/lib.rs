//! Process-wide tracing setup shared by the console binaries.

/// Initialize tracing with the format and filter taken from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Subscriber configuration (filter, output format).
pub mod tracing;
