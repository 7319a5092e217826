//! Process-wide logging setup shared by the binaries.

/// Tracing subscriber configuration.
pub mod tracing;

pub use self::tracing::LogFormat;

/// Initialize logging with `info` as the default level. Output is JSON
/// unless `LOG_FORMAT=pretty`.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init_with("info", LogFormat::from_env());
}
