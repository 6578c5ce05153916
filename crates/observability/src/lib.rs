//! Tracing and logging (shared setup).

/// Initialize process-wide tracing/logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(filter: &str, format: LogFormat) {
    tracing::init(filter, format);
}

/// Tracing configuration (filters, output formats).
pub mod tracing;

pub use self::tracing::LogFormat;
