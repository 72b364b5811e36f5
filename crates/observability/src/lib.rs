//! Tracing/logging setup shared by storefront binaries.

/// Tracing configuration (filters, output formats).
pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize process-wide JSON logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::Json);
}

/// Human-readable logs for interactive tools.
pub fn init_pretty() {
    tracing::init(LogFormat::Text);
}
