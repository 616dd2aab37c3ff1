#![deny(missing_docs)]
//! Shared logging utilities for the arclink workspace.
//!
//! This crate provides the `arclink_*` logging macros used across the codebase,
//! the level selection used by the binary, and a minimal test initializer for
//! the global logger.

use log::LevelFilter;

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! arclink_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! arclink_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! arclink_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! arclink_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! arclink_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Logs one outbound request line at debug level.
///
/// Request lines are only interesting when the `debug` run flag is set, which
/// lowers the global level to `Debug`.
#[macro_export]
macro_rules! arclink_request {
    ($method:expr, $url:expr, $status:expr) => {{
        log::debug!("{} {} -> {}", $method, $url, $status);
    }};
}

/// Returns the level the binary runs at for the given `debug` flag.
pub fn level_for(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level_for(cfg!(debug_assertions)),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
