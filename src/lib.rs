// ruv-dl library - public API

// Re-export error types
pub mod error;
pub use error::{Result, RuvError};

// Module declarations
pub mod commands;
pub mod core;
pub mod ui;

// Re-export commonly used types
pub use crate::core::config::Config;
pub use crate::core::data::{Entry, EntrySet, Episode};

/// Initialize logging. `verbosity` is the number of `-v` flags given.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_secs()
        .parse_default_env()
        .init();
}
