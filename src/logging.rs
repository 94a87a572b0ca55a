// src/logging.rs

//! Logger bootstrap and runtime level control.
//!
//! The `env_logger` filter is opened up to `trace` at startup (unless
//! `RUST_LOG` says otherwise), and the effective level is then gated with
//! `log::set_max_level`, which can be changed at any time.

use std::fmt;

use env_logger::Env;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Verbosity levels accepted by [`set_log_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Err,
    /// Same as `Err`; `log` has no level above error.
    Critical,
    Off,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Err | LogLevel::Critical => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Err => "err",
            LogLevel::Critical => "critical",
            LogLevel::Off => "off",
        };
        f.write_str(name)
    }
}

/// Initialises `env_logger` with microsecond timestamps and applies `level`.
///
/// Calling it again only updates the level.
pub fn init(level: LogLevel) {
    let initialised = env_logger::Builder::from_env(Env::default().default_filter_or("trace"))
        .format_timestamp_micros()
        .try_init()
        .is_ok();
    set_log_level(level);
    if initialised {
        log::info!("Logging initialised at level {}", level);
    }
}

/// Changes the maximum level of every subsequent log call.
pub fn set_log_level(level: LogLevel) {
    log::set_max_level(level.into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn critical_and_err_map_to_error() {
        assert_eq!(LevelFilter::from(LogLevel::Critical), LevelFilter::Error);
        assert_eq!(LevelFilter::from(LogLevel::Err), LevelFilter::Error);
        assert_eq!(LevelFilter::from(LogLevel::Off), LevelFilter::Off);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::Trace);
    }

    #[test]
    fn levels_parse_from_snake_case() {
        let level: LogLevel = serde_json::from_str("\"warn\"").expect("parse");
        assert_eq!(level, LogLevel::Warn);
        assert_eq!(level.to_string(), "warn");
    }
}
