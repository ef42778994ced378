// SPDX-License-Identifier: MIT OR Apache-2.0
//! modinput-log
//!
//! Log lines in the format the host platform expects from a modular input:
//! `<LEVEL> <message>` on stderr, flushed per line. File-backed loggers
//! additionally append timestamped lines to
//! `$SPLUNK_HOME/var/log/splunk/<name>.log`.
//!
//! Loggers are handed out by an explicit [`LoggerRegistry`] owned by the
//! process, and [`LoggerLayer`] lets code log through `tracing` macros.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod config;
pub mod layer;
pub mod logger;
pub mod registry;

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

pub use buffer::LogBuffer;
pub use config::{HOME_VAR, LEVEL_VAR, LogConfig};
pub use layer::LoggerLayer;
pub use logger::Logger;
pub use registry::LoggerRegistry;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Log level, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Diagnostic detail.
    Debug,
    /// Normal progress.
    #[default]
    Info,
    /// Something unexpected that the input recovered from.
    Warn,
    /// An operation failed.
    Error,
    /// The process is about to exit unsuccessfully.
    Fatal,
}

impl Severity {
    /// All severities, least severe first.
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Level token as written at the start of each line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LogError;

    /// Case-insensitive; also accepts `warning` and `critical`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" | "critical" => Ok(Severity::Fatal),
            _ => Err(LogError::InvalidLevel(s.to_owned())),
        }
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::INFO => Severity::Info,
            _ => Severity::Debug,
        }
    }
}

// ---------------------------------------------------------------------------
// LogError
// ---------------------------------------------------------------------------

/// Errors from configuring or opening loggers.
#[derive(Debug, Error)]
pub enum LogError {
    /// The home directory variable is unset, so no log directory exists.
    #[error("environment variable {var} is not set; cannot locate the log directory")]
    MissingHome {
        /// Name of the variable that was consulted.
        var: &'static str,
    },

    /// The log directory or file could not be created or opened.
    #[error("cannot open log file {}: {source}", path.display())]
    Open {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A level name did not match any [`Severity`].
    #[error("unknown log level {0:?}")]
    InvalidLevel(String),
}
