// SPDX-License-Identifier: MIT OR Apache-2.0
//! Line-oriented logger writing host-format lines.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};

use crate::Severity;

type SharedSink = Arc<Mutex<Box<dyn Write + Send>>>;

fn shared(sink: impl Write + Send + 'static) -> SharedSink {
    Arc::new(Mutex::new(Box::new(sink)))
}

/// Writes `<LEVEL> <message>` lines, flushing after each one.
///
/// Clones share their sinks, so a logger can be handed to callbacks and
/// tracing layers freely. A logger with a file sink writes every line to
/// both: the plain form to stderr and a timestamped form to the file.
#[derive(Clone)]
pub struct Logger {
    level: Severity,
    stderr: SharedSink,
    file: Option<SharedSink>,
}

impl Logger {
    /// Logger writing to `sink` only.
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            level: Severity::default(),
            stderr: shared(sink),
            file: None,
        }
    }

    /// Logger writing to the process's stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Set the minimum severity.
    #[must_use]
    pub fn with_level(mut self, level: Severity) -> Self {
        self.level = level;
        self
    }

    /// Add a secondary file sink. Lines written there carry a timestamp.
    #[must_use]
    pub fn with_file(mut self, file: impl Write + Send + 'static) -> Self {
        self.file = Some(shared(file));
        self
    }

    /// Minimum severity.
    #[must_use]
    pub fn level(&self) -> Severity {
        self.level
    }

    /// Whether a line at `severity` would be written.
    #[must_use]
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.level
    }

    /// Whether this logger also writes to a file.
    #[must_use]
    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    /// Write one line, reporting sink failures.
    ///
    /// # Errors
    ///
    /// The first sink error encountered. The file sink is still attempted
    /// when stderr fails.
    pub fn try_log(&self, severity: Severity, message: impl fmt::Display) -> io::Result<()> {
        if !self.enabled(severity) {
            return Ok(());
        }
        let line = format!("{severity} {message}\n");
        let stderr = write_line(&self.stderr, line.as_bytes());
        let file = match &self.file {
            Some(file) => {
                let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
                write_line(file, format!("{stamp} {line}").as_bytes())
            }
            None => Ok(()),
        };
        stderr.and(file)
    }

    /// Write one line. Sink failures are dropped; use
    /// [`try_log`](Self::try_log) to observe them.
    pub fn log(&self, severity: Severity, message: impl fmt::Display) {
        let _ = self.try_log(severity, message);
    }

    /// Log at `DEBUG`.
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Severity::Debug, message);
    }

    /// Log at `INFO`.
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Severity::Info, message);
    }

    /// Log at `WARN`.
    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Severity::Warn, message);
    }

    /// Log at `ERROR`.
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Severity::Error, message);
    }

    /// Log at `FATAL`.
    pub fn fatal(&self, message: impl fmt::Display) {
        self.log(Severity::Fatal, message);
    }

    /// Flush both sinks.
    pub fn flush(&self) -> io::Result<()> {
        let stderr = lock(&self.stderr).flush();
        let file = match &self.file {
            Some(file) => lock(file).flush(),
            None => Ok(()),
        };
        stderr.and(file)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("file", &self.file.is_some())
            .finish_non_exhaustive()
    }
}

fn lock(sink: &SharedSink) -> std::sync::MutexGuard<'_, Box<dyn Write + Send>> {
    sink.lock().unwrap_or_else(PoisonError::into_inner)
}

fn write_line(sink: &SharedSink, line: &[u8]) -> io::Result<()> {
    let mut guard = lock(sink);
    guard.write_all(line)?;
    guard.flush()
}
