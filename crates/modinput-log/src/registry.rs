// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process-owned registry of named loggers.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::{LogConfig, LogError, Logger};

/// Hands out the stderr logger and caches file-backed loggers by name.
///
/// Create one at startup and keep it for the life of the process. Asking
/// for the same name twice returns a logger sharing the first one's file
/// handle. [`shutdown`](Self::shutdown) flushes and releases everything.
pub struct LoggerRegistry {
    config: LogConfig,
    stderr: Logger,
    files: Mutex<BTreeMap<String, Logger>>,
}

impl LoggerRegistry {
    /// Registry whose loggers write to the process's stderr.
    #[must_use]
    pub fn new(config: LogConfig) -> Self {
        Self::with_stderr(config, io::stderr())
    }

    /// Registry whose loggers write their plain lines to `sink`.
    pub fn with_stderr(config: LogConfig, sink: impl Write + Send + 'static) -> Self {
        let stderr = Logger::new(sink).with_level(config.level);
        Self {
            config,
            stderr,
            files: Mutex::new(BTreeMap::new()),
        }
    }

    /// Configuration the registry was built with.
    #[must_use]
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Logger writing to stderr only.
    #[must_use]
    pub fn stderr_logger(&self) -> Logger {
        self.stderr.clone()
    }

    /// Logger writing to stderr and to `<log dir>/<name>.log`.
    ///
    /// # Errors
    ///
    /// When the home directory is unknown or the file cannot be opened. The
    /// failure is also written to stderr at `FATAL` before it is returned,
    /// since the file it would have gone to does not exist.
    pub fn file_logger(&self, name: &str) -> Result<Logger, LogError> {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(logger) = files.get(name) {
            return Ok(logger.clone());
        }
        let logger = self.open(name).inspect_err(|e| self.stderr.fatal(e))?;
        files.insert(name.to_owned(), logger.clone());
        Ok(logger)
    }

    fn open(&self, name: &str) -> Result<Logger, LogError> {
        let dir = self.config.log_dir()?;
        fs::create_dir_all(&dir).map_err(|source| LogError::Open {
            path: dir.clone(),
            source,
        })?;
        let path = self.config.log_file(name)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LogError::Open {
                path: path.clone(),
                source,
            })?;
        debug!(name, path = %path.display(), "opened log file");
        Ok(self.stderr.clone().with_file(file))
    }

    /// Number of cached file loggers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no file logger has been opened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush every logger and drop the cached file handles.
    ///
    /// Clones already handed out keep their handles until they are dropped.
    ///
    /// # Errors
    ///
    /// The first flush failure; remaining loggers are still flushed.
    pub fn shutdown(self) -> io::Result<()> {
        let files = self
            .files
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let mut result = self.stderr.flush();
        for (name, logger) in files {
            let flushed = logger.flush();
            if let Err(e) = &flushed {
                debug!(name, error = %e, "failed to flush log file");
            }
            result = result.and(flushed);
        }
        result
    }
}

impl std::fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("config", &self.config)
            .field("files", &self.len())
            .finish_non_exhaustive()
    }
}
