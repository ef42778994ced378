// SPDX-License-Identifier: MIT OR Apache-2.0
//! Environment-driven logger configuration.

use std::path::PathBuf;

use crate::{LogError, Severity};

/// Home directory of the host installation.
pub const HOME_VAR: &str = "SPLUNK_HOME";

/// Minimum severity override.
pub const LEVEL_VAR: &str = "MODINPUT_LOG_LEVEL";

/// Settings shared by every logger a registry hands out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Lines below this severity are dropped.
    pub level: Severity,
    /// Host home directory; file-backed loggers live beneath it.
    pub home: Option<PathBuf>,
}

impl LogConfig {
    /// Defaults with process environment overrides applied.
    ///
    /// # Errors
    ///
    /// Fails if the level variable holds an unknown level name.
    pub fn from_env() -> Result<Self, LogError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Defaults with overrides read through `lookup` instead of the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LogError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Recognised variables:
    /// - `SPLUNK_HOME`: overrides `home`
    /// - `MODINPUT_LOG_LEVEL`: overrides `level`
    pub fn apply_env_overrides(&mut self) -> Result<(), LogError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are
    /// treated as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), LogError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(home) = lookup(HOME_VAR).filter(|v| !v.is_empty()) {
            self.home = Some(PathBuf::from(home));
        }
        if let Some(level) = lookup(LEVEL_VAR).filter(|v| !v.trim().is_empty()) {
            self.level = level.parse()?;
        }
        Ok(())
    }

    /// Directory holding per-input log files.
    ///
    /// # Errors
    ///
    /// [`LogError::MissingHome`] when no home directory is configured.
    pub fn log_dir(&self) -> Result<PathBuf, LogError> {
        let home = self
            .home
            .as_ref()
            .ok_or(LogError::MissingHome { var: HOME_VAR })?;
        Ok(home.join("var").join("log").join("splunk"))
    }

    /// Path of the log file for the logger called `name`.
    pub fn log_file(&self, name: &str) -> Result<PathBuf, LogError> {
        Ok(self.log_dir()?.join(format!("{name}.log")))
    }
}
