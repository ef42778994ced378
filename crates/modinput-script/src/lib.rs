// SPDX-License-Identifier: MIT OR Apache-2.0
//! modinput-script
//!
//! Entry point for modular-input executables. Implement [`Script`], then
//! hand it to [`run`] from `main`:
//!
//! | Arguments | Behavior |
//! |---|---|
//! | (none) | read `<input>` from stdin, call [`Script::stream_events`] |
//! | `--scheme` | write the [`Script::scheme`] document to stdout |
//! | `--validate-arguments` | read `<items>` from stdin, call [`Script::validate`] |
//! | anything else | do nothing |
//!
//! Any error ends the process with a `FATAL` log line and exit code 1;
//! otherwise the exit code is 0.
//!
//! ```
//! use modinput_core::{InputConfiguration, Event};
//! use modinput_log::{LogBuffer, Logger};
//! use modinput_script::{EventWriter, Script, ScriptError, ScriptRunner};
//!
//! struct Hello;
//!
//! impl Script for Hello {
//!     fn stream_events(
//!         &mut self,
//!         config: InputConfiguration,
//!         writer: &mut EventWriter<'_>,
//!     ) -> Result<(), ScriptError> {
//!         for stanza in config.stanzas() {
//!             writer.write(&Event::new().with_stanza(stanza.name()).with_data("hi").done())?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let input = r#"<input><configuration><stanza name="hello://a"><param name="x">1</param></stanza></configuration></input>"#;
//! let mut out = Vec::new();
//! let runner = ScriptRunner::new(Logger::new(LogBuffer::new()));
//! let code = runner.run_with_io(&mut Hello, Vec::<String>::new(), input.as_bytes(), &mut out);
//! assert_eq!(code, 0);
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     r#"<stream><event stanza="hello://a"><data>hi</data><done/></event></stream>"#
//! );
//! ```
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod mode;
pub mod runner;

use std::io::{self, Write};
use std::process::ExitCode;

use modinput_core::{ContractViolation, InputConfiguration, Scheme, ValidationItems};
use modinput_log::{LogConfig, LogError, LoggerRegistry};
use modinput_protocol::{EventStreamWriter, ProtocolError};
use thiserror::Error;
use tracing::debug;

pub use mode::Mode;
pub use runner::ScriptRunner;

/// Event writer handed to [`Script::stream_events`].
pub type EventWriter<'a> = EventStreamWriter<&'a mut dyn Write>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure of a script invocation. Every variant ends the process with exit
/// code 1.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Reading the input document or writing output failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A model invariant was violated.
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    /// A logger could not be set up.
    #[error(transparent)]
    Log(#[from] LogError),

    /// I/O performed by the script itself failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The scheme asks for external validation but the script does not
    /// implement [`Script::validate`].
    #[error("external validation is declared but not implemented by this input")]
    ValidationNotImplemented,

    /// The script rejected its configuration.
    #[error("{0}")]
    Invalid(String),

    /// Any other error, with its context chain.
    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl ScriptError {
    /// Shorthand for [`ScriptError::Invalid`].
    pub fn invalid(message: impl Into<String>) -> Self {
        ScriptError::Invalid(message.into())
    }
}

// ---------------------------------------------------------------------------
// Script trait
// ---------------------------------------------------------------------------

/// Implemented by each modular input.
pub trait Script {
    /// Introspection document printed for `--scheme`. `None` prints nothing.
    fn scheme(&self) -> Option<Scheme> {
        None
    }

    /// Stream events for every configured stanza.
    ///
    /// May run indefinitely; the host stops the process when it is done
    /// with it. The `</stream>` close tag is written by the runner.
    fn stream_events(
        &mut self,
        config: InputConfiguration,
        writer: &mut EventWriter<'_>,
    ) -> Result<(), ScriptError>;

    /// Check a proposed stanza configuration.
    ///
    /// The default fails, so a scheme that declares external validation
    /// must override this.
    fn validate(&mut self, items: ValidationItems) -> Result<(), ScriptError> {
        let _ = items;
        Err(ScriptError::ValidationNotImplemented)
    }
}

/// Run `script` against the real process arguments and stdio.
///
/// Logging is configured from the environment; see [`LogConfig`].
pub fn run<S: Script>(mut script: S) -> ExitCode {
    let (config, config_error) = match LogConfig::from_env() {
        Ok(config) => (config, None),
        Err(e) => (LogConfig::default(), Some(e)),
    };
    let registry = LoggerRegistry::new(config);
    let logger = registry.stderr_logger();
    if let Some(e) = config_error {
        logger.warn(format_args!("ignoring log configuration: {e}"));
    }
    let code = ScriptRunner::new(logger).run(&mut script);
    if let Err(e) = registry.shutdown() {
        debug!(error = %e, "failed to flush log files");
    }
    exit_code(code)
}

/// Convert a runner exit status into an [`ExitCode`].
#[must_use]
pub fn exit_code(code: i32) -> ExitCode {
    if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
