// SPDX-License-Identifier: MIT OR Apache-2.0
//! `heartbeat` modular input executable.

use std::process::ExitCode;

use modinput_heartbeat::Heartbeat;
use modinput_log::{LogConfig, LoggerLayer, LoggerRegistry};
use modinput_protocol::FlushPolicy;
use modinput_script::{ScriptRunner, exit_code};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Logger name, and so the log file name under the host's log directory.
const LOG_NAME: &str = "heartbeat";

fn main() -> ExitCode {
    let (config, config_error) = match LogConfig::from_env() {
        Ok(config) => (config, None),
        Err(e) => (LogConfig::default(), Some(e)),
    };
    let registry = LoggerRegistry::new(config);
    let logger = if registry.config().home.is_some() {
        match registry.file_logger(LOG_NAME) {
            Ok(logger) => logger,
            // already reported at FATAL on stderr
            Err(_) => return ExitCode::FAILURE,
        }
    } else {
        registry.stderr_logger()
    };
    if let Some(e) = config_error {
        logger.warn(format_args!("ignoring log configuration: {e}"));
    }

    let filter = EnvFilter::try_from_env("MODINPUT_TRACE")
        .unwrap_or_else(|_| EnvFilter::new("modinput_heartbeat=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(LoggerLayer::new(logger.clone()))
        .init();

    let runner = ScriptRunner::new(logger).with_flush_policy(FlushPolicy::EveryEvent);
    let code = runner.run(&mut Heartbeat::new());
    if let Err(e) = registry.shutdown() {
        debug!(error = %e, "failed to flush log files");
    }
    exit_code(code)
}
