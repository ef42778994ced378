// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry wiring as a modular input sets it up at startup.

use modinput_log::{
    HOME_VAR, LEVEL_VAR, LogBuffer, LogConfig, LoggerLayer, LoggerRegistry, Severity,
};
use tracing_subscriber::prelude::*;

fn config(home: &std::path::Path, level: &str) -> LogConfig {
    let home = home.to_string_lossy().into_owned();
    let level = level.to_owned();
    LogConfig::from_lookup(move |key| match key {
        HOME_VAR => Some(home.clone()),
        LEVEL_VAR => Some(level.clone()),
        _ => None,
    })
    .unwrap()
}

#[test]
fn tracing_events_reach_the_input_log_file() {
    let home = tempfile::tempdir().unwrap();
    let stderr = LogBuffer::new();
    let registry = LoggerRegistry::with_stderr(config(home.path(), "debug"), stderr.clone());
    let logger = registry.file_logger("heartbeat").unwrap();
    assert_eq!(logger.level(), Severity::Debug);

    let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger));
    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!(stanza = "heartbeat://one", "polling");
        tracing::error!("poll failed");
    });
    registry.shutdown().unwrap();

    assert_eq!(
        stderr.lines(),
        vec!["DEBUG polling stanza=heartbeat://one", "ERROR poll failed"]
    );
    let file =
        std::fs::read_to_string(home.path().join("var/log/splunk/heartbeat.log")).unwrap();
    assert!(file.lines().any(|l| l.ends_with(" ERROR poll failed")));
}

#[test]
fn level_from_environment_filters_file_and_stderr() {
    let home = tempfile::tempdir().unwrap();
    let stderr = LogBuffer::new();
    let registry = LoggerRegistry::with_stderr(config(home.path(), "WARN"), stderr.clone());
    let logger = registry.file_logger("quiet").unwrap();
    logger.info("skip");
    logger.warn("keep");
    registry.shutdown().unwrap();

    assert_eq!(stderr.lines(), vec!["WARN keep"]);
    let file = std::fs::read_to_string(home.path().join("var/log/splunk/quiet.log")).unwrap();
    assert_eq!(file.lines().count(), 1);
}
