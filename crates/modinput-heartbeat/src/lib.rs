// SPDX-License-Identifier: MIT OR Apache-2.0
//! modinput-heartbeat
//!
//! A modular input that emits a small JSON heartbeat per stanza on a fixed
//! interval. Useful for checking that the host is running inputs at all,
//! and as a worked example of the [`Script`] trait.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use modinput_core::{
    Argument, ContractViolation, DataType, Event, InputConfiguration, Scheme, Stanza,
    ValidationItems,
};
use modinput_script::{EventWriter, Script, ScriptError};
use serde::Serialize;
use tracing::{debug, error, info};

/// Source type stamped on every heartbeat.
pub const SOURCE_TYPE: &str = "heartbeat";

/// Interval used when a stanza does not set one.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Message used when a stanza does not set one.
pub const DEFAULT_MESSAGE: &str = "alive";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Per-stanza settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Time between beats.
    pub interval: Duration,
    /// Text carried in each beat.
    pub message: String,
    /// Beats to send before stopping; `None` runs until the host stops us.
    pub count: Option<u64>,
}

impl Settings {
    /// Read settings from a stanza's parameters.
    ///
    /// # Errors
    ///
    /// [`ScriptError::Invalid`] when `interval` or `count` is not a positive
    /// integer.
    pub fn from_stanza(stanza: &Stanza) -> Result<Self, ScriptError> {
        let interval = positive(stanza, "interval")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_INTERVAL);
        let message = stanza
            .single("message")
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MESSAGE)
            .to_owned();
        let count = positive(stanza, "count")?;
        Ok(Self {
            interval,
            message,
            count,
        })
    }
}

fn positive(stanza: &Stanza, name: &str) -> Result<Option<u64>, ScriptError> {
    let value = stanza.parse::<u64>(name).map_err(|e| {
        ScriptError::invalid(format!(
            "{}: {name} must be a positive integer ({e})",
            stanza.name()
        ))
    })?;
    match value {
        Some(0) => Err(ScriptError::invalid(format!(
            "{}: {name} must be greater than zero",
            stanza.name()
        ))),
        other => Ok(other),
    }
}

// ---------------------------------------------------------------------------
// Beat payload
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct Beat<'a> {
    stanza: &'a str,
    message: &'a str,
    seq: u64,
    #[serde(skip_serializing_if = "str::is_empty")]
    server_host: &'a str,
}

// ---------------------------------------------------------------------------
// Heartbeat script
// ---------------------------------------------------------------------------

struct Schedule<'a> {
    stanza: &'a Stanza,
    settings: Settings,
    sent: u64,
    due: Duration,
}

impl Schedule<'_> {
    fn finished(&self) -> bool {
        self.settings.count.is_some_and(|count| self.sent >= count)
    }
}

/// The heartbeat input.
///
/// Time and sleeping are injectable so tests run instantly.
pub struct Heartbeat {
    clock: fn() -> DateTime<Utc>,
    sleep: fn(Duration),
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            clock: Utc::now,
            sleep: std::thread::sleep,
        }
    }
}

impl std::fmt::Debug for Heartbeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heartbeat").finish_non_exhaustive()
    }
}

impl Heartbeat {
    /// Heartbeat using the system clock and real sleeps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the clock used for event timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the function used to wait between beats.
    #[must_use]
    pub fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    fn beat(
        &self,
        writer: &mut EventWriter<'_>,
        entry: &Schedule<'_>,
        server_host: &str,
    ) -> Result<(), ScriptError> {
        let beat = Beat {
            stanza: entry.stanza.name(),
            message: &entry.settings.message,
            seq: entry.sent,
            server_host,
        };
        let data = serde_json::to_string(&beat).context("encoding heartbeat")?;
        let mut event = Event::new()
            .with_stanza(entry.stanza.name())
            .with_source_type(SOURCE_TYPE)
            .with_data(data)
            .with_time((self.clock)())?
            .done();
        if let Some(index) = entry.stanza.single("index") {
            event = event.with_index(index);
        }
        writer.write(&event)?;
        Ok(())
    }
}

/// The scheme reported for `--scheme`.
///
/// # Errors
///
/// Fails only if two arguments share a name.
pub fn heartbeat_scheme() -> Result<Scheme, ContractViolation> {
    Scheme::new("Heartbeat")
        .description("Emits a JSON heartbeat event per stanza on a fixed interval")
        .argument(
            Argument::new("interval")
                .title("Interval")
                .description("Seconds between heartbeats")
                .validation("is_pos_int('interval')")
                .data_type(DataType::Number)
                .required_on_create(false),
        )?
        .argument(
            Argument::new("message")
                .title("Message")
                .description("Text carried in each heartbeat")
                .required_on_create(false),
        )?
        .argument(
            Argument::new("count")
                .title("Count")
                .description("Stop after this many heartbeats")
                .data_type(DataType::Number)
                .required_on_create(false),
        )
}

impl Script for Heartbeat {
    fn scheme(&self) -> Option<Scheme> {
        heartbeat_scheme()
            .inspect_err(|e| error!(error = %e, "cannot build heartbeat scheme"))
            .ok()
    }

    fn stream_events(
        &mut self,
        config: InputConfiguration,
        writer: &mut EventWriter<'_>,
    ) -> Result<(), ScriptError> {
        let mut schedule = config
            .stanzas()
            .iter()
            .map(|stanza| {
                Ok(Schedule {
                    stanza,
                    settings: Settings::from_stanza(stanza)?,
                    sent: 0,
                    due: Duration::ZERO,
                })
            })
            .collect::<Result<Vec<_>, ScriptError>>()?;
        info!(stanzas = schedule.len(), "starting heartbeats");

        let mut elapsed = Duration::ZERO;
        loop {
            for entry in schedule.iter_mut().filter(|e| !e.finished()) {
                if entry.due <= elapsed {
                    self.beat(writer, entry, &config.server.server_host)?;
                    entry.sent += 1;
                    entry.due += entry.settings.interval;
                }
            }
            let Some(next) = schedule
                .iter()
                .filter(|e| !e.finished())
                .map(|e| e.due)
                .min()
            else {
                break;
            };
            let wait = next.saturating_sub(elapsed);
            debug!(
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "sleeping until next heartbeat"
            );
            (self.sleep)(wait);
            elapsed = next;
        }
        info!(events = writer.events_written(), "all heartbeats sent");
        Ok(())
    }

    fn validate(&mut self, items: ValidationItems) -> Result<(), ScriptError> {
        let settings = Settings::from_stanza(&items.item)?;
        debug!(stanza = items.item.name(), ?settings, "validated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use modinput_core::{Parameter, ServerContext};
    use modinput_protocol::EventStreamWriter;

    fn stanza(name: &str, params: &[(&str, &str)]) -> Stanza {
        Stanza::new(
            name,
            params
                .iter()
                .map(|(k, v)| ((*k).to_owned(), Parameter::Single((*v).to_owned()))),
        )
        .unwrap()
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap()
    }

    fn no_sleep(_: Duration) {}

    fn stream(stanzas: Vec<Stanza>) -> Result<String, ScriptError> {
        let config = InputConfiguration::new(ServerContext::default(), stanzas).unwrap();
        let mut out = Vec::new();
        {
            let sink: &mut dyn std::io::Write = &mut out;
            let mut writer = EventStreamWriter::new(sink)?;
            Heartbeat::new()
                .with_clock(fixed_clock)
                .with_sleep(no_sleep)
                .stream_events(config, &mut writer)?;
            writer.close()?;
        }
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn settings_defaults() {
        let s = Settings::from_stanza(&stanza("hb://a", &[])).unwrap();
        assert_eq!(s.interval, DEFAULT_INTERVAL);
        assert_eq!(s.message, DEFAULT_MESSAGE);
        assert_eq!(s.count, None);
    }

    #[test]
    fn settings_reject_zero_and_garbage() {
        for bad in ["0", "-1", "soon"] {
            let err = Settings::from_stanza(&stanza("hb://a", &[("interval", bad)])).unwrap_err();
            assert!(matches!(err, ScriptError::Invalid(_)), "{bad}");
            assert!(err.to_string().starts_with("hb://a: interval"));
        }
    }

    #[test]
    fn each_stanza_sends_its_count() {
        let out = stream(vec![
            stanza("hb://a", &[("count", "2"), ("interval", "10")]),
            stanza("hb://b", &[("count", "1"), ("interval", "5"), ("message", "hi")]),
        ])
        .unwrap();
        assert_eq!(out.matches("stanza=\"hb://a\"").count(), 2);
        assert_eq!(out.matches("stanza=\"hb://b\"").count(), 1);
        assert!(out.contains(
            "<data>{\"stanza\":\"hb://b\",\"message\":\"hi\",\"seq\":0}</data>"
        ));
        assert!(out.contains("<sourcetype>heartbeat</sourcetype>"));
        assert!(out.contains("<time>1356998400</time><done/>"));
    }

    #[test]
    fn shorter_interval_beats_more_often() {
        let out = stream(vec![
            stanza("hb://slow", &[("count", "2"), ("interval", "10")]),
            stanza("hb://fast", &[("count", "3"), ("interval", "2")]),
        ])
        .unwrap();
        let order: Vec<&str> = out
            .split("<event stanza=\"")
            .skip(1)
            .map(|chunk| chunk.split('"').next().unwrap())
            .collect();
        // t=0 both, t=2 fast, t=4 fast, t=10 slow
        assert_eq!(
            order,
            vec!["hb://slow", "hb://fast", "hb://fast", "hb://fast", "hb://slow"]
        );
    }

    #[test]
    fn index_parameter_is_forwarded() {
        let out = stream(vec![stanza("hb://a", &[("count", "1"), ("index", "main")])]).unwrap();
        assert!(out.contains("<index>main</index>"));
    }

    #[test]
    fn bad_stanza_fails_before_any_event() {
        let err = stream(vec![
            stanza("hb://ok", &[("count", "1")]),
            stanza("hb://bad", &[("count", "zero")]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("hb://bad: count"));
    }

    #[test]
    fn scheme_builder_accepts_every_argument() {
        let scheme = heartbeat_scheme().unwrap();
        assert_eq!(Heartbeat::new().scheme(), Some(scheme));
    }

    #[test]
    fn scheme_declares_three_arguments() {
        let scheme = Heartbeat::new().scheme().unwrap();
        let names: Vec<&str> = scheme.arguments().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["interval", "message", "count"]);
        assert!(scheme.use_external_validation);
    }
}
