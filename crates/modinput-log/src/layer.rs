// SPDX-License-Identifier: MIT OR Apache-2.0
//! `tracing` bridge.

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::{Logger, Severity};

/// Renders `tracing` events as host log lines through a [`Logger`].
///
/// The event's `message` becomes the line text and any other fields are
/// appended as `key=value`. `TRACE` maps to `DEBUG`; the logger's own
/// minimum level still applies.
///
/// ```
/// use modinput_log::{LogBuffer, Logger, LoggerLayer};
/// use tracing_subscriber::prelude::*;
///
/// let buf = LogBuffer::new();
/// let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(Logger::new(buf.clone())));
/// tracing::subscriber::with_default(subscriber, || {
///     tracing::warn!(stanza = "hb://one", "slow poll");
/// });
/// assert_eq!(buf.lines(), vec!["WARN slow poll stanza=hb://one"]);
/// ```
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Logger,
}

impl LoggerLayer {
    /// Layer forwarding to `logger`.
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl<S: Subscriber> Layer<S> for LoggerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let severity = Severity::from(*event.metadata().level());
        if !self.logger.enabled(severity) {
            return;
        }
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        self.logger.log(severity, visitor.finish());
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{name}={value}");
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field.name(), format_args!("{value:?}"));
        }
    }
}
