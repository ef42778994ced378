// SPDX-License-Identifier: MIT OR Apache-2.0
//! A single event, or event fragment, bound for the host's pipeline.

use chrono::{DateTime, TimeZone, Utc};

use crate::ContractViolation;

/// One unit of data sent to the host.
///
/// Every field is optional on the wire; the writer omits what is unset.
/// `time` and `unbroken` are mutually exclusive and the setters enforce it,
/// so an `Event` value is always encodable.
///
/// ```
/// use modinput_core::Event;
///
/// let fragment = Event::new()
///     .with_stanza("hb://one")
///     .with_data("first half ")
///     .unbroken()
///     .unwrap();
/// assert!(fragment.is_unbroken());
/// assert!(fragment.clone().with_time(chrono::Utc::now()).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    data: Option<String>,
    source: Option<String>,
    source_type: Option<String>,
    index: Option<String>,
    host: Option<String>,
    time: Option<DateTime<Utc>>,
    done: bool,
    unbroken: bool,
    stanza: Option<String>,
}

impl Event {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── builders ────────────────────────────────────────────────────

    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Owning stanza; required when several inputs share one stream.
    #[must_use]
    pub fn with_stanza(mut self, stanza: impl Into<String>) -> Self {
        self.stanza = Some(stanza.into());
        self
    }

    /// Mark the end of an unbroken sequence (or of a lone event).
    #[must_use]
    pub fn done(mut self) -> Self {
        self.done = true;
        self
    }

    /// Attach a timestamp, normalised to UTC.
    ///
    /// # Errors
    ///
    /// Fails if the event is already marked unbroken.
    pub fn with_time<Tz: TimeZone>(
        mut self,
        time: DateTime<Tz>,
    ) -> Result<Self, ContractViolation> {
        self.set_time(Some(time))?;
        Ok(self)
    }

    /// Mark the event as a fragment of a larger event.
    ///
    /// # Errors
    ///
    /// Fails if the event already carries a timestamp.
    pub fn unbroken(mut self) -> Result<Self, ContractViolation> {
        self.set_unbroken(true)?;
        Ok(self)
    }

    // ── setters ─────────────────────────────────────────────────────

    pub fn set_data(&mut self, data: Option<String>) {
        self.data = data;
    }

    pub fn set_done(&mut self, done: bool) {
        self.done = done;
    }

    pub fn set_stanza(&mut self, stanza: Option<String>) {
        self.stanza = stanza;
    }

    /// Replace the timestamp. Clearing it is always allowed.
    pub fn set_time<Tz: TimeZone>(
        &mut self,
        time: Option<DateTime<Tz>>,
    ) -> Result<(), ContractViolation> {
        if time.is_some() && self.unbroken {
            return Err(ContractViolation::TimeOnUnbrokenEvent);
        }
        self.time = time.map(|t| t.with_timezone(&Utc));
        Ok(())
    }

    /// Toggle the unbroken flag. Clearing it is always allowed.
    pub fn set_unbroken(&mut self, unbroken: bool) -> Result<(), ContractViolation> {
        if unbroken && self.time.is_some() {
            return Err(ContractViolation::UnbrokenEventWithTime);
        }
        self.unbroken = unbroken;
        Ok(())
    }

    // ── accessors ───────────────────────────────────────────────────

    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn source_type(&self) -> Option<&str> {
        self.source_type.as_deref()
    }

    #[must_use]
    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    #[must_use]
    pub fn stanza(&self) -> Option<&str> {
        self.stanza.as_deref()
    }

    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    #[must_use]
    pub fn is_unbroken(&self) -> bool {
        self.unbroken
    }
}
