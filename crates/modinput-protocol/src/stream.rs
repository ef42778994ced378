// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `<stream>` document a script writes to stdout while streaming.

use std::io::Write;

use modinput_core::Event;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event as XmlEvent};
use tracing::{debug, trace};

use crate::xml::{check_text, text_element};
use crate::{ProtocolError, format_unix_time};

const STREAM: &str = "stream";
const EVENT: &str = "event";

/// When the writer flushes its sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Flush after each event carrying `done`.
    #[default]
    OnDone,
    /// Flush after every event. Use with buffered sinks (such as stdout)
    /// when events arrive slowly and the host should see them immediately.
    EveryEvent,
}

/// Encodes [`Event`]s into one `<stream>` document.
///
/// `<stream>` is written on construction and `</stream>` exactly once, by
/// [`close`](Self::close) or, if that is never reached, on drop. The writer
/// keeps no per-stanza state: fragments of several stanzas may be
/// interleaved and the host reassembles them by the `stanza` attribute.
///
/// ```
/// use modinput_core::Event;
/// use modinput_protocol::EventStreamWriter;
///
/// let mut writer = EventStreamWriter::new(Vec::new()).unwrap();
/// writer.write(&Event::new().with_data("hello").done()).unwrap();
/// let out = String::from_utf8(writer.close().unwrap()).unwrap();
/// assert_eq!(out, "<stream><event><data>hello</data><done/></event></stream>");
/// ```
pub struct EventStreamWriter<W: Write> {
    writer: Option<Writer<W>>,
    policy: FlushPolicy,
    written: u64,
}

impl<W: Write> EventStreamWriter<W> {
    /// Open the stream by writing `<stream>` to `sink`.
    ///
    /// # Errors
    ///
    /// Fails if the sink rejects the write.
    pub fn new(sink: W) -> Result<Self, ProtocolError> {
        let mut writer = Writer::new(sink);
        writer.write_event(XmlEvent::Start(BytesStart::new(STREAM)))?;
        Ok(Self {
            writer: Some(writer),
            policy: FlushPolicy::default(),
            written: 0,
        })
    }

    /// Replace the flush policy.
    #[must_use]
    pub fn with_flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Current flush policy.
    #[must_use]
    pub fn flush_policy(&self) -> FlushPolicy {
        self.policy
    }

    /// Number of events written so far.
    #[must_use]
    pub fn events_written(&self) -> u64 {
        self.written
    }

    /// Append one `<event>` element.
    ///
    /// Child elements appear in the order `index, sourcetype, source, host,
    /// data, time, done`; unset fields are omitted.
    ///
    /// # Errors
    ///
    /// Sink failures (for example a closed pipe) are returned as-is; nothing
    /// is retried. A field holding a character XML 1.0 forbids yields
    /// [`ProtocolError::InvalidCharacter`] before any byte of the event is
    /// written, so the stream stays well formed.
    pub fn write(&mut self, event: &Event) -> Result<(), ProtocolError> {
        let policy = self.policy;
        let writer = self.writer.as_mut().ok_or(ProtocolError::StreamClosed)?;
        check_event(event)?;
        encode_event(writer, event)?;
        if event.is_done() || policy == FlushPolicy::EveryEvent {
            writer.get_mut().flush()?;
        }
        self.written += 1;
        trace!(
            stanza = event.stanza().unwrap_or_default(),
            done = event.is_done(),
            unbroken = event.is_unbroken(),
            "event written"
        );
        Ok(())
    }

    /// Flush the sink without closing the stream.
    pub fn flush(&mut self) -> Result<(), ProtocolError> {
        let writer = self.writer.as_mut().ok_or(ProtocolError::StreamClosed)?;
        writer.get_mut().flush()?;
        Ok(())
    }

    /// Write `</stream>`, flush, and return the sink.
    pub fn close(mut self) -> Result<W, ProtocolError> {
        let writer = self.writer.take().ok_or(ProtocolError::StreamClosed)?;
        finish(writer)
    }
}

impl<W: Write> std::fmt::Debug for EventStreamWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStreamWriter")
            .field("open", &self.writer.is_some())
            .field("policy", &self.policy)
            .field("written", &self.written)
            .finish()
    }
}

impl<W: Write> Drop for EventStreamWriter<W> {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = finish(writer) {
                debug!(error = %e, "failed to close event stream");
            }
        }
    }
}

fn finish<W: Write>(mut writer: Writer<W>) -> Result<W, ProtocolError> {
    writer.write_event(XmlEvent::End(BytesEnd::new(STREAM)))?;
    let mut sink = writer.into_inner();
    sink.flush()?;
    Ok(sink)
}

fn event_fields(event: &Event) -> [(&'static str, Option<&str>); 5] {
    [
        ("index", event.index()),
        ("sourcetype", event.source_type()),
        ("source", event.source()),
        ("host", event.host()),
        ("data", event.data()),
    ]
}

fn check_event(event: &Event) -> Result<(), ProtocolError> {
    if let Some(stanza) = event.stanza() {
        check_text("stanza", stanza)?;
    }
    for (name, value) in event_fields(event) {
        if let Some(value) = value {
            check_text(name, value)?;
        }
    }
    Ok(())
}

fn encode_event<W: Write>(writer: &mut Writer<W>, event: &Event) -> Result<(), ProtocolError> {
    let mut start = BytesStart::new(EVENT);
    if let Some(stanza) = event.stanza().filter(|s| !s.is_empty()) {
        start.push_attribute(("stanza", stanza));
    }
    if event.is_unbroken() {
        start.push_attribute(("unbroken", "1"));
    }
    writer.write_event(XmlEvent::Start(start))?;

    for (name, value) in event_fields(event) {
        if let Some(value) = value {
            text_element(writer, name, value)?;
        }
    }
    if let Some(time) = event.time() {
        text_element(writer, "time", &format_unix_time(time))?;
    }
    if event.is_done() {
        writer.write_event(XmlEvent::Empty(BytesStart::new("done")))?;
    }

    writer.write_event(XmlEvent::End(BytesEnd::new(EVENT)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io;

    fn encode(events: &[Event]) -> String {
        let mut writer = EventStreamWriter::new(Vec::new()).unwrap();
        for e in events {
            writer.write(e).unwrap();
        }
        String::from_utf8(writer.close().unwrap()).unwrap()
    }

    #[test]
    fn empty_stream() {
        assert_eq!(encode(&[]), "<stream></stream>");
    }

    #[test]
    fn empty_event_has_no_children_or_attributes() {
        assert_eq!(encode(&[Event::new()]), "<stream><event></event></stream>");
    }

    #[test]
    fn empty_stanza_attribute_is_omitted() {
        let e = Event::new().with_stanza("");
        assert_eq!(encode(&[e]), "<stream><event></event></stream>");
    }

    #[test]
    fn attributes_and_escaping() {
        let e = Event::new()
            .with_stanza("hb://a&b")
            .with_data("x < y")
            .unbroken()
            .unwrap();
        assert_eq!(
            encode(&[e]),
            "<stream><event stanza=\"hb://a&amp;b\" unbroken=\"1\">\
             <data>x &lt; y</data></event></stream>"
        );
    }

    #[test]
    fn quotes_in_data_are_not_escaped() {
        let e = Event::new().with_data(r#"{"msg":"it's"}"#);
        assert_eq!(
            encode(&[e]),
            r#"<stream><event><data>{"msg":"it's"}</data></event></stream>"#
        );
    }

    #[test]
    fn counts_events() {
        let mut writer = EventStreamWriter::new(io::sink()).unwrap();
        writer.write(&Event::new()).unwrap();
        writer.write(&Event::new().done()).unwrap();
        assert_eq!(writer.events_written(), 2);
    }

    #[test]
    fn drop_closes_the_stream() {
        let mut buf = Vec::new();
        {
            let mut writer = EventStreamWriter::new(&mut buf).unwrap();
            writer.write(&Event::new().with_data("a")).unwrap();
        }
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "<stream><event><data>a</data></event></stream>"
        );
    }

    #[test]
    fn time_is_unix_seconds() {
        let t = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
        let e = Event::new().with_time(t).unwrap();
        assert_eq!(
            encode(&[e]),
            "<stream><event><time>1356998400</time></event></stream>"
        );
    }

    /// Sink that records flushes and can be told to fail.
    #[derive(Default)]
    struct RecordingSink {
        bytes: Vec<u8>,
        flushes: usize,
        fail: bool,
    }

    impl Write for RecordingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn flushes_only_on_done_by_default() {
        let mut sink = RecordingSink::default();
        {
            let mut writer = EventStreamWriter::new(&mut sink).unwrap();
            writer.write(&Event::new().with_data("a")).unwrap();
            assert_eq!(writer.writer.as_mut().unwrap().get_mut().flushes, 0);
            writer.write(&Event::new().with_data("b").done()).unwrap();
            assert_eq!(writer.writer.as_mut().unwrap().get_mut().flushes, 1);
        }
        // close flushes once more
        assert_eq!(sink.flushes, 2);
    }

    #[test]
    fn every_event_policy_flushes_each_write() {
        let mut sink = RecordingSink::default();
        let mut writer = EventStreamWriter::new(&mut sink)
            .unwrap()
            .with_flush_policy(FlushPolicy::EveryEvent);
        writer.write(&Event::new()).unwrap();
        writer.write(&Event::new()).unwrap();
        writer.close().unwrap();
        assert_eq!(sink.flushes, 3);
    }

    #[test]
    fn broken_pipe_is_returned() {
        let mut sink = RecordingSink::default();
        let mut writer = EventStreamWriter::new(&mut sink).unwrap();
        writer.writer.as_mut().unwrap().get_mut().fail = true;
        let err = writer.write(&Event::new().with_data("x")).unwrap_err();
        assert!(matches!(err, ProtocolError::Io(_) | ProtocolError::Xml(_)));
        assert_eq!(writer.events_written(), 0);
    }

    #[test]
    fn forbidden_character_fails_without_writing() {
        let mut buf = Vec::new();
        {
            let mut writer = EventStreamWriter::new(&mut buf).unwrap();
            writer.write(&Event::new().with_data("ok").done()).unwrap();
            let err = writer
                .write(&Event::new().with_host("h").with_data("a\u{1}b").done())
                .unwrap_err();
            match err {
                ProtocolError::InvalidCharacter { field, character } => {
                    assert_eq!(field, "data");
                    assert_eq!(character, '\u{1}');
                }
                other => panic!("unexpected {other:?}"),
            }
            assert_eq!(writer.events_written(), 1);
        }
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "<stream><event><data>ok</data><done/></event></stream>"
        );
    }

    #[test]
    fn forbidden_character_in_stanza_is_rejected() {
        let mut writer = EventStreamWriter::new(Vec::new()).unwrap();
        let err = writer.write(&Event::new().with_stanza("s\u{1b}")).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidCharacter { ref field, .. } if field == "stanza"
        ));
        let out = String::from_utf8(writer.close().unwrap()).unwrap();
        assert_eq!(out, "<stream></stream>");
    }

    #[test]
    fn whitespace_controls_are_allowed() {
        let e = Event::new().with_data("a\tb\r\nc");
        assert_eq!(
            encode(&[e]),
            "<stream><event><data>a\tb\r\nc</data></event></stream>"
        );
    }
}
