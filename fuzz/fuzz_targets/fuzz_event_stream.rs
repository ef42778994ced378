// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz event stream encoding with structured events.
//!
//! Every accepted event must encode, or be refused whole for a character
//! XML 1.0 forbids, and the stream must always end with exactly one
//! `</stream>`.
#![no_main]
use arbitrary::Arbitrary;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use modinput_core::Event;
use modinput_protocol::{EventStreamWriter, ProtocolError};

#[derive(Debug, Arbitrary)]
struct FuzzEvent {
    data: Option<String>,
    source: Option<String>,
    source_type: Option<String>,
    index: Option<String>,
    host: Option<String>,
    stanza: Option<String>,
    time: Option<(i32, u32)>,
    unbroken: bool,
    done: bool,
}

impl FuzzEvent {
    fn build(self) -> Option<Event> {
        let mut event = Event::new();
        if let Some(v) = self.data {
            event = event.with_data(v);
        }
        if let Some(v) = self.source {
            event = event.with_source(v);
        }
        if let Some(v) = self.source_type {
            event = event.with_source_type(v);
        }
        if let Some(v) = self.index {
            event = event.with_index(v);
        }
        if let Some(v) = self.host {
            event = event.with_host(v);
        }
        if let Some(v) = self.stanza {
            event = event.with_stanza(v);
        }
        if let Some((secs, nanos)) = self.time {
            let t = Utc
                .timestamp_opt(i64::from(secs), nanos % 1_000_000_000)
                .single()?;
            event = event.with_time(t).ok()?;
        }
        if self.unbroken {
            // rejected when a time is set
            event = event.unbroken().ok()?;
        }
        if self.done {
            event = event.done();
        }
        Some(event)
    }
}

fuzz_target!(|events: Vec<FuzzEvent>| {
    let mut writer = EventStreamWriter::new(Vec::new()).expect("Vec sink");
    for fe in events {
        if let Some(event) = fe.build() {
            match writer.write(&event) {
                Ok(()) | Err(ProtocolError::InvalidCharacter { .. }) => {}
                Err(e) => panic!("encoding a valid event: {e}"),
            }
        }
    }
    let out = writer.close().expect("close");
    let text = String::from_utf8(out).expect("utf-8 in, utf-8 out");
    assert!(text.starts_with("<stream>"));
    assert_eq!(text.matches("</stream>").count(), 1);
});
