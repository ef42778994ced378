// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared quick-xml plumbing.

use std::io::Write;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event as XmlEvent};

use crate::ProtocolError;

/// Write `<name>text</name>`, escaping `text`.
pub(crate) fn text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), ProtocolError> {
    check_text(name, text)?;
    writer.write_event(XmlEvent::Start(BytesStart::new(name)))?;
    writer.write_event(XmlEvent::Text(text_event(text)))?;
    writer.write_event(XmlEvent::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Character data with only `<`, `>` and `&` escaped, so quotes in
/// payloads such as JSON pass through untouched.
pub(crate) fn text_event(text: &str) -> BytesText<'_> {
    BytesText::from_escaped(partial_escape(text))
}

pub(crate) fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Reject text holding a character outside the XML 1.0 `Char` production.
pub(crate) fn check_text(field: &str, text: &str) -> Result<(), ProtocolError> {
    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(character) => Err(ProtocolError::InvalidCharacter {
            field: field.to_owned(),
            character,
        }),
        None => Ok(()),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..
    )
}

/// A reader over `xml` that keeps text exactly as written.
pub(crate) fn reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    reader
}

/// Advance `reader` to the root element and check that it is `<expected>`.
///
/// Declarations, comments and whitespace before the root are skipped.
/// Returns `true` when the root is self-closing.
pub(crate) fn open_root(
    reader: &mut Reader<&[u8]>,
    expected: &'static str,
) -> Result<bool, ProtocolError> {
    loop {
        let event = reader.read_event().map_err(|e| ProtocolError::Parse {
            document: expected,
            reason: e.to_string(),
        })?;
        let (e, empty) = match event {
            XmlEvent::Start(e) => (e, false),
            XmlEvent::Empty(e) => (e, true),
            XmlEvent::Text(t) if t.iter().all(u8::is_ascii_whitespace) => continue,
            XmlEvent::Text(_) | XmlEvent::CData(_) => {
                return Err(ProtocolError::Parse {
                    document: expected,
                    reason: "text before root element".into(),
                });
            }
            XmlEvent::Eof => return Err(ProtocolError::MissingRoot { document: expected }),
            _ => continue,
        };
        let found = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        if found == expected {
            return Ok(empty);
        }
        return Err(ProtocolError::UnexpectedRoot { expected, found });
    }
}
