// SPDX-License-Identifier: MIT OR Apache-2.0
//! `<input>` and `<items>` documents.
//!
//! Readers pull events from a quick-xml [`Reader`] with text trimming off, so
//! parameter values and header fields reach the model exactly as the host
//! wrote them, surrounding whitespace included. Whitespace between elements
//! is ignored. Readers are atomic: a failure at any point yields an error and
//! no partially populated value.
//!
//! The writers are the inverse and produce what a host would send, which is
//! what tests and local harnesses need to drive a script.

use std::fmt;
use std::io::{Read, Write};
use std::path::PathBuf;

use modinput_core::{InputConfiguration, Parameter, ServerContext, Stanza, ValidationItems};
use quick_xml::events::{BytesEnd, BytesStart, Event as XmlEvent};
use quick_xml::{Reader, Writer};
use tracing::debug;

use crate::xml::{check_text, open_root, reader, text_element, text_event};
use crate::{ProtocolError, normalize_input};

const INPUT_ROOT: &str = "input";
const ITEMS_ROOT: &str = "items";

// ---------------------------------------------------------------------------
// Pull parser
// ---------------------------------------------------------------------------

/// Everything found under the root of either document kind.
#[derive(Default)]
struct Body {
    server: ServerContext,
    stanzas: Vec<Stanza>,
    items: Vec<Stanza>,
}

struct DocReader<'a> {
    reader: Reader<&'a [u8]>,
    document: &'static str,
}

impl<'a> DocReader<'a> {
    fn parse(xml: &'a str, document: &'static str) -> Result<Body, ProtocolError> {
        let mut this = Self {
            reader: reader(xml),
            document,
        };
        if open_root(&mut this.reader, document)? {
            return Ok(Body::default());
        }
        this.body()
    }

    fn error(&self, reason: impl fmt::Display) -> ProtocolError {
        ProtocolError::Parse {
            document: self.document,
            reason: reason.to_string(),
        }
    }

    fn next(&mut self) -> Result<XmlEvent<'a>, ProtocolError> {
        match self.reader.read_event() {
            Ok(XmlEvent::Eof) => Err(self.error("unexpected end of document")),
            Ok(event) => Ok(event),
            Err(e) => Err(self.error(e)),
        }
    }

    fn skip(&mut self, start: &BytesStart<'_>) -> Result<(), ProtocolError> {
        match self.reader.read_to_end(start.name()) {
            Ok(_) => Ok(()),
            Err(e) => Err(self.error(e)),
        }
    }

    fn attribute(
        &self,
        start: &BytesStart<'_>,
        key: &str,
    ) -> Result<Option<String>, ProtocolError> {
        let Some(attr) = start.try_get_attribute(key).map_err(|e| self.error(e))? else {
            return Ok(None);
        };
        let value = attr.unescape_value().map_err(|e| self.error(e))?;
        Ok(Some(value.into_owned()))
    }

    fn name_attribute(&self, start: &BytesStart<'_>) -> Result<String, ProtocolError> {
        self.attribute(start, "name")?.ok_or_else(|| {
            self.error(format!(
                "<{}> without a name attribute",
                String::from_utf8_lossy(start.name().as_ref())
            ))
        })
    }

    fn body(&mut self) -> Result<Body, ProtocolError> {
        let mut body = Body::default();
        loop {
            let (start, empty) = match self.next()? {
                XmlEvent::Start(e) => (e, false),
                XmlEvent::Empty(e) => (e, true),
                XmlEvent::End(_) => return Ok(body),
                _ => continue,
            };
            match start.name().as_ref() {
                b"server_host" => body.server.server_host = self.text(empty)?,
                b"server_uri" => body.server.server_uri = self.text(empty)?,
                b"checkpoint_dir" => {
                    body.server.checkpoint_dir = PathBuf::from(self.text(empty)?);
                }
                b"session_key" => body.server.session_key = self.text(empty)?,
                b"configuration" if !empty => self.configuration(&mut body.stanzas)?,
                b"item" => body.items.push(self.stanza(&start, empty)?),
                _ if !empty => self.skip(&start)?,
                _ => {}
            }
        }
    }

    fn configuration(&mut self, stanzas: &mut Vec<Stanza>) -> Result<(), ProtocolError> {
        loop {
            let (start, empty) = match self.next()? {
                XmlEvent::Start(e) => (e, false),
                XmlEvent::Empty(e) => (e, true),
                XmlEvent::End(_) => return Ok(()),
                _ => continue,
            };
            match start.name().as_ref() {
                b"stanza" => stanzas.push(self.stanza(&start, empty)?),
                _ if !empty => self.skip(&start)?,
                _ => {}
            }
        }
    }

    /// `<stanza>` and `<item>` share this shape.
    fn stanza(&mut self, element: &BytesStart<'_>, empty: bool) -> Result<Stanza, ProtocolError> {
        let name = self.name_attribute(element)?;
        let app = self.attribute(element, "app")?;
        let mut parameters = Vec::new();
        while !empty {
            let (start, leaf) = match self.next()? {
                XmlEvent::Start(e) => (e, false),
                XmlEvent::Empty(e) => (e, true),
                XmlEvent::End(_) => break,
                _ => continue,
            };
            match start.name().as_ref() {
                b"param" => {
                    let param = self.name_attribute(&start)?;
                    parameters.push((param, Parameter::Single(self.text(leaf)?)));
                }
                b"param_list" => {
                    let param = self.name_attribute(&start)?;
                    let values = if leaf { Vec::new() } else { self.values()? };
                    parameters.push((param, Parameter::Multi(values)));
                }
                _ if !leaf => self.skip(&start)?,
                _ => {}
            }
        }
        let stanza = Stanza::new(name, parameters)?;
        Ok(match app {
            Some(app) => stanza.with_app(app),
            None => stanza,
        })
    }

    fn values(&mut self) -> Result<Vec<String>, ProtocolError> {
        let mut values = Vec::new();
        loop {
            let (start, empty) = match self.next()? {
                XmlEvent::Start(e) => (e, false),
                XmlEvent::Empty(e) => (e, true),
                XmlEvent::End(_) => return Ok(values),
                _ => continue,
            };
            match start.name().as_ref() {
                b"value" => values.push(self.text(empty)?),
                _ if !empty => self.skip(&start)?,
                _ => {}
            }
        }
    }

    /// Character data up to the end tag of the element just opened.
    fn text(&mut self, empty: bool) -> Result<String, ProtocolError> {
        let mut text = String::new();
        if empty {
            return Ok(text);
        }
        loop {
            match self.next()? {
                XmlEvent::Text(t) => text.push_str(&t.unescape().map_err(|e| self.error(e))?),
                XmlEvent::CData(c) => {
                    text.push_str(std::str::from_utf8(&c).map_err(|e| self.error(e))?);
                }
                XmlEvent::Start(e) => self.skip(&e)?,
                XmlEvent::End(_) => return Ok(text),
                _ => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

/// Parse an `<input>` document.
///
/// # Errors
///
/// Fails when the text holds no `<input>` root, is not well formed, or
/// repeats a stanza or parameter name.
pub fn parse_input_configuration(xml: &str) -> Result<InputConfiguration, ProtocolError> {
    let body = DocReader::parse(xml, INPUT_ROOT)?;
    debug!(stanzas = body.stanzas.len(), "parsed input configuration");
    Ok(InputConfiguration::new(body.server, body.stanzas)?)
}

/// Read an `<input>` document from `reader` until EOF.
pub fn read_input_configuration<R: Read>(
    mut reader: R,
) -> Result<InputConfiguration, ProtocolError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_input_configuration(normalize_input(&bytes)?)
}

/// Parse an `<items>` document.
///
/// # Errors
///
/// Fails when the text holds no `<items>` root, lacks the `<item>` element
/// or repeats it, or is not well formed.
pub fn parse_validation_items(xml: &str) -> Result<ValidationItems, ProtocolError> {
    let body = DocReader::parse(xml, ITEMS_ROOT)?;
    let mut items = body.items.into_iter();
    let (Some(item), None) = (items.next(), items.next()) else {
        return Err(ProtocolError::Parse {
            document: ITEMS_ROOT,
            reason: "expected exactly one <item> element".into(),
        });
    };
    debug!(item = item.name(), "parsed validation items");
    Ok(ValidationItems {
        server: body.server,
        item,
    })
}

/// Read an `<items>` document from `reader` until EOF.
pub fn read_validation_items<R: Read>(mut reader: R) -> Result<ValidationItems, ProtocolError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_validation_items(normalize_input(&bytes)?)
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// Write `config` as an `<input>` document.
pub fn write_input_configuration<W: Write>(
    sink: W,
    config: &InputConfiguration,
) -> Result<W, ProtocolError> {
    let mut writer = Writer::new(sink);
    writer.write_event(XmlEvent::Start(BytesStart::new(INPUT_ROOT)))?;
    write_server_context(&mut writer, &config.server)?;
    writer.write_event(XmlEvent::Start(BytesStart::new("configuration")))?;
    for stanza in config.stanzas() {
        write_stanza(&mut writer, "stanza", stanza)?;
    }
    writer.write_event(XmlEvent::End(BytesEnd::new("configuration")))?;
    writer.write_event(XmlEvent::End(BytesEnd::new(INPUT_ROOT)))?;
    Ok(writer.into_inner())
}

/// Write `items` as an `<items>` document.
pub fn write_validation_items<W: Write>(
    sink: W,
    items: &ValidationItems,
) -> Result<W, ProtocolError> {
    let mut writer = Writer::new(sink);
    writer.write_event(XmlEvent::Start(BytesStart::new(ITEMS_ROOT)))?;
    write_server_context(&mut writer, &items.server)?;
    write_stanza(&mut writer, "item", &items.item)?;
    writer.write_event(XmlEvent::End(BytesEnd::new(ITEMS_ROOT)))?;
    Ok(writer.into_inner())
}

fn write_server_context<W: Write>(
    writer: &mut Writer<W>,
    server: &ServerContext,
) -> Result<(), ProtocolError> {
    text_element(writer, "server_host", &server.server_host)?;
    text_element(writer, "server_uri", &server.server_uri)?;
    text_element(
        writer,
        "checkpoint_dir",
        &server.checkpoint_dir.to_string_lossy(),
    )?;
    text_element(writer, "session_key", &server.session_key)?;
    Ok(())
}

fn write_stanza<W: Write>(
    writer: &mut Writer<W>,
    element: &str,
    stanza: &Stanza,
) -> Result<(), ProtocolError> {
    check_text(element, stanza.name())?;
    let mut start = BytesStart::new(element);
    start.push_attribute(("name", stanza.name()));
    if let Some(app) = stanza.app() {
        check_text(element, app)?;
        start.push_attribute(("app", app));
    }
    writer.write_event(XmlEvent::Start(start))?;
    for (name, parameter) in stanza.parameters() {
        check_text(element, name)?;
        match parameter {
            Parameter::Single(value) => {
                check_text(name, value)?;
                let mut param = BytesStart::new("param");
                param.push_attribute(("name", name.as_str()));
                writer.write_event(XmlEvent::Start(param))?;
                writer.write_event(XmlEvent::Text(text_event(value)))?;
                writer.write_event(XmlEvent::End(BytesEnd::new("param")))?;
            }
            Parameter::Multi(values) => {
                let mut list = BytesStart::new("param_list");
                list.push_attribute(("name", name.as_str()));
                writer.write_event(XmlEvent::Start(list))?;
                for value in values {
                    text_element(writer, "value", value)?;
                }
                writer.write_event(XmlEvent::End(BytesEnd::new("param_list")))?;
            }
        }
    }
    writer.write_event(XmlEvent::End(BytesEnd::new(element)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<input>
  <server_host>tiny</server_host>
  <server_uri>https://127.0.0.1:8089</server_uri>
  <checkpoint_dir>/opt/host/var/lib/modinputs</checkpoint_dir>
  <session_key>123102983109283019283</session_key>
  <configuration>
    <stanza name="foobar://aaa" app="search">
      <param name="param1">value1</param>
      <param_list name="multiValue">
        <value>value1</value>
        <value>value2</value>
      </param_list>
      <param name="param2">value2</param>
    </stanza>
    <stanza name="foobar://bbb">
      <param name="param1">value11</param>
    </stanza>
  </configuration>
</input>"#;

    const ITEMS: &str = r#"<items>
  <server_host>tiny</server_host>
  <server_uri>https://127.0.0.1:8089</server_uri>
  <checkpoint_dir>/opt/host/var/lib/modinputs</checkpoint_dir>
  <session_key>123102983109283019283</session_key>
  <item name="aaa">
    <param name="param1">value1</param>
    <param_list name="multiValue">
      <value>value1</value>
      <value>value2</value>
    </param_list>
  </item>
</items>"#;

    #[test]
    fn parses_header_and_stanzas() {
        let config = parse_input_configuration(INPUT).unwrap();
        assert_eq!(config.server.server_host, "tiny");
        assert_eq!(config.server.server_uri, "https://127.0.0.1:8089");
        assert_eq!(
            config.server.checkpoint_dir,
            PathBuf::from("/opt/host/var/lib/modinputs")
        );
        assert_eq!(config.server.session_key, "123102983109283019283");

        let names: Vec<_> = config.stanzas().iter().map(Stanza::name).collect();
        assert_eq!(names, ["foobar://aaa", "foobar://bbb"]);

        let aaa = config.stanza("foobar://aaa").unwrap();
        assert_eq!(aaa.app(), Some("search"));
        assert_eq!(aaa.single("param1"), Some("value1"));
        assert_eq!(aaa.single("param2"), Some("value2"));
        assert_eq!(aaa.multi("multiValue").unwrap(), ["value1", "value2"]);

        let bbb = config.stanza("foobar://bbb").unwrap();
        assert_eq!(bbb.app(), None);
        assert_eq!(bbb.parameters().len(), 1);
    }

    #[test]
    fn parses_validation_items() {
        let items = parse_validation_items(ITEMS).unwrap();
        assert_eq!(items.server.server_host, "tiny");
        assert_eq!(items.item.name(), "aaa");
        assert_eq!(items.item.single("param1"), Some("value1"));
        assert_eq!(items.item.multi("multiValue").unwrap().len(), 2);
    }

    #[test]
    fn empty_configuration_is_valid() {
        let config = parse_input_configuration(
            "<input><server_host>h</server_host><configuration/></input>",
        )
        .unwrap();
        assert!(config.stanzas().is_empty());
        assert_eq!(config.server.server_host, "h");
    }

    #[test]
    fn empty_stdin_is_missing_root() {
        let err = read_input_configuration(&b""[..]).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingRoot { document: "input" }));
    }

    #[test]
    fn wrong_document_kind_is_rejected() {
        assert!(matches!(
            parse_input_configuration(ITEMS),
            Err(ProtocolError::UnexpectedRoot { .. })
        ));
        assert!(matches!(
            parse_validation_items(INPUT),
            Err(ProtocolError::UnexpectedRoot { .. })
        ));
    }

    #[test]
    fn items_without_item_is_a_parse_error() {
        let err =
            parse_validation_items("<items><server_host>h</server_host></items>").unwrap_err();
        assert!(matches!(err, ProtocolError::Parse { document: "items", .. }));
    }

    #[test]
    fn truncated_document_is_a_parse_error() {
        let truncated = &INPUT[..INPUT.len() / 2];
        assert!(matches!(
            parse_input_configuration(truncated),
            Err(ProtocolError::Parse { .. })
        ));
    }

    #[test]
    fn duplicate_stanza_is_rejected() {
        let xml = r#"<input><configuration>
            <stanza name="a"></stanza><stanza name="a"></stanza>
        </configuration></input>"#;
        assert!(matches!(
            parse_input_configuration(xml),
            Err(ProtocolError::Contract(_))
        ));
    }

    #[test]
    fn escaped_values_are_decoded() {
        let xml = r#"<input><session_key>a&amp;b</session_key><configuration>
            <stanza name="x"><param name="q">1 &lt; 2</param></stanza>
        </configuration></input>"#;
        let config = parse_input_configuration(xml).unwrap();
        assert_eq!(config.server.session_key, "a&b");
        assert_eq!(config.stanza("x").unwrap().single("q"), Some("1 < 2"));
    }

    #[test]
    fn bom_prefixed_stdin_is_accepted() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(ITEMS.as_bytes());
        let items = read_validation_items(bytes.as_slice()).unwrap();
        assert_eq!(items.item.name(), "aaa");
    }

    #[test]
    fn written_input_reads_back_equal() {
        let config = parse_input_configuration(INPUT).unwrap();
        let bytes = write_input_configuration(Vec::new(), &config).unwrap();
        let again = read_input_configuration(bytes.as_slice()).unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn written_items_read_back_equal() {
        let items = parse_validation_items(ITEMS).unwrap();
        let bytes = write_validation_items(Vec::new(), &items).unwrap();
        let again = read_validation_items(bytes.as_slice()).unwrap();
        assert_eq!(again, items);
    }

    #[test]
    fn padded_values_are_kept_verbatim() {
        let xml = r#"<input>
  <session_key> k </session_key>
  <configuration>
    <stanza name="s">
      <param name="re">  a b  </param>
      <param name="ws">   </param>
      <param name="nl">
line
</param>
      <param_list name="l">
        <value> x </value>
        <value></value>
        <value/>
      </param_list>
    </stanza>
  </configuration>
</input>"#;
        let config = parse_input_configuration(xml).unwrap();
        assert_eq!(config.server.session_key, " k ");
        let s = config.stanza("s").unwrap();
        assert_eq!(s.single("re"), Some("  a b  "));
        assert_eq!(s.single("ws"), Some("   "));
        assert_eq!(s.single("nl"), Some("\nline\n"));
        assert_eq!(s.multi("l").unwrap(), [" x ", "", ""]);
    }

    #[test]
    fn padded_model_round_trips() {
        let stanza = Stanza::new(
            "hb://a",
            [
                ("message".to_string(), Parameter::Single(" hi ".into())),
                ("blank".to_string(), Parameter::Single(String::new())),
                (
                    "tags".to_string(),
                    Parameter::Multi(vec!["  ".into(), "é x".into()]),
                ),
            ],
        )
        .unwrap();
        let server = ServerContext {
            session_key: "\tkey ".into(),
            ..ServerContext::default()
        };
        let config = InputConfiguration::new(server, vec![stanza]).unwrap();
        let bytes = write_input_configuration(Vec::new(), &config).unwrap();
        let back = read_input_configuration(bytes.as_slice()).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.stanzas()[0].single("message"), Some(" hi "));
    }

    #[test]
    fn empty_elements_and_cdata() {
        let xml = r#"<items><server_host/><item name="i">
            <param name="a"/><param_list name="b"/>
            <param name="c"><![CDATA[ <raw> ]]></param>
        </item></items>"#;
        let items = parse_validation_items(xml).unwrap();
        assert_eq!(items.server.server_host, "");
        assert_eq!(items.item.single("a"), Some(""));
        assert!(items.item.multi("b").unwrap().is_empty());
        assert_eq!(items.item.single("c"), Some(" <raw> "));
    }

    #[test]
    fn unknown_elements_are_skipped() {
        let xml = r#"<input><extra><nested>1</nested></extra><configuration>
            <stanza name="s"><note>n</note><param name="p">v</param></stanza>
            <other/>
        </configuration></input>"#;
        let config = parse_input_configuration(xml).unwrap();
        assert_eq!(config.stanzas().len(), 1);
        assert_eq!(config.stanza("s").unwrap().parameters().len(), 1);
    }

    #[test]
    fn stanza_without_name_is_a_parse_error() {
        let xml = "<input><configuration><stanza></stanza></configuration></input>";
        assert!(matches!(
            parse_input_configuration(xml),
            Err(ProtocolError::Parse { document: "input", .. })
        ));
    }

    #[test]
    fn second_item_is_rejected() {
        let xml = r#"<items><item name="a"/><item name="b"/></items>"#;
        assert!(matches!(
            parse_validation_items(xml),
            Err(ProtocolError::Parse { document: "items", .. })
        ));
    }

    #[test]
    fn mismatched_end_tag_is_a_parse_error() {
        let xml = r#"<input><session_key>k</server_host></input>"#;
        assert!(matches!(
            parse_input_configuration(xml),
            Err(ProtocolError::Parse { .. })
        ));
    }

    #[test]
    fn writer_rejects_control_characters() {
        let stanza = Stanza::new("s", [("p".to_string(), Parameter::Single("\u{2}".into()))])
            .unwrap();
        let items = ValidationItems {
            server: ServerContext::default(),
            item: stanza,
        };
        assert!(matches!(
            write_validation_items(Vec::new(), &items),
            Err(ProtocolError::InvalidCharacter { .. })
        ));
    }
}
