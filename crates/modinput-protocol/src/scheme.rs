// SPDX-License-Identifier: MIT OR Apache-2.0
//! `<scheme>` encoder.

use std::io::Write;

use modinput_core::{Argument, Scheme};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event as XmlEvent};

use crate::ProtocolError;
use crate::xml::{bool_text, check_text, text_element};

/// Serialize `scheme` to its canonical XML text.
///
/// The output has no declaration and no insignificant whitespace, so the
/// same scheme always encodes to the same bytes.
///
/// # Errors
///
/// Only fails if the XML writer fails.
pub fn encode_scheme(scheme: &Scheme) -> Result<String, ProtocolError> {
    let bytes = write_scheme(Vec::new(), scheme)?;
    String::from_utf8(bytes).map_err(|e| ProtocolError::Encoding(e.utf8_error()))
}

/// Write `scheme` to `sink` and hand the sink back.
pub fn write_scheme<W: Write>(sink: W, scheme: &Scheme) -> Result<W, ProtocolError> {
    let mut writer = Writer::new(sink);
    writer.write_event(XmlEvent::Start(BytesStart::new("scheme")))?;
    text_element(&mut writer, "title", &scheme.title)?;
    if let Some(description) = &scheme.description {
        text_element(&mut writer, "description", description)?;
    }
    text_element(
        &mut writer,
        "use_external_validation",
        bool_text(scheme.use_external_validation),
    )?;
    text_element(
        &mut writer,
        "use_single_instance",
        bool_text(scheme.use_single_instance),
    )?;
    text_element(&mut writer, "streaming_mode", scheme.streaming_mode.as_str())?;

    writer.write_event(XmlEvent::Start(BytesStart::new("endpoint")))?;
    writer.write_event(XmlEvent::Start(BytesStart::new("args")))?;
    for argument in scheme.arguments() {
        write_argument(&mut writer, argument)?;
    }
    writer.write_event(XmlEvent::End(BytesEnd::new("args")))?;
    writer.write_event(XmlEvent::End(BytesEnd::new("endpoint")))?;

    writer.write_event(XmlEvent::End(BytesEnd::new("scheme")))?;
    Ok(writer.into_inner())
}

fn write_argument<W: Write>(writer: &mut Writer<W>, arg: &Argument) -> Result<(), ProtocolError> {
    check_text("arg", &arg.name)?;
    let mut start = BytesStart::new("arg");
    start.push_attribute(("name", arg.name.as_str()));
    writer.write_event(XmlEvent::Start(start))?;
    if let Some(title) = &arg.title {
        text_element(writer, "title", title)?;
    }
    if let Some(description) = &arg.description {
        text_element(writer, "description", description)?;
    }
    if let Some(validation) = &arg.validation {
        text_element(writer, "validation", validation)?;
    }
    text_element(writer, "data_type", arg.data_type.as_str())?;
    text_element(writer, "required_on_edit", bool_text(arg.required_on_edit))?;
    text_element(
        writer,
        "required_on_create",
        bool_text(arg.required_on_create),
    )?;
    writer.write_event(XmlEvent::End(BytesEnd::new("arg")))?;
    Ok(())
}
