// SPDX-License-Identifier: MIT OR Apache-2.0
//! modinput-protocol
//!
//! XML wire format spoken between a modular input and its host over stdio.
//!
//! - `--scheme`: the script writes a `<scheme>` document ([`encode_scheme`]).
//! - `--validate-arguments`: the host writes `<items>` ([`read_validation_items`]).
//! - no arguments: the host writes `<input>` ([`read_input_configuration`]) and
//!   the script answers with one `<stream>` of `<event>` elements
//!   ([`EventStreamWriter`]).
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod input;
pub mod scheme;
pub mod stream;
pub mod text;
pub mod time;
mod xml;

use modinput_core::ContractViolation;
use thiserror::Error;

pub use input::{
    parse_input_configuration, parse_validation_items, read_input_configuration,
    read_validation_items, write_input_configuration, write_validation_items,
};
pub use scheme::{encode_scheme, write_scheme};
pub use stream::{EventStreamWriter, FlushPolicy};
pub use text::normalize_input;
pub use time::format_unix_time;

/// Errors from reading or writing modular-input documents.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The input held no element at all (typically empty stdin).
    #[error("{document} document has no root element")]
    MissingRoot {
        /// Document kind, `input` or `items`.
        document: &'static str,
    },

    /// The root element is not the one this document kind requires.
    #[error("expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot {
        /// Required root element name.
        expected: &'static str,
        /// Root element actually present.
        found: String,
    },

    /// The XML is malformed or does not match the document schema.
    #[error("failed to parse {document} document: {reason}")]
    Parse {
        /// Document kind, `input` or `items`.
        document: &'static str,
        /// Parser detail.
        reason: String,
    },

    /// Input bytes are not UTF-8.
    #[error("input is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The document parsed but violates a model invariant.
    #[error("invalid document: {0}")]
    Contract(#[from] ContractViolation),

    /// Text holds a character XML 1.0 cannot carry, such as a C0 control.
    /// Nothing of the offending element was written.
    #[error("<{field}> contains {character:?}, which XML 1.0 does not allow")]
    InvalidCharacter {
        /// Element or attribute the text belongs to.
        field: String,
        /// First offending character.
        character: char,
    },

    /// Low-level XML writer failure.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The output or input stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The event stream was already closed.
    #[error("event stream already closed")]
    StreamClosed,
}
