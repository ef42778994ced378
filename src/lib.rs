// SPDX-License-Identifier: MIT OR Apache-2.0
//! modinput
//!
//! Toolkit for writing modular inputs: executables the host analytics
//! platform runs to ingest data, talking XML over stdin and stdout.
//!
//! - [`model`]: the data model (scheme, configuration, events).
//! - [`protocol`]: the XML documents and the event stream writer.
//! - [`logging`]: host-format log lines and the tracing bridge.
//! - [`script`]: the [`Script`](script::Script) trait and its dispatcher.
#![deny(unsafe_code)]

pub use modinput_core as model;
pub use modinput_log as logging;
pub use modinput_protocol as protocol;
pub use modinput_script as script;

/// Everything a typical input needs in one import.
pub mod prelude {
    pub use modinput_core::{
        Argument, DataType, Event, InputConfiguration, Parameter, Scheme, ServerContext, Stanza,
        StreamingMode, ValidationItems,
    };
    pub use modinput_log::{LogConfig, Logger, LoggerLayer, LoggerRegistry, Severity};
    pub use modinput_protocol::{EventStreamWriter, FlushPolicy};
    pub use modinput_script::{EventWriter, Mode, Script, ScriptError, ScriptRunner, run};
}
