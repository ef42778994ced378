// SPDX-License-Identifier: MIT OR Apache-2.0
//! Contract violations raised by the data model.

use thiserror::Error;

/// A programming error in the code producing modular-input values.
///
/// These are raised at the point of violation (setter, builder or accessor)
/// rather than deferred to the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// A timestamp was assigned to an event already marked unbroken.
    #[error("cannot set a time on an unbroken event")]
    TimeOnUnbrokenEvent,

    /// An event carrying a timestamp was marked unbroken.
    #[error("cannot mark an event with a time as unbroken")]
    UnbrokenEventWithTime,

    /// An argument was added with an empty name.
    #[error("argument name must not be empty")]
    EmptyArgumentName,

    /// An argument name was declared twice on one endpoint.
    #[error("duplicate argument '{0}'")]
    DuplicateArgument(String),

    /// Two stanzas in one document share a name.
    #[error("duplicate stanza '{0}'")]
    DuplicateStanza(String),

    /// A stanza declares the same parameter name twice.
    #[error("duplicate parameter '{parameter}' in stanza '{stanza}'")]
    DuplicateParameter {
        /// Stanza holding the parameter.
        stanza: String,
        /// Repeated parameter name.
        parameter: String,
    },

    /// The single-stanza accessor was used on a document without exactly one stanza.
    #[error("expected exactly one stanza, found {count}")]
    NotSingleStanza {
        /// Number of stanzas in the document.
        count: usize,
    },
}
