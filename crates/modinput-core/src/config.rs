// SPDX-License-Identifier: MIT OR Apache-2.0
//! Inbound documents: the input configuration fed before streaming and the
//! validation items fed for `--validate-arguments`.
//!
//! Both documents share a [`ServerContext`] header. Lookup structures are
//! built once at construction; the documents are immutable afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ContractViolation;

/// Header fields common to every document the host writes to stdin.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ServerContext {
    pub server_host: String,
    /// Management URI of the host, e.g. `https://127.0.0.1:8089`.
    pub server_uri: String,
    /// Directory the input may use to persist progress between invocations.
    pub checkpoint_dir: PathBuf,
    /// Session token, valid for the lifetime of this process.
    pub session_key: String,
}

impl fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerContext")
            .field("server_host", &self.server_host)
            .field("server_uri", &self.server_uri)
            .field("checkpoint_dir", &self.checkpoint_dir)
            .field("session_key", &"<redacted>")
            .finish()
    }
}

/// Value of a single stanza parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    /// `<param name="..">value</param>`
    Single(String),
    /// `<param_list name=".."><value>..</value>..</param_list>`
    Multi(Vec<String>),
}

impl Parameter {
    #[must_use]
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::Single(v) => Some(v.as_str()),
            Self::Multi(_) => None,
        }
    }

    #[must_use]
    pub fn as_multi(&self) -> Option<&[String]> {
        match self {
            Self::Single(_) => None,
            Self::Multi(v) => Some(v.as_slice()),
        }
    }

    #[must_use]
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }
}

/// One configured instance of a modular input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stanza {
    name: String,
    app: Option<String>,
    parameters: BTreeMap<String, Parameter>,
}

impl Stanza {
    /// Build a stanza from parsed parameters.
    ///
    /// # Errors
    ///
    /// Fails when a parameter name appears more than once, whether as a
    /// single value or a list.
    pub fn new(
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = (String, Parameter)>,
    ) -> Result<Self, ContractViolation> {
        let name = name.into();
        let mut map = BTreeMap::new();
        for (key, value) in parameters {
            if map.contains_key(&key) {
                return Err(ContractViolation::DuplicateParameter {
                    stanza: name,
                    parameter: key,
                });
            }
            map.insert(key, value);
        }
        Ok(Self {
            name,
            app: None,
            parameters: map,
        })
    }

    #[must_use]
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Stanza name, e.g. `heartbeat://primary`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// App context the host reported for this stanza, if any.
    #[must_use]
    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    /// All parameters, ordered by name.
    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, Parameter> {
        &self.parameters
    }

    /// Value of a single-value parameter. `None` if absent or a list.
    #[must_use]
    pub fn single(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(Parameter::as_single)
    }

    /// Values of a multi-value parameter. `None` if absent or a single value.
    #[must_use]
    pub fn multi(&self, name: &str) -> Option<&[String]> {
        self.parameters.get(name).and_then(Parameter::as_multi)
    }

    pub fn single_value_parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .filter_map(|(k, v)| v.as_single().map(|s| (k.as_str(), s)))
    }

    pub fn multi_value_parameters(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.parameters
            .iter()
            .filter_map(|(k, v)| v.as_multi().map(|s| (k.as_str(), s)))
    }

    /// Parse a single-value parameter with [`FromStr`].
    ///
    /// Returns `Ok(None)` when the parameter is absent.
    pub fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, T::Err> {
        self.single(name).map(|v| v.trim().parse()).transpose()
    }

    /// Read a single-value parameter using the host's boolean spellings.
    ///
    /// Returns `None` when the parameter is absent or not a recognised boolean.
    #[must_use]
    pub fn bool_param(&self, name: &str) -> Option<bool> {
        self.single(name).and_then(parse_bool)
    }
}

/// Parse a host boolean (`1/0`, `true/false`, `t/f`, `yes/no`, `y/n`, `on/off`).
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration document read from stdin before streaming begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputConfiguration {
    pub server: ServerContext,
    stanzas: Vec<Stanza>,
    index: BTreeMap<String, usize>,
}

impl InputConfiguration {
    /// Assemble a configuration, indexing stanzas by name.
    ///
    /// # Errors
    ///
    /// Fails when two stanzas share a name.
    pub fn new(server: ServerContext, stanzas: Vec<Stanza>) -> Result<Self, ContractViolation> {
        let mut index = BTreeMap::new();
        for (i, stanza) in stanzas.iter().enumerate() {
            if index.insert(stanza.name.clone(), i).is_some() {
                return Err(ContractViolation::DuplicateStanza(stanza.name.clone()));
            }
        }
        Ok(Self {
            server,
            stanzas,
            index,
        })
    }

    /// Stanzas in document order.
    #[must_use]
    pub fn stanzas(&self) -> &[Stanza] {
        &self.stanzas
    }

    #[must_use]
    pub fn stanza(&self, name: &str) -> Option<&Stanza> {
        self.index.get(name).map(|&i| &self.stanzas[i])
    }

    /// The only stanza, for inputs declared with `use_single_instance = false`
    /// that expect one stanza per process.
    ///
    /// # Errors
    ///
    /// Fails unless the document holds exactly one stanza.
    pub fn single_stanza(&self) -> Result<&Stanza, ContractViolation> {
        match self.stanzas.as_slice() {
            [only] => Ok(only),
            other => Err(ContractViolation::NotSingleStanza { count: other.len() }),
        }
    }
}

/// Document read from stdin for `--validate-arguments`.
///
/// `item` is the not-yet-saved stanza being validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationItems {
    pub server: ServerContext,
    pub item: Stanza,
}
