// SPDX-License-Identifier: MIT OR Apache-2.0
//! Introspection model: the [`Scheme`] a modular input reports for `--scheme`.

use std::fmt;

use crate::ContractViolation;

/// Value type the host enforces for an [`Argument`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DataType {
    /// `boolean`
    Boolean,
    /// `number`
    Number,
    /// `string`
    #[default]
    String,
}

impl DataType {
    /// Wire spelling used inside `<data_type>`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the modular input formats what it writes to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StreamingMode {
    /// Raw text, one event per line.
    Simple,
    /// The `<stream>` document produced by the event stream writer.
    #[default]
    Xml,
}

impl StreamingMode {
    /// Wire spelling used inside `<streaming_mode>`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for StreamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configurable parameter of a modular input type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Unique key within the endpoint.
    pub name: String,
    /// Display label.
    pub title: Option<String>,
    pub description: Option<String>,
    /// Validation expression evaluated by the host.
    pub validation: Option<String>,
    pub data_type: DataType,
    pub required_on_edit: bool,
    pub required_on_create: bool,
}

impl Argument {
    /// Create a string argument that is required on create and optional on edit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            validation: None,
            data_type: DataType::String,
            required_on_edit: false,
            required_on_create: true,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn validation(mut self, expression: impl Into<String>) -> Self {
        self.validation = Some(expression.into());
        self
    }

    #[must_use]
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    #[must_use]
    pub fn required_on_edit(mut self, required: bool) -> Self {
        self.required_on_edit = required;
        self
    }

    #[must_use]
    pub fn required_on_create(mut self, required: bool) -> Self {
        self.required_on_create = required;
        self
    }
}

/// The full introspection document for one modular input type.
///
/// Built once by the host program and serialized on `--scheme`; never read
/// back. Arguments keep insertion order, which is also their wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
    pub title: String,
    pub description: Option<String>,
    /// When true the script must override validation; the default callback fails.
    pub use_external_validation: bool,
    pub use_single_instance: bool,
    pub streaming_mode: StreamingMode,
    arguments: Vec<Argument>,
}

impl Scheme {
    /// Create a scheme with external validation on, single instance off and
    /// XML streaming.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            use_external_validation: true,
            use_single_instance: false,
            streaming_mode: StreamingMode::Xml,
            arguments: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn external_validation(mut self, enabled: bool) -> Self {
        self.use_external_validation = enabled;
        self
    }

    #[must_use]
    pub fn single_instance(mut self, enabled: bool) -> Self {
        self.use_single_instance = enabled;
        self
    }

    #[must_use]
    pub fn streaming_mode(mut self, mode: StreamingMode) -> Self {
        self.streaming_mode = mode;
        self
    }

    /// Builder form of [`Scheme::add_argument`].
    pub fn argument(mut self, argument: Argument) -> Result<Self, ContractViolation> {
        self.add_argument(argument)?;
        Ok(self)
    }

    /// Append an argument to the endpoint.
    ///
    /// # Errors
    ///
    /// Fails when the name is empty or already declared.
    pub fn add_argument(&mut self, argument: Argument) -> Result<(), ContractViolation> {
        if argument.name.is_empty() {
            return Err(ContractViolation::EmptyArgumentName);
        }
        if self.arguments.iter().any(|a| a.name == argument.name) {
            return Err(ContractViolation::DuplicateArgument(argument.name));
        }
        self.arguments.push(argument);
        Ok(())
    }

    /// Endpoint arguments in declaration order.
    #[must_use]
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    #[must_use]
    pub fn find_argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name == name)
    }
}
