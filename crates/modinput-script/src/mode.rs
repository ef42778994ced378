// SPDX-License-Identifier: MIT OR Apache-2.0
//! Selecting what an invocation does from its arguments.

use std::fmt;

/// Flag asking for the scheme document.
pub const SCHEME_FLAG: &str = "--scheme";

/// Flag asking for validation of a proposed configuration.
pub const VALIDATE_FLAG: &str = "--validate-arguments";

/// What a single invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No arguments: read `<input>` and stream events.
    StreamEvents,
    /// `--scheme`: print the scheme.
    DescribeScheme,
    /// `--validate-arguments`: read `<items>` and validate.
    ValidateArguments,
    /// Unrecognised arguments: exit successfully without doing anything.
    Ignore,
}

impl Mode {
    /// Pick the mode from the arguments after the program name.
    ///
    /// Only the first argument is inspected, case-insensitively.
    ///
    /// ```
    /// use modinput_script::Mode;
    ///
    /// assert_eq!(Mode::from_args(Vec::<String>::new()), Mode::StreamEvents);
    /// assert_eq!(Mode::from_args(["--SCHEME"]), Mode::DescribeScheme);
    /// assert_eq!(Mode::from_args(["--help"]), Mode::Ignore);
    /// ```
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(first) = args.into_iter().next() else {
            return Mode::StreamEvents;
        };
        let first = first.as_ref();
        if first.eq_ignore_ascii_case(SCHEME_FLAG) {
            Mode::DescribeScheme
        } else if first.eq_ignore_ascii_case(VALIDATE_FLAG) {
            Mode::ValidateArguments
        } else {
            Mode::Ignore
        }
    }

    /// Whether this mode reads a document from stdin.
    #[must_use]
    pub fn reads_stdin(self) -> bool {
        matches!(self, Mode::StreamEvents | Mode::ValidateArguments)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::StreamEvents => "stream-events",
            Mode::DescribeScheme => "describe-scheme",
            Mode::ValidateArguments => "validate-arguments",
            Mode::Ignore => "ignore",
        };
        f.write_str(name)
    }
}
