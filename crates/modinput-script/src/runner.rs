// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dispatching one invocation to a [`Script`].

use std::any::Any;
use std::io::{self, Read, Write};
use std::panic::{self, AssertUnwindSafe};

use modinput_log::Logger;
use modinput_protocol::{
    EventStreamWriter, FlushPolicy, read_input_configuration, read_validation_items, write_scheme,
};
use tracing::debug;

use crate::{Mode, Script, ScriptError};

/// Runs a [`Script`] for one process invocation.
///
/// Failures, including panics inside the script, are reported as a single
/// `FATAL Unhandled exception: ...` line and exit code 1.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    logger: Logger,
    flush_policy: FlushPolicy,
}

impl ScriptRunner {
    /// Runner reporting progress and failures through `logger`.
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            flush_policy: FlushPolicy::default(),
        }
    }

    /// Flush policy for the event stream.
    #[must_use]
    pub fn with_flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.flush_policy = policy;
        self
    }

    /// Logger the runner reports through.
    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Run against the process arguments, stdin and stdout.
    pub fn run<S: Script + ?Sized>(&self, script: &mut S) -> i32 {
        let args: Vec<String> = std::env::args_os()
            .skip(1)
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let stdin = io::stdin().lock();
        let mut stdout = io::stdout().lock();
        self.run_with_io(script, args, stdin, &mut stdout)
    }

    /// Run with injectable arguments and I/O (for testing).
    ///
    /// `args` excludes the program name. Returns the process exit code.
    pub fn run_with_io<S, I, A, R, W>(
        &self,
        script: &mut S,
        args: I,
        input: R,
        output: &mut W,
    ) -> i32
    where
        S: Script + ?Sized,
        I: IntoIterator<Item = A>,
        A: AsRef<str>,
        R: Read,
        W: Write,
    {
        let mode = Mode::from_args(args);
        debug!(%mode, "dispatching");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.dispatch(script, mode, input, output)
        }));
        let result = match outcome {
            Ok(result) => result,
            Err(payload) => Err(ScriptError::invalid(panic_message(payload.as_ref()))),
        };
        match result {
            Ok(()) => 0,
            Err(e) => {
                self.logger
                    .fatal(format_args!("Unhandled exception: {e}"));
                1
            }
        }
    }

    fn dispatch<S, R, W>(
        &self,
        script: &mut S,
        mode: Mode,
        input: R,
        output: &mut W,
    ) -> Result<(), ScriptError>
    where
        S: Script + ?Sized,
        R: Read,
        W: Write,
    {
        match mode {
            Mode::StreamEvents => {
                self.logger.info("Reading input definition");
                let config = read_input_configuration(input)?;
                debug!(stanzas = config.stanzas().len(), "streaming events");
                let sink: &mut dyn Write = output;
                let mut writer =
                    EventStreamWriter::new(sink)?.with_flush_policy(self.flush_policy);
                script.stream_events(config, &mut writer)?;
                writer.close()?;
            }
            Mode::DescribeScheme => {
                if let Some(scheme) = script.scheme() {
                    write_scheme(&mut *output, &scheme)?;
                    output.flush()?;
                }
            }
            Mode::ValidateArguments => {
                self.logger.info("Reading validation items");
                let items = read_validation_items(input)?;
                script.validate(items)?;
            }
            Mode::Ignore => debug!("unrecognised arguments, nothing to do"),
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with non-string payload".to_owned()
    }
}
