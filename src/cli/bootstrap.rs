//! Process bootstrap: configure diagnostics, then run the command
//!
//! Sinks are in place before the command starts; if they cannot be set up
//! the command never runs.

use std::path::Path;

use tracing::debug;

use crate::cli::args::Cli;
use crate::cli::commands::execute_command;
use crate::cli::CliResult;
use crate::diagnostics::{Diagnostics, DiagnosticsBuilder};

/// A parsed request: where to log, and what to do.
pub trait Invocation {
    /// File receiving the debug log, if requested.
    fn log_file(&self) -> Option<&Path>;

    /// Perform the requested action.
    fn run(&self, diagnostics: &Diagnostics) -> CliResult<()>;
}

impl Invocation for Cli {
    fn log_file(&self) -> Option<&Path> {
        self.log.as_deref()
    }

    fn run(&self, diagnostics: &Diagnostics) -> CliResult<()> {
        execute_command(self, diagnostics)
    }
}

/// Build diagnostics for `invocation` and run it once under them.
pub fn bootstrap<I>(invocation: &I, builder: DiagnosticsBuilder) -> CliResult<()>
where
    I: Invocation + ?Sized,
{
    let diagnostics = builder.log_file(invocation.log_file()).build()?;
    diagnostics.in_scope(|| {
        debug!("diagnostics ready: {:?}", diagnostics.sinks());
        let result = invocation.run(&diagnostics);
        if let Err(e) = &result {
            debug!("command failed: {}", e);
        }
        result
    })
}
