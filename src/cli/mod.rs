//! CLI layer: argument parsing, bootstrap and command dispatch

pub mod args;
pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod output;

pub use args::{Cli, Commands};
pub use bootstrap::{bootstrap, Invocation};
pub use error::{CliError, CliResult};
