//! dantalian: tag files with hard links
//!
//! Directories of a library are tags; a hard link to a file inside a tag's
//! directory assigns that tag.

pub mod application;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
