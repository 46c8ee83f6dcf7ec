//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("not a dantalian library: {0}")]
    NotALibrary(PathBuf),

    #[error("library moved from {recorded} to {current}; run fix first")]
    LibraryMoved { recorded: PathBuf, current: PathBuf },

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("is a directory; convert it first: {0}")]
    IsADirectory(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("name conflict: {0}")]
    NameConflict(PathBuf),

    #[error("path outside library: {0}")]
    OutsideLibrary(PathBuf),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
