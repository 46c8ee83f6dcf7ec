//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                // only raised when opening the log file
                InfraError::Io { .. } => crate::exitcode::CANTCREAT,
                InfraError::Application(app) => match app {
                    ApplicationError::NotALibrary(_) => crate::exitcode::NOT_LIBRARY,
                    ApplicationError::Domain(_) => crate::exitcode::USAGE,
                    ApplicationError::FileNotFound(_) => crate::exitcode::NOINPUT,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                    _ => crate::exitcode::DATAERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_for_missing_library() {
        let err: CliError = ApplicationError::NotALibrary(PathBuf::from("/tmp")).into();
        assert_eq!(err.exit_code(), crate::exitcode::NOT_LIBRARY);
    }

    #[test]
    fn test_exit_code_for_log_file_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CliError = InfraError::io("open log file", io).into();
        assert_eq!(err.exit_code(), crate::exitcode::CANTCREAT);
    }

    #[test]
    fn test_exit_code_for_failed_operation() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "cwd removed");
        let err: CliError = ApplicationError::OperationFailed {
            context: "read current directory".to_string(),
            source: Box::new(io),
        }
        .into();
        assert_eq!(err.exit_code(), crate::exitcode::IOERR);
    }
}
