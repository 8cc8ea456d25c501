//! Error types for dsconsole_shell

use thiserror::Error;

use crate::runner::CommandError;

/// Errors that can occur while driving the server's admin tools
#[derive(Error, Debug)]
pub enum ShellError {
    /// The admin tool could not be run or reported a failure
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The admin tool printed something that is not the expected JSON
    #[error("Unexpected tool output: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value was rejected before any command ran
    #[error("Invalid input: {0}")]
    Invalid(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type for dsconsole_shell operations
pub type Result<T> = std::result::Result<T, ShellError>;
