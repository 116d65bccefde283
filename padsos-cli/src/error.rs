//! CLI error handling with user-friendly messages.

use std::fmt;
use std::process;

use padsos::lifecycle::EngineError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Invalid demo arguments
    Args(String),
    /// An engine operation failed during the demo run
    Engine(EngineError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Args(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::Engine(e) => write!(f, "Engine operation failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Engine(e) => Some(e),
            CliError::Args(_) => None,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_args_error() {
        let err = CliError::Args("need at least one helper".to_string());
        assert!(err.to_string().contains("need at least one helper"));
    }

    #[test]
    fn test_from_engine_error() {
        let err: CliError = EngineError::AlreadyAccepted(padsos::store::RequestId::new(1)).into();
        assert!(matches!(err, CliError::Engine(_)));
    }
}
