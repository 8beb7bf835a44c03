// src/error.rs
//! Error types for the route recorder

use crate::recording::{validation::ValidationError, RecordingState};
use std::fmt;

pub type Result<T> = std::result::Result<T, RecorderError>;

#[derive(Debug)]
pub enum RecorderError {
    /// Operation called from a state that forbids it
    IllegalTransition {
        operation: &'static str,
        state: RecordingState,
    },
    /// Route rejected by the save-time checks
    Validation(ValidationError),
    /// Route service could not be reached
    Network(String),
    /// Route service answered with a non-success status
    Server { status: u16, message: String },
    Io(std::io::Error),
    Serial(tokio_serial::Error),
    Connection(String),
    Parse(String),
    Config(String),
    Other(String),
}

impl RecorderError {
    /// Transient failures worth retrying unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, RecorderError::Network(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RecorderError::Validation(_))
    }

    /// The validation reason, if this is a validation failure
    pub fn validation_reason(&self) -> Option<&ValidationError> {
        match self {
            RecorderError::Validation(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for RecorderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecorderError::IllegalTransition { operation, state } => {
                write!(f, "Cannot {} while {}", operation, state)
            }
            RecorderError::Validation(reason) => write!(f, "Validation failed: {}", reason),
            RecorderError::Network(msg) => write!(f, "Server unreachable: {}", msg),
            RecorderError::Server { status, message } => {
                write!(f, "Server rejected request ({}): {}", status, message)
            }
            RecorderError::Io(e) => write!(f, "IO error: {}", e),
            RecorderError::Serial(e) => write!(f, "Serial error: {}", e),
            RecorderError::Connection(msg) => write!(f, "Connection error: {}", msg),
            RecorderError::Parse(msg) => write!(f, "Parse error: {}", msg),
            RecorderError::Config(msg) => write!(f, "Config error: {}", msg),
            RecorderError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for RecorderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecorderError::Validation(e) => Some(e),
            RecorderError::Io(e) => Some(e),
            RecorderError::Serial(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for RecorderError {
    fn from(error: ValidationError) -> Self {
        RecorderError::Validation(error)
    }
}

impl From<std::io::Error> for RecorderError {
    fn from(error: std::io::Error) -> Self {
        RecorderError::Io(error)
    }
}

impl From<tokio_serial::Error> for RecorderError {
    fn from(error: tokio_serial::Error) -> Self {
        RecorderError::Serial(error)
    }
}

impl From<reqwest::Error> for RecorderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            RecorderError::Config(format!("Invalid request: {}", error))
        } else {
            // connect, timeout, and dropped-connection failures
            RecorderError::Network(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_errors_are_retryable() {
        assert!(RecorderError::Network("refused".to_string()).is_retryable());
        assert!(!RecorderError::Server {
            status: 422,
            message: "bad".to_string()
        }
        .is_retryable());
        assert!(!RecorderError::Validation(ValidationError::NameRequired).is_retryable());
    }

    #[test]
    fn test_illegal_transition_message() {
        let err = RecorderError::IllegalTransition {
            operation: "pause",
            state: RecordingState::Idle,
        };
        assert_eq!(err.to_string(), "Cannot pause while idle");
    }

    #[test]
    fn test_validation_reason_accessor() {
        let err: RecorderError = ValidationError::NameRequired.into();
        assert!(err.is_validation());
        assert_eq!(err.validation_reason(), Some(&ValidationError::NameRequired));
    }
}
