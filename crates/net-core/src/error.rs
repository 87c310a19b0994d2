//! Error types for network operations

use thiserror::Error;

/// Main error type for the network helper
#[derive(Debug, Error)]
pub enum NetError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("System error: {0}")]
    System(#[from] SystemError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Request validation errors
///
/// These are fatal to the invocation: the CLI exits non-zero and nothing
/// is applied.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// System command and file operation errors
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Command execution failed: {command}")]
    CommandFailed { command: String },

    #[error("Command timed out: {command}")]
    CommandTimeout { command: String },

    #[error("Log write failed: {path}")]
    LogWrite { path: String },
}

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Configuration write failed: {path}")]
    Write { path: String },
}
