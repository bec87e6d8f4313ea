//! # Configuration Errors
//!
//! Defines [`ConfigError`], covering every way a configuration tree can fail
//! to load or bind. All of these are fatal during host construction.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in configuration file '{path}': {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration file '{path}' must contain a JSON object at its root")]
    InvalidRoot { path: PathBuf },

    #[error("Invalid command-line argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },

    #[error("Failed to bind configuration section '{section}': {message}")]
    Bind { section: String, message: String },
}

impl ConfigError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        ConfigError::Io {
            source,
            operation: operation.into(),
            path,
        }
    }
}
