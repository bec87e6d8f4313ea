//! # Apphost Kernel Errors
//!
//! Defines [`Error`], the top-level error of the host. Each subsystem keeps
//! its own typed error (`ConfigError`, `ServiceError`, `HttpError`,
//! `UiError`) which converts into [`Error`] through `#[from]`, while
//! [`Error::KernelLifecycleError`] records which lifecycle phase failed.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::error::ConfigError;
use crate::http::error::HttpError;
use crate::services::error::ServiceError;
use crate::ui_bridge::error::UiError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Service registry error: {0}")]
    Service(#[from] ServiceError),

    #[error("HTTP client error: {0}")]
    Http(#[from] HttpError),

    #[error("UI session error: {0}")]
    Ui(#[from] UiError),

    /// Error occurring during a specific lifecycle phase.
    #[error("Kernel lifecycle error during {phase:?}: {message}")]
    KernelLifecycleError {
        phase: KernelLifecyclePhase,
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// A phase of the host lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum KernelLifecyclePhase {
    #[error("Bootstrap")]
    Bootstrap,
    #[error("Start")]
    Start,
    #[error("Shutdown")]
    Shutdown,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl Error {
    pub fn lifecycle(phase: KernelLifecyclePhase, message: impl Into<String>) -> Self {
        Error::KernelLifecycleError {
            phase,
            message: message.into(),
            source: None,
        }
    }

    pub fn lifecycle_with(phase: KernelLifecyclePhase, message: impl Into<String>, source: impl Into<Error>) -> Self {
        Error::KernelLifecycleError {
            phase,
            message: message.into(),
            source: Some(Box::new(source.into())),
        }
    }

    /// The lifecycle phase this error was raised in, if it carries one.
    pub fn phase(&self) -> Option<KernelLifecyclePhase> {
        match self {
            Error::KernelLifecycleError { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
