//! # UI Session Errors
//!
//! Defines [`UiError`], covering failures of the UI root and of the
//! dedicated thread that hosts it. Every variant is fatal to the hosted unit.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UiError {
    #[error("UI root '{root}' failed during '{stage}': {source}")]
    RootFailed {
        root: String,
        stage: String, // "create", "initialize" or "run"
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("UI root '{root}' failed during '{stage}': {message}")]
    RootFailedWithMessage {
        root: String,
        stage: String,
        message: String,
    },

    #[error("UI session panicked: {0}")]
    SessionPanicked(String),

    #[error("Failed to spawn the UI session thread: {source}")]
    ThreadSpawn {
        #[source]
        source: std::io::Error,
    },

    #[error("UI session thread exited without reporting a result")]
    SessionLost,

    #[error("A UI session is already running")]
    AlreadyRunning,
}

impl UiError {
    pub fn root_failed<E>(root: impl Into<String>, stage: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        UiError::RootFailed {
            root: root.into(),
            stage: stage.into(),
            source: Box::new(err),
        }
    }

    pub fn message(root: impl Into<String>, stage: impl Into<String>, message: impl Into<String>) -> Self {
        UiError::RootFailedWithMessage {
            root: root.into(),
            stage: stage.into(),
            message: message.into(),
        }
    }
}
