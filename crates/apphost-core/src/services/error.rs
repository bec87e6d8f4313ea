//! # Service Registry Errors
//!
//! Defines [`ServiceError`], raised when a required capability is missing
//! from the frozen registry or a lazily constructed service fails to build.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Required service '{type_name}' is not registered")]
    NotRegistered { type_name: &'static str },

    #[error("Failed to construct service '{type_name}': {message}")]
    Construction {
        type_name: &'static str,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    #[error("Service registered for '{type_name}' has a different concrete type")]
    TypeMismatch { type_name: &'static str },

    #[error("Service '{type_name}' was requested by its own factory")]
    Reentered { type_name: &'static str },

    #[error("Service validation '{name}' failed: {source}")]
    ValidationFailed {
        name: String,
        #[source]
        source: Box<ServiceError>,
    },
}

impl ServiceError {
    pub fn construction<E>(type_name: &'static str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ServiceError::Construction {
            type_name,
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
