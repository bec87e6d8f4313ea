//! # HTTP Client Factory Errors
//!
//! Defines [`HttpError`]. These are configuration and wiring failures of the
//! factory itself; faults from an actual request are returned to the caller
//! as the untouched `reqwest::Error`.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP client profile '{name}' is not registered (known profiles: {known:?})")]
    UnknownProfile { name: String, known: Vec<String> },

    #[error("Failed to build transport handler for profile '{profile}': {source}")]
    ClientBuild {
        profile: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid default header '{name}' for profile '{profile}': {reason}")]
    InvalidHeader {
        profile: String,
        name: String,
        reason: String,
    },

    #[error("HTTP client factory is not registered with the service registry")]
    FactoryNotRegistered,
}
