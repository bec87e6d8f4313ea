//! # Named HTTP Clients
//!
//! A factory of named, resilient HTTP client profiles. Each profile carries
//! its default headers, a private cookie jar, a retry policy for transient
//! faults and a pooled transport handler that is recycled once its lifetime
//! expires.
//!
//! Profiles are registered on the [`ServiceCollection`] through
//! [`HttpClientServiceExt::add_http_client`]; the factory itself is a
//! singleton in the frozen registry.
pub mod client;
pub mod error;
pub mod factory;
pub mod profile;
pub mod retry;

pub use client::HttpClient;
pub use error::HttpError;
pub use factory::HttpClientFactory;
pub use profile::{normalize_profile_name, HttpClientProfile, DEFAULT_HANDLER_LIFETIME, STANDARD_PROFILE};
pub use retry::{RetryOutcome, RetryPolicy};

use crate::services::ServiceCollection;

/// Registration of named HTTP client profiles.
pub trait HttpClientServiceExt {
    /// Register (or amend) the profile `name`. The factory is added to the
    /// collection on first use.
    fn add_http_client<F>(&mut self, name: &str, configure: F) -> Result<&mut Self, HttpError>
    where
        F: FnOnce(&mut HttpClientProfile) -> Result<(), HttpError>;
}

impl HttpClientServiceExt for ServiceCollection {
    fn add_http_client<F>(&mut self, name: &str, configure: F) -> Result<&mut Self, HttpError>
    where
        F: FnOnce(&mut HttpClientProfile) -> Result<(), HttpError>,
    {
        if !self.contains::<HttpClientFactory>() {
            self.add_singleton(HttpClientFactory::new());
        }
        let factory = self
            .instance_mut::<HttpClientFactory>()
            .ok_or(HttpError::FactoryNotRegistered)?;
        factory.try_register(name, configure)?;
        Ok(self)
    }
}
