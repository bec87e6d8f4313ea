use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::http::error::HttpError;
use crate::http::retry::RetryPolicy;

/// Key of the profile used when no name (or a blank name) is given.
pub const STANDARD_PROFILE: &str = "STANDARD";

/// How long a transport handler is reused before it is replaced.
pub const DEFAULT_HANDLER_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// Canonical profile key: trimmed and upper-cased, blank meaning [`STANDARD_PROFILE`].
pub fn normalize_profile_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_uppercase(),
        _ => STANDARD_PROFILE.to_string(),
    }
}

/// Configuration for one named HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientProfile {
    name: String,
    default_headers: HeaderMap,
    handler_lifetime: Duration,
    retry_policy: RetryPolicy,
    timeout: Option<Duration>,
}

impl HttpClientProfile {
    pub fn new(name: &str) -> Self {
        Self {
            name: normalize_profile_name(Some(name)),
            default_headers: HeaderMap::new(),
            handler_lifetime: DEFAULT_HANDLER_LIFETIME,
            retry_policy: RetryPolicy::default(),
            timeout: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Set (or replace) a default header from string parts.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<&mut Self, HttpError> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| HttpError::InvalidHeader {
            profile: self.name.clone(),
            name: name.to_string(),
            reason: err.to_string(),
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|err| HttpError::InvalidHeader {
            profile: self.name.clone(),
            name: name.to_string(),
            reason: err.to_string(),
        })?;
        self.default_headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn handler_lifetime(&self) -> Duration {
        self.handler_lifetime
    }

    pub fn set_handler_lifetime(&mut self, lifetime: Duration) -> &mut Self {
        self.handler_lifetime = lifetime;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn set_retry_policy(&mut self, policy: RetryPolicy) -> &mut Self {
        self.retry_policy = policy;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }
}
