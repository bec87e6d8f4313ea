use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;
use reqwest::{Client, IntoUrl, Method, Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::http::retry::RetryPolicy;

/// A ready-to-use client bound to one profile.
///
/// Cheap to clone. It keeps the transport handler that was current when it
/// was created, so a handler recycled by the factory afterwards does not
/// affect requests made through this client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    profile: Arc<str>,
    inner: Client,
    default_headers: HeaderMap,
    retry: RetryPolicy,
    cookies: Arc<Jar>,
    generation: u64,
}

impl HttpClient {
    pub(crate) fn new(
        profile: &str,
        inner: Client,
        default_headers: HeaderMap,
        retry: RetryPolicy,
        cookies: Arc<Jar>,
        generation: u64,
    ) -> Self {
        Self {
            profile: Arc::from(profile),
            inner,
            default_headers,
            retry,
            cookies,
            generation,
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Headers the transport adds to every request that does not set them itself.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Cookie store of the transport handler this client uses.
    pub fn cookie_store(&self) -> &Arc<Jar> {
        &self.cookies
    }

    /// Identifies the transport handler; changes when the factory recycles it.
    pub fn handler_generation(&self) -> u64 {
        self.generation
    }

    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.inner.request(method, url)
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.inner.get(url)
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.inner.post(url)
    }

    /// Build and execute a request under the retry policy.
    pub async fn send(&self, builder: RequestBuilder) -> reqwest::Result<Response> {
        self.execute(builder.build()?).await
    }

    /// Execute a request under the retry policy.
    ///
    /// Bodies that cannot be replayed (streams) get a single attempt.
    pub async fn execute(&self, request: Request) -> reqwest::Result<Response> {
        if request.try_clone().is_none() {
            log::debug!(
                "Request to {} on profile {} has a streaming body, sending without retries",
                request.url(),
                self.profile
            );
            return self.inner.execute(request).await;
        }
        self.retry
            .execute(|_| {
                let attempt = request
                    .try_clone()
                    .expect("a request that cloned once clones on every attempt");
                self.inner.execute(attempt)
            })
            .await
    }

    /// GET `url`, require a success status and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned, U: IntoUrl>(&self, url: U) -> reqwest::Result<T> {
        self.send(self.get(url)).await?.error_for_status()?.json().await
    }
}
