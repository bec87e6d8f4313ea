//! Retry policy for outbound HTTP requests.
//!
//! A request is retried when its outcome is transient: a connection,
//! timeout or request-level failure, any 5xx, 408, and additionally 404 and
//! 429. Every other outcome is returned immediately. Once the retry budget
//! is spent the last outcome is returned to the caller as-is.
//!
//! The delay before retry `k` (1-based) is `2^k` seconds plus a uniformly
//! random jitter in `[0, 200ms)`, so concurrent callers that fail together
//! do not retry in lockstep.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;

// =============================================================================
// Retry Policy Constants
// =============================================================================

/// Retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base of the exponential backoff, in seconds.
pub const DEFAULT_BACKOFF_BASE_SECS: f64 = 2.0;

/// Exclusive upper bound of the jitter added to each delay.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(200);

/// Classifies the outcome of one attempt.
pub trait RetryOutcome {
    /// True if another attempt may succeed where this one failed.
    fn is_transient(&self) -> bool;
}

impl RetryOutcome for Result<reqwest::Response, reqwest::Error> {
    fn is_transient(&self) -> bool {
        match self {
            Ok(response) => is_retryable_status(response.status()),
            Err(err) => is_transient_error(err),
        }
    }
}

/// 5xx, 408, 404 and 429.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::NOT_FOUND
        || status == StatusCode::TOO_MANY_REQUESTS
}

/// Network-level failures, plus errors that carry a retryable status.
pub fn is_transient_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request() || err.status().is_some_and(is_retryable_status)
}

/// Stateless description of how to retry one logical request.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_base_secs: f64,
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    /// Exponential backoff (`2^k` seconds plus jitter) with `max_retries`
    /// retries after the initial attempt.
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff_base_secs: DEFAULT_BACKOFF_BASE_SECS,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::exponential(0)
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts including the initial one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Backoff without jitter before retry `retry` (1-based).
    pub fn base_delay(&self, retry: u32) -> Duration {
        Duration::from_secs_f64(self.backoff_base_secs.powi(retry as i32))
    }

    /// Backoff with jitter before retry `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay(retry) + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let bound = self.max_jitter.as_nanos() as u64;
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rand::thread_rng().gen_range(0..bound))
    }

    /// Run `operation` until it produces a non-transient outcome or the retry
    /// budget is spent. Attempts are strictly sequential; the argument passed
    /// to `operation` is the 0-based attempt index.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> T
    where
        T: RetryOutcome,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = T>,
    {
        let mut attempt = 0;
        loop {
            let outcome = operation(attempt).await;
            if attempt >= self.max_retries || !outcome.is_transient() {
                return outcome;
            }
            attempt += 1;
            let delay = self.delay_for(attempt);
            log::warn!(
                "Transient HTTP failure, retry {}/{} in {:.3}s",
                attempt,
                self.max_retries,
                delay.as_secs_f64()
            );
            tokio::time::sleep(delay).await;
        }
    }
}
