//! Best-effort local retry for opening a reply stream.
//!
//! Retries only ever happen before the first response byte is consumed; an
//! open stream that fails mid-way is surfaced to the caller as-is.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

/// Retry attempts after the initial request.
pub const MAX_RETRIES: u32 = 3;
/// Delay before the first retry; doubles on each following attempt.
pub const BASE_DELAY: Duration = Duration::from_millis(1000);

/// Retry budget and backoff for one outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy that sends exactly once.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Exponential backoff for the zero-based retry `attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.base_delay.saturating_mul(factor)
    }

    #[must_use]
    pub fn has_budget(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

fn transient_error_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(
            r"(?i)rate.?limit|too many requests|overloaded|service.?unavailable|upstream.?connect|connection.?(refused|reset)",
        )
        .expect("retry regex must compile")
    })
}

/// Whether a non-success response looks transient.
pub fn is_retryable_http_error(status: u16, error_text: &str) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
        || transient_error_regex().is_match(error_text)
}

/// Whether a transport failure (no HTTP status at all) is worth retrying.
///
/// Only connection setup and timeouts qualify; a request that reached the
/// server and then broke is reported as-is.
pub fn is_retryable_transport_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout()
}
