//! Retry policy and HTTP failure classification.
//!
//! Client errors (bad token, rate limit, missing resource) are reported
//! immediately; server errors and connection failures are retried.

use reqwest::{Response, StatusCode};
use std::time::Duration;

/// Maximum number of attempts for a single request.
pub const MAX_RETRIES: usize = 3;

/// Delay between attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Errors that should not be retried.
#[derive(Debug, PartialEq)]
pub enum NonRetryableError {
    /// HTTP 401
    AuthenticationFailed(String),
    /// HTTP 429, or 403 with an exhausted rate-limit budget
    RateLimitExceeded(String),
    /// HTTP 403 for any other reason
    Forbidden(String),
    /// HTTP 404
    NotFound(String),
    /// Remaining 4xx statuses
    ClientError(String),
}

impl std::fmt::Display for NonRetryableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonRetryableError::AuthenticationFailed(url) => write!(
                f,
                "Authentication failed for {}. Check the value passed with --github-api-token or GITHUB_TOKEN.",
                url
            ),
            NonRetryableError::RateLimitExceeded(url) => write!(
                f,
                "GitHub API rate limit exceeded for {}. Try again later or provide --github-api-token.",
                url
            ),
            NonRetryableError::Forbidden(url) => write!(f, "Access forbidden: {}", url),
            NonRetryableError::NotFound(url) => write!(f, "Not found: {}", url),
            NonRetryableError::ClientError(msg) => write!(f, "Request error: {}", msg),
        }
    }
}

impl std::error::Error for NonRetryableError {}

/// Classify a non-success status. `None` means the failure is worth retrying.
pub fn classify_status(
    status: StatusCode,
    rate_limit_remaining: Option<&str>,
    url: &str,
) -> Option<NonRetryableError> {
    match status {
        StatusCode::UNAUTHORIZED => Some(NonRetryableError::AuthenticationFailed(url.to_string())),
        StatusCode::TOO_MANY_REQUESTS => {
            Some(NonRetryableError::RateLimitExceeded(url.to_string()))
        }
        StatusCode::FORBIDDEN if rate_limit_remaining == Some("0") => {
            Some(NonRetryableError::RateLimitExceeded(url.to_string()))
        }
        StatusCode::FORBIDDEN => Some(NonRetryableError::Forbidden(url.to_string())),
        StatusCode::NOT_FOUND => Some(NonRetryableError::NotFound(url.to_string())),
        s if s.is_client_error() => Some(NonRetryableError::ClientError(format!(
            "HTTP {} from {}",
            s.as_u16(),
            url
        ))),
        _ => None,
    }
}

/// Pass successful responses through; turn failures into classified errors.
pub fn check_response(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let remaining = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok());

    match classify_status(status, remaining, &url) {
        Some(non_retryable) => Err(anyhow::Error::from(non_retryable)),
        None => Err(anyhow::anyhow!("HTTP {} from {}", status.as_u16(), url)),
    }
}

/// Anything not explicitly classified as non-retryable is retried.
pub fn is_retryable(e: &anyhow::Error) -> bool {
    e.downcast_ref::<NonRetryableError>().is_none()
}
