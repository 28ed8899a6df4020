//! HTTP client module with retry logic and error handling.

mod client;
mod retry;

pub use client::{HttpClient, JsonPage, build_download_client, build_http_client};
pub use retry::{MAX_RETRIES, NonRetryableError, RETRY_DELAY_MS, RetryPolicy, classify_status};
