//! HTTP client with built-in retry logic and error handling.

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK},
};
use serde::de::DeserializeOwned;
use std::io::Write;

use super::retry::{RetryPolicy, check_response, is_retryable};

const USER_AGENT: &str = "setup-cmake";
const GITHUB_JSON: &str = "application/vnd.github.v3+json";

/// A decoded JSON response together with its pagination `Link` header.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPage<T> {
    pub body: T,
    pub link: Option<String>,
}

/// HTTP client with built-in retry logic for network operations.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

/// Build an HTTP client for the GitHub API with an optional token.
///
/// The token is sent as `Authorization: token <value>` on every request.
/// An empty token is treated as no token.
pub fn build_http_client(token: Option<&str>) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));

    if let Some(token) = token.filter(|t| !t.is_empty()) {
        let mut auth_value = HeaderValue::from_str(&format!("token {}", token))
            .context("API token contains characters not allowed in a header")?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        debug!("HTTP client configured with authentication");
    }

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()?;

    Ok(HttpClient::new(client))
}

/// Build an HTTP client for release downloads, which need neither the API
/// media type nor the token.
pub fn build_download_client() -> Result<HttpClient> {
    let client = Client::builder().user_agent(USER_AGENT).build()?;
    Ok(HttpClient::new(client))
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[cfg(test)]
    fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and deserializes the JSON body, keeping the
    /// `Link` header if the server sent one.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<JsonPage<T>> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        self.with_retry("GET JSON", || async {
            let mut request = self.client.get(url);
            if !query.is_empty() {
                request = request.query(query);
            }

            let response = request
                .send()
                .await
                .context("Failed to send request")?;

            let response = check_response(response)?;

            let link = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            let body = response
                .json::<T>()
                .await
                .context("Failed to parse JSON response")?;

            Ok(JsonPage { body, link })
        })
        .await
    }

    /// Downloads a URL into the writer returned by `create_writer`.
    /// The writer is recreated for every attempt.
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(&self, url: &str, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
    {
        debug!("Downloading file from {}...", url);

        self.with_retry("Download", || self.download_file_once(url, &create_writer))
            .await
    }

    async fn download_file_once<W, F>(&self, url: &str, create_writer: &F) -> Result<u64>
    where
        W: Write,
        F: Fn() -> Result<W>,
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to start download request")?;

        let mut response = check_response(response)?;

        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer.flush().context("Failed to flush downloaded file")?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }

    async fn with_retry<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !is_retryable(&e) => {
                    debug!("{}: non-retryable error: {}", operation_name, e);
                    return Err(e);
                }
                Err(e) if attempt >= attempts => {
                    return Err(e.context(format!(
                        "{}: failed after {} attempts",
                        operation_name, attempts
                    )));
                }
                Err(e) => {
                    warn!(
                        "{}: attempt {}/{} failed ({}), retrying in {:?}...",
                        operation_name, attempt, attempts, e, self.retry.delay
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
