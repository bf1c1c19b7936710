//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{DownloadStream, HttpClient, RetryPolicy},
};
use futures_util::TryStreamExt;
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Reqwest-based HTTP client implementation
///
/// Provides HTTP operations with:
/// - Connection pooling via reqwest
/// - Automatic retry with exponential backoff until the body starts
/// - TLS support by default
/// - Async streaming
///
/// No overall request timeout is set: media downloads can legitimately take
/// minutes. Callers bound transfer time themselves.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_connect_timeout(Duration::from_secs(10))
    }

    /// Create a new HTTP client with a custom connect timeout
    pub fn with_connect_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .pool_max_idle_per_host(10)
            .user_agent(concat!("offline-lessons/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                BridgeError::OperationFailed(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Statuses worth another attempt
    fn is_retryable_status(status: u16) -> bool {
        status >= 500 || status == 429
    }

    fn into_download_stream(response: reqwest::Response) -> DownloadStream {
        let content_length = response.content_length();
        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let reader = tokio_util::io::StreamReader::new(stream);

        DownloadStream::new(content_length, Box::new(reader))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn download_stream(&self, url: &str) -> Result<DownloadStream> {
        self.download_stream_with_retry(url, RetryPolicy::default())
            .await
    }

    async fn download_stream_with_retry(
        &self,
        url: &str,
        policy: RetryPolicy,
    ) -> Result<DownloadStream> {
        let max_attempts = policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            debug!(
                attempt = attempt,
                max_attempts = max_attempts,
                "Opening download stream"
            );

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if response.status().is_success() {
                        return Ok(Self::into_download_stream(response));
                    }

                    let error = BridgeError::HttpStatus {
                        status,
                        message: response
                            .status()
                            .canonical_reason()
                            .unwrap_or("unknown status")
                            .to_string(),
                    };

                    if !Self::is_retryable_status(status) {
                        return Err(error);
                    }

                    warn!(
                        status = status,
                        attempt = attempt,
                        "Download request failed with retryable status"
                    );
                    last_error = Some(error);
                }
                Err(e) => {
                    // Signed URLs carry credentials in the query string
                    let e = e.without_url();
                    warn!(error = %e, attempt = attempt, "Download request failed");

                    last_error = Some(if e.is_timeout() {
                        BridgeError::OperationFailed("Request timed out".to_string())
                    } else if e.is_connect() {
                        BridgeError::OperationFailed(format!("Connection failed: {}", e))
                    } else {
                        BridgeError::OperationFailed(e.to_string())
                    });
                }
            }

            if attempt < max_attempts {
                let delay = policy.delay_for_attempt(attempt);
                debug!(delay_ms = delay.as_millis(), "Retrying after delay");
                sleep(delay).await;
            }
        }

        // All retries exhausted
        Err(last_error.unwrap_or_else(|| {
            BridgeError::OperationFailed("All retry attempts exhausted".to_string())
        }))
    }
}
