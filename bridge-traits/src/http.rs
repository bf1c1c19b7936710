//! HTTP Client Abstraction
//!
//! Provides streamed downloads with retry and TLS support.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Whether to use exponential backoff
    pub use_exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            use_exponential_backoff: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that performs a single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if !self.use_exponential_backoff {
            return self.base_delay;
        }

        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// An open response body being streamed from a remote resource.
pub struct DownloadStream {
    /// Total body size announced by the server, if any
    pub content_length: Option<u64>,
    /// Body bytes
    pub reader: Box<dyn tokio::io::AsyncRead + Send + Unpin>,
}

impl DownloadStream {
    pub fn new(
        content_length: Option<u64>,
        reader: Box<dyn tokio::io::AsyncRead + Send + Unpin>,
    ) -> Self {
        Self {
            content_length,
            reader,
        }
    }
}

impl fmt::Debug for DownloadStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadStream")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Async HTTP client trait
///
/// This trait abstracts HTTP transfers to allow platform-specific implementations.
/// Implementations should handle:
/// - Automatic retry with exponential backoff before the body starts
/// - TLS certificate validation
/// - Connection pooling and keep-alive
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::HttpClient;
/// use tokio::io::AsyncReadExt;
///
/// async fn fetch(client: &dyn HttpClient) -> Result<Vec<u8>> {
///     let mut stream = client.download_stream("https://cdn.example.com/a.mp4").await?;
///     let mut body = Vec::new();
///     stream.reader.read_to_end(&mut body).await?;
///     Ok(body)
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Start a GET request and return the response body as a byte stream.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network connection fails
    /// - The server answers with a non-success status
    /// - Maximum retries exceeded
    async fn download_stream(&self, url: &str) -> Result<DownloadStream>;

    /// Same as [`download_stream`](HttpClient::download_stream) with a custom
    /// retry policy for establishing the response.
    async fn download_stream_with_retry(
        &self,
        url: &str,
        policy: RetryPolicy,
    ) -> Result<DownloadStream> {
        // Implementations can override for custom retry logic
        let _ = policy;
        self.download_stream(url).await
    }
}
