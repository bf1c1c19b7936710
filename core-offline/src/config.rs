//! Cache configuration

use bridge_traits::RetryPolicy;
use core_runtime::config::{
    OfflineSettings, DEFAULT_CACHE_DIRECTORY, DEFAULT_FILE_EXTENSION, DEFAULT_KEY_PREFIX,
};
use std::time::Duration;

/// Size of each read from the download stream.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Configuration for the cache manager.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory for cached files, relative to the app data directory
    pub cache_directory: String,

    /// Namespace for index keys in the settings store (default: "lesson:")
    pub key_prefix: String,

    /// Extension of cached files (default: "mp4")
    pub file_extension: String,

    /// Upper bound for one transfer; `None` waits for the transport
    pub download_timeout: Option<Duration>,

    /// Retry policy for opening the download stream
    pub retry_policy: RetryPolicy,

    /// Read buffer size while streaming
    pub chunk_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_directory: DEFAULT_CACHE_DIRECTORY.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            download_timeout: None,
            retry_policy: RetryPolicy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cache directory name.
    pub fn with_cache_directory(mut self, dir: impl Into<String>) -> Self {
        self.cache_directory = dir.into();
        self
    }

    /// Set index key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set cached file extension.
    pub fn with_file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    /// Set download timeout.
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = Some(timeout);
        self
    }

    /// Set retry policy for opening streams.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set read buffer size.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_directory.is_empty() {
            return Err("cache_directory cannot be empty".to_string());
        }

        if self.key_prefix.is_empty() {
            return Err("key_prefix cannot be empty".to_string());
        }

        if self.file_extension.is_empty() || self.file_extension.contains(['.', '/', '\\']) {
            return Err(format!(
                "file_extension '{}' must be a bare extension",
                self.file_extension
            ));
        }

        if matches!(self.download_timeout, Some(t) if t.is_zero()) {
            return Err("download_timeout must be greater than 0".to_string());
        }

        if self.retry_policy.max_attempts == 0 {
            return Err("retry_policy.max_attempts must be at least 1".to_string());
        }

        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl From<&OfflineSettings> for CacheConfig {
    fn from(settings: &OfflineSettings) -> Self {
        Self {
            cache_directory: settings.cache_directory.clone(),
            key_prefix: settings.key_prefix.clone(),
            file_extension: settings.file_extension.clone(),
            download_timeout: settings.download_timeout,
            retry_policy: settings.retry_policy.clone(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.cache_directory, "lessons");
        assert_eq!(config.key_prefix, "lesson:");
        assert_eq!(config.file_extension, "mp4");
        assert!(config.download_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::new()
            .with_cache_directory("videos")
            .with_key_prefix("video:")
            .with_file_extension("webm")
            .with_download_timeout(Duration::from_secs(60))
            .with_retry_policy(RetryPolicy::no_retry())
            .with_chunk_size(1024);

        assert_eq!(config.cache_directory, "videos");
        assert_eq!(config.key_prefix, "video:");
        assert_eq!(config.file_extension, "webm");
        assert_eq!(config.download_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.retry_policy.max_attempts, 1);
        assert_eq!(config.chunk_size, 1024);
    }

    #[test]
    fn test_config_validation() {
        assert!(CacheConfig::default()
            .with_cache_directory("")
            .validate()
            .is_err());
        assert!(CacheConfig::default().with_key_prefix("").validate().is_err());
        assert!(CacheConfig::default()
            .with_file_extension(".mp4")
            .validate()
            .is_err());
        assert!(CacheConfig::default()
            .with_download_timeout(Duration::ZERO)
            .validate()
            .is_err());
        assert!(CacheConfig::default().with_chunk_size(0).validate().is_err());
    }

    #[test]
    fn test_from_offline_settings() {
        let settings = OfflineSettings::default()
            .with_key_prefix("clip:")
            .with_download_timeout(Duration::from_secs(5));

        let config = CacheConfig::from(&settings);
        assert_eq!(config.key_prefix, "clip:");
        assert_eq!(config.download_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }
}
