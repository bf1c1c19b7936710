//! # Core Configuration Module
//!
//! Provides configuration management for the offline lesson core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the bridges and settings the cache needs. It enforces
//! fail-fast validation so a missing capability is reported at startup rather
//! than on the first download.
//!
//! ## Required Dependencies
//!
//! - `SettingsStore` - Durable backend for the cache index
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - Streamed downloads (desktop default: reqwest)
//! - `FileSystemAccess` - Content store (desktop default: tokio fs)
//! - `Clock` - Timestamps for cache records (default: system clock)
//!
//! When the `desktop-shims` feature is enabled, a `SqliteSettingsStore` at
//! `<data_dir>/settings.db` is injected automatically if none is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, OfflineSettings};
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .data_dir("/path/to/app-data")
//!     .settings_store(Arc::new(MySettingsStore))
//!     .offline(OfflineSettings::default().with_download_timeout(Duration::from_secs(600)))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{Clock, FileSystemAccess, HttpClient, RetryPolicy, SettingsStore, SystemClock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Default directory, relative to the data directory, holding cached assets
pub const DEFAULT_CACHE_DIRECTORY: &str = "lessons";

/// Default namespace for cache index keys
pub const DEFAULT_KEY_PREFIX: &str = "lesson:";

/// Default extension appended to cached asset files
pub const DEFAULT_FILE_EXTENSION: &str = "mp4";

/// Settings for the offline cache.
#[derive(Debug, Clone)]
pub struct OfflineSettings {
    /// Directory name under the data directory for cached files
    pub cache_directory: String,
    /// Prefix for cache index keys in the settings store
    pub key_prefix: String,
    /// Extension of cached files (without the dot)
    pub file_extension: String,
    /// Upper bound for a single transfer; `None` waits indefinitely
    pub download_timeout: Option<Duration>,
    /// Retry policy used when opening the download stream
    pub retry_policy: RetryPolicy,
    /// Capacity of the event bus channel
    pub event_buffer_size: usize,
}

impl Default for OfflineSettings {
    fn default() -> Self {
        Self {
            cache_directory: DEFAULT_CACHE_DIRECTORY.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            download_timeout: None,
            retry_policy: RetryPolicy::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl OfflineSettings {
    pub fn with_cache_directory(mut self, directory: impl Into<String>) -> Self {
        self.cache_directory = directory.into();
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = Some(timeout);
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    /// Validates the settings.
    pub fn validate(&self) -> Result<()> {
        if self.cache_directory.trim().is_empty() {
            return Err(Error::Config(
                "Cache directory name cannot be empty".to_string(),
            ));
        }

        if Path::new(&self.cache_directory).is_absolute() || self.cache_directory.contains("..") {
            return Err(Error::Config(
                "Cache directory must be a relative path inside the data directory".to_string(),
            ));
        }

        if self.key_prefix.is_empty() {
            return Err(Error::Config(
                "Key prefix cannot be empty; cache records would collide with other settings"
                    .to_string(),
            ));
        }

        if self.file_extension.is_empty()
            || self.file_extension.starts_with('.')
            || self.file_extension.contains(['/', '\\'])
        {
            return Err(Error::Config(format!(
                "Invalid file extension '{}': expected a bare extension such as 'mp4'",
                self.file_extension
            )));
        }

        if matches!(self.download_timeout, Some(timeout) if timeout.is_zero()) {
            return Err(Error::Config(
                "Download timeout must be greater than zero".to_string(),
            ));
        }

        if self.retry_policy.max_attempts == 0 {
            return Err(Error::Config(
                "Retry policy must allow at least one attempt".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Core configuration for the offline lesson core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Application data directory (settings database lives here)
    pub data_dir: PathBuf,

    /// HTTP client for downloads (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// File system access abstraction (optional with desktop default)
    pub file_system: Option<Arc<dyn FileSystemAccess>>,

    /// Cache index backend (required)
    pub settings_store: Arc<dyn SettingsStore>,

    /// Time source for cache records
    pub clock: Arc<dyn Clock>,

    /// Offline cache settings
    pub offline: OfflineSettings,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("data_dir", &self.data_dir)
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "file_system",
                &self.file_system.as_ref().map(|_| "FileSystemAccess { ... }"),
            )
            .field("settings_store", &"SettingsStore { ... }")
            .field("offline", &self.offline)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::Config("Data directory cannot be empty".to_string()));
        }

        self.offline.validate()
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn settings_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SettingsStore".to_string(),
        message: "SettingsStore implementation is required for the cache index. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default SqliteSettingsStore. \
                 Mobile: inject platform-native settings (UserDefaults/DataStore)."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(data_dir: &Path) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let db_path = data_dir.join("settings.db");

    let init_store = |path: PathBuf| -> Result<SqliteSettingsStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create Tokio runtime for default settings store: {}",
                    e
                ))
            })?;

        Ok(runtime.block_on(SqliteSettingsStore::new(path))?)
    };

    // block_on panics inside a runtime, so build the store on a plain thread
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(db_path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default SettingsStore".to_string(),
                )
            })??,
        Err(_) => init_store(db_path)?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store(_data_dir: &Path) -> Result<Arc<dyn SettingsStore>> {
    Err(settings_store_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    data_dir: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    clock: Option<Arc<dyn Clock>>,
    offline: Option<OfflineSettings>,
}

impl CoreConfigBuilder {
    /// Sets the application data directory.
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Sets the HTTP client used for downloads.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the content store.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Sets the cache index backend.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Overrides the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the offline cache settings.
    pub fn offline(mut self, settings: OfflineSettings) -> Self {
        self.offline = Some(settings);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - `Config` when the data directory is missing or a setting is invalid
    /// - `CapabilityMissing` when no `SettingsStore` is available
    pub fn build(self) -> Result<CoreConfig> {
        let data_dir = self.data_dir.ok_or_else(|| {
            Error::Config("Data directory is required. Use .data_dir() to set it.".to_string())
        })?;

        let offline = self.offline.unwrap_or_default();
        offline.validate()?;

        let settings_store = match self.settings_store {
            Some(store) => store,
            None => provide_default_settings_store(&data_dir)?,
        };

        let config = CoreConfig {
            data_dir,
            http_client: self.http_client,
            file_system: self.file_system,
            settings_store,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            offline,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::BridgeError;

    struct MockSettingsStore;

    #[async_trait]
    impl SettingsStore for MockSettingsStore {
        async fn set_string(&self, _key: &str, _value: &str) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn get_string(&self, _key: &str) -> std::result::Result<Option<String>, BridgeError> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn has_key(&self, _key: &str) -> std::result::Result<bool, BridgeError> {
            Ok(false)
        }

        async fn list_keys(&self) -> std::result::Result<Vec<String>, BridgeError> {
            Ok(vec![])
        }

        async fn clear_all(&self) -> std::result::Result<(), BridgeError> {
            Ok(())
        }
    }

    fn builder_with_store() -> CoreConfigBuilder {
        CoreConfig::builder()
            .data_dir("/tmp/offline-lessons")
            .settings_store(Arc::new(MockSettingsStore))
    }

    #[test]
    fn test_builder_with_required_fields() {
        let config = builder_with_store().build().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/offline-lessons"));
        assert!(config.http_client.is_none());
        assert!(config.file_system.is_none());
        assert_eq!(config.offline.cache_directory, DEFAULT_CACHE_DIRECTORY);
        assert_eq!(config.offline.key_prefix, DEFAULT_KEY_PREFIX);
        assert_eq!(config.offline.file_extension, DEFAULT_FILE_EXTENSION);
        assert!(config.offline.download_timeout.is_none());
    }

    #[test]
    fn test_builder_requires_data_dir() {
        let result = CoreConfig::builder()
            .settings_store(Arc::new(MockSettingsStore))
            .build();

        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("data_dir")),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_settings_store() {
        let result = CoreConfig::builder().data_dir("/tmp/x").build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "SettingsStore")
            }
            other => panic!("expected capability error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_offline_settings_builder() {
        let settings = OfflineSettings::default()
            .with_cache_directory("videos")
            .with_key_prefix("video:")
            .with_file_extension("webm")
            .with_download_timeout(Duration::from_secs(30))
            .with_retry_policy(RetryPolicy::no_retry())
            .with_event_buffer_size(16);

        assert!(settings.validate().is_ok());
        assert_eq!(settings.cache_directory, "videos");
        assert_eq!(settings.key_prefix, "video:");
        assert_eq!(settings.file_extension, "webm");
        assert_eq!(settings.download_timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.retry_policy.max_attempts, 1);
        assert_eq!(settings.event_buffer_size, 16);
    }

    #[test]
    fn test_validate_rejects_bad_offline_settings() {
        let cases = vec![
            OfflineSettings::default().with_cache_directory(""),
            OfflineSettings::default().with_cache_directory("../outside"),
            OfflineSettings::default().with_key_prefix(""),
            OfflineSettings::default().with_file_extension(".mp4"),
            OfflineSettings::default().with_file_extension(""),
            OfflineSettings::default().with_download_timeout(Duration::ZERO),
            OfflineSettings::default().with_event_buffer_size(0),
        ];

        for settings in cases {
            let result = builder_with_store().offline(settings.clone()).build();
            assert!(
                matches!(result, Err(Error::Config(_))),
                "expected rejection for {:?}",
                settings
            );
        }
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = builder_with_store().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("SettingsStore { ... }"));
        assert!(debug.contains("offline-lessons"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_settings_store() {
        let base = std::env::temp_dir().join(format!("core-runtime-test-{}", uuid::Uuid::new_v4()));

        let config = CoreConfig::builder()
            .data_dir(&base)
            .build()
            .expect("desktop defaults should succeed");

        assert!(base.join("settings.db").exists());

        drop(config);
        let _ = std::fs::remove_dir_all(&base);
    }
}
