//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, filesystem,
//! settings, clock) into the offline lesson cache. Desktop apps typically
//! enable the `desktop-shims` feature (which depends on `bridge-desktop`) and
//! call [`bootstrap_desktop`]; mobile hosts build a [`CoreConfig`] with their
//! own bridges and call [`CoreService::new`].

pub mod error;

pub use error::{CoreError, Result};

pub use core_offline::{AssetDescriptor, CacheError, CacheManager, CacheRecord, DownloadProgress};
pub use core_runtime::config::{CoreConfig, OfflineSettings};
pub use core_runtime::events::{CoreEvent, DownloadEvent, EventBus, EventStream};

use bridge_traits::{FileSystemAccess, HttpClient};
use core_offline::CacheConfig;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    cache: CacheManager,
    event_bus: Arc<EventBus>,
}

impl CoreService {
    /// Build the cache manager from `config` and initialize it.
    ///
    /// Missing HTTP or filesystem bridges fall back to the desktop adapters
    /// when `desktop-shims` is enabled.
    ///
    /// # Errors
    ///
    /// - `CapabilityMissing` if a bridge is absent and no default exists
    /// - `Cache` if the cache directory cannot be created
    #[instrument(skip(config), fields(data_dir = ?config.data_dir))]
    pub async fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let http_client = match config.http_client.clone() {
            Some(client) => client,
            None => default_http_client()?,
        };
        let file_system = match config.file_system.clone() {
            Some(fs) => fs,
            None => default_file_system(&config.data_dir)?,
        };

        let event_bus = Arc::new(EventBus::new(config.offline.event_buffer_size));

        let cache = CacheManager::new(
            CacheConfig::from(&config.offline),
            Arc::clone(&config.settings_store),
            file_system,
            http_client,
            Arc::clone(&config.clock),
        )
        .with_event_bus(Arc::clone(&event_bus));

        cache.initialize().await?;

        info!("Core service ready");
        Ok(Self { cache, event_bus })
    }

    /// The offline cache.
    pub fn cache_manager(&self) -> &CacheManager {
        &self.cache
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    /// Subscribe to download lifecycle events.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("cache", &self.cache)
            .field("subscribers", &self.event_bus.subscriber_count())
            .finish()
    }
}

#[cfg(feature = "desktop-shims")]
fn default_http_client() -> Result<Arc<dyn HttpClient>> {
    let client = bridge_desktop::ReqwestHttpClient::new()?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(CoreError::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "An HttpClient implementation is required to download assets. \
                 Desktop: enable the 'desktop-shims' feature. \
                 Mobile: inject a platform-native client (URLSession/OkHttp)."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn default_file_system(data_dir: &Path) -> Result<Arc<dyn FileSystemAccess>> {
    Ok(Arc::new(bridge_desktop::TokioFileSystem::with_data_directory(
        data_dir.to_path_buf(),
    )))
}

#[cfg(not(feature = "desktop-shims"))]
fn default_file_system(_data_dir: &Path) -> Result<Arc<dyn FileSystemAccess>> {
    Err(CoreError::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "A FileSystemAccess implementation is required to store cached assets. \
                 Desktop: enable the 'desktop-shims' feature. \
                 Mobile: inject the app sandbox file system."
            .to_string(),
    })
}

/// Convenience bootstrapper for desktop hosts.
///
/// Everything lives under `data_dir`: the settings database at
/// `settings.db` and cached files under the configured cache directory.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// use core_service::{bootstrap_desktop, AssetDescriptor};
///
/// let core = bootstrap_desktop("/tmp/offline-lessons").await?;
/// let lesson = AssetDescriptor::new("lesson-1", "https://cdn.example.com/lesson-1.mp4");
/// let path = core.cache_manager().download(&lesson, None).await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(data_dir: impl Into<std::path::PathBuf>) -> Result<CoreService> {
    use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore, TokioFileSystem};

    let data_dir = data_dir.into();

    let settings = SqliteSettingsStore::new(data_dir.join("settings.db"))
        .await
        .map_err(|e| CoreError::InitializationFailed(format!("settings store: {}", e)))?;

    let config = CoreConfig::builder()
        .data_dir(data_dir.clone())
        .settings_store(Arc::new(settings))
        .file_system(Arc::new(TokioFileSystem::with_data_directory(data_dir)))
        .http_client(Arc::new(ReqwestHttpClient::new()?))
        .build()?;

    CoreService::new(config).await
}
