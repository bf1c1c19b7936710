//! # Cache Manager
//!
//! Facade over the [`CacheIndex`] and the [`TransferController`]. Hosts only
//! talk to this type.
//!
//! A download is `lookup → transfer → commit`. The transfer and the commit run
//! in a spawned task, so they finish even if the caller stops waiting. A second
//! caller for an id that is already downloading joins the running transfer:
//! its progress sink is attached and it receives the same outcome.

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::index::CacheIndex;
use crate::models::{validate_asset_id, AssetDescriptor, CacheRecord, DownloadProgress, ProgressSink};
use crate::transfer::{Transfer, TransferController, TransferReceipt};
use bridge_traits::{Clock, FileSystemAccess, HttpClient, SettingsStore};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, DownloadEvent, EventBus};
use core_runtime::logging::redact_url;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, instrument, warn};

type Outcome = Option<Result<PathBuf>>;

/// Download shared by every caller waiting on the same id.
struct InFlight {
    sinks: Arc<parking_lot::Mutex<Vec<ProgressSink>>>,
    outcome: watch::Receiver<Outcome>,
}

/// Offline cache manager for downloading and managing cached assets.
///
/// Cheap to clone; clones share the same index, transfers and in-flight table.
#[derive(Clone)]
pub struct CacheManager {
    config: Arc<CacheConfig>,
    index: Arc<CacheIndex>,
    controller: Arc<TransferController>,
    fs: Arc<dyn FileSystemAccess>,
    clock: Arc<dyn Clock>,
    event_bus: Option<Arc<EventBus>>,
    in_flight: Arc<Mutex<HashMap<String, InFlight>>>,
}

impl CacheManager {
    /// Create a new cache manager.
    ///
    /// # Arguments
    ///
    /// * `config` - Cache configuration
    /// * `settings_store` - Backend for the cache index
    /// * `fs` - Content store for downloaded files
    /// * `http_client` - Client used to stream assets
    /// * `clock` - Time source for `cached_at`
    ///
    /// [`initialize`](Self::initialize) must complete before the first download.
    pub fn new(
        config: CacheConfig,
        settings_store: Arc<dyn SettingsStore>,
        fs: Arc<dyn FileSystemAccess>,
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let index = CacheIndex::new(settings_store, Arc::clone(&fs), config.key_prefix.clone());
        let controller = TransferController::new(http_client, Arc::clone(&fs), config.clone());

        Self {
            config: Arc::new(config),
            index: Arc::new(index),
            controller: Arc::new(controller),
            fs,
            clock,
            event_bus: None,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Build a manager from a runtime configuration.
    ///
    /// The configuration must carry an HTTP client and a file system.
    pub fn from_core_config(config: &CoreConfig) -> Result<Self> {
        let http_client = config
            .http_client
            .clone()
            .ok_or_else(|| CacheError::Config("http_client is required".to_string()))?;
        let fs = config
            .file_system
            .clone()
            .ok_or_else(|| CacheError::Config("file_system is required".to_string()))?;

        Ok(Self::new(
            CacheConfig::from(&config.offline),
            Arc::clone(&config.settings_store),
            fs,
            http_client,
            Arc::clone(&config.clock),
        ))
    }

    /// Set event bus for lifecycle events.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Validate the configuration and create the cache directory.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        info!("Initializing offline cache manager");

        self.config
            .validate()
            .map_err(|e| CacheError::Config(format!("Invalid cache configuration: {}", e)))?;

        let data_dir = self.fs.get_data_directory().await.map_err(|e| {
            error!("Failed to get data directory: {}", e);
            CacheError::StorageUnavailable(format!("cannot resolve data directory: {}", e))
        })?;

        let cache_path = data_dir.join(&self.config.cache_directory);

        self.fs.create_dir_all(&cache_path).await.map_err(|e| {
            error!("Failed to create cache directory: {}", e);
            CacheError::StorageUnavailable(format!(
                "cannot create {}: {}",
                cache_path.display(),
                e
            ))
        })?;

        self.controller.set_base_dir(cache_path.clone());

        info!("Cache manager initialized at {:?}", cache_path);
        Ok(())
    }

    /// Directory cached files are written to, once initialized.
    pub fn cache_directory(&self) -> Option<PathBuf> {
        self.controller.base_dir()
    }

    /// Returns the cached record for `id`, if its file still exists.
    pub async fn get_cached_asset(&self, id: &str) -> Option<CacheRecord> {
        self.index.lookup(id).await
    }

    /// Returns every valid cached record. Order is unspecified.
    pub async fn list_cached_assets(&self) -> Vec<CacheRecord> {
        self.index.list_all().await
    }

    /// Check if an asset is cached and available offline.
    pub async fn is_cached(&self, id: &str) -> bool {
        self.index.lookup(id).await.is_some()
    }

    /// Make an asset available offline and return its local path.
    ///
    /// Returns the cached path without any transfer when a valid record
    /// exists. Otherwise starts a transfer, or joins the one already running
    /// for the same id, and commits a record once the file is complete.
    ///
    /// # Errors
    ///
    /// - `InvalidAssetId` before any I/O
    /// - `NotInitialized` if a transfer is needed before `initialize`
    /// - `TransferFailed` / `TransferCancelled` from the transfer
    /// - `PersistenceWriteFailed` if the record cannot be committed
    #[instrument(skip(self, descriptor, on_progress), fields(asset_id = %descriptor.id))]
    pub async fn download(
        &self,
        descriptor: &AssetDescriptor,
        on_progress: Option<ProgressSink>,
    ) -> Result<PathBuf> {
        descriptor.validate()?;

        if let Some(record) = self.index.lookup(&descriptor.id).await {
            debug!("Cache hit");
            return Ok(record.local_path);
        }

        let mut outcome = {
            let mut in_flight = self.in_flight.lock().await;

            if let Some(running) = in_flight.get(&descriptor.id) {
                if let Some(sink) = on_progress {
                    running.sinks.lock().push(sink);
                }
                info!("Joining in-flight download");
                self.emit(DownloadEvent::Joined {
                    asset_id: descriptor.id.clone(),
                });
                running.outcome.clone()
            } else {
                // Registration is synchronous; the lock is never held across I/O
                let transfer = self.controller.register(descriptor)?;
                let sinks = Arc::new(parking_lot::Mutex::new(
                    on_progress.into_iter().collect::<Vec<_>>(),
                ));
                let (tx, rx) = watch::channel(None);

                in_flight.insert(
                    descriptor.id.clone(),
                    InFlight {
                        sinks: Arc::clone(&sinks),
                        outcome: rx.clone(),
                    },
                );

                let manager = self.clone();
                let descriptor = descriptor.clone();
                tokio::spawn(async move {
                    manager.run_download(descriptor, transfer, sinks, tx).await;
                });

                rx
            }
        };

        let finished = outcome.wait_for(Option::is_some).await.map_err(|_| {
            CacheError::TransferFailed(format!(
                "{}: download task ended without a result",
                descriptor.id
            ))
        })?;

        match &*finished {
            Some(result) => result.clone(),
            None => Err(CacheError::TransferFailed(format!(
                "{}: download finished without a result",
                descriptor.id
            ))),
        }
    }

    /// Transfer, commit, then publish the outcome to every waiting caller.
    async fn run_download(
        self,
        descriptor: AssetDescriptor,
        transfer: Transfer,
        sinks: Arc<parking_lot::Mutex<Vec<ProgressSink>>>,
        tx: watch::Sender<Outcome>,
    ) {
        let id = descriptor.id.clone();

        // A transfer may have committed between the first lookup and registration
        let result = match self.index.lookup(&id).await {
            Some(record) => {
                if transfer.withdraw() {
                    debug!(asset_id = %id, "Cache hit after re-check");
                    Ok(record.local_path)
                } else {
                    Err(CacheError::TransferCancelled(id.clone()))
                }
            }
            None => self.transfer_and_commit(&descriptor, transfer, sinks).await,
        };

        match &result {
            Ok(_) => {}
            Err(e) if e.is_cancelled() => {
                self.emit(DownloadEvent::Cancelled {
                    asset_id: id.clone(),
                });
            }
            Err(e) => {
                self.emit(DownloadEvent::Failed {
                    asset_id: id.clone(),
                    message: e.to_string(),
                    recoverable: e.is_transient(),
                });
            }
        }

        // Removing the entry and publishing under the lock keeps a new
        // caller from joining a transfer that has already finished.
        let mut in_flight = self.in_flight.lock().await;
        in_flight.remove(&id);
        tx.send_replace(Some(result));
    }

    async fn transfer_and_commit(
        &self,
        descriptor: &AssetDescriptor,
        transfer: Transfer,
        sinks: Arc<parking_lot::Mutex<Vec<ProgressSink>>>,
    ) -> Result<PathBuf> {
        let id = &descriptor.id;

        info!(
            asset_id = %id,
            url = %redact_url(&descriptor.source_url),
            "Download started"
        );
        self.emit(DownloadEvent::Started {
            asset_id: id.clone(),
            source_url: redact_url(&descriptor.source_url),
        });

        let fanout = self.progress_fanout(id, sinks);
        let receipt = transfer.run(Some(fanout)).await?;
        self.commit(id, receipt).await
    }

    async fn commit(&self, id: &str, receipt: TransferReceipt) -> Result<PathBuf> {
        let record = CacheRecord::new(id, receipt.path.clone(), self.clock.now());

        if let Err(e) = self.index.commit(&record).await {
            warn!(asset_id = %id, error = %e, "Transfer finished but record was not committed");
            return Err(e);
        }

        info!(asset_id = %id, bytes = receipt.bytes, "Download cached");
        self.emit(DownloadEvent::Completed {
            asset_id: id.to_string(),
            local_path: receipt.path.display().to_string(),
            bytes: receipt.bytes,
        });

        Ok(receipt.path)
    }

    /// Progress sink forwarding to every attached caller and the event bus.
    fn progress_fanout(
        &self,
        id: &str,
        sinks: Arc<parking_lot::Mutex<Vec<ProgressSink>>>,
    ) -> ProgressSink {
        let manager = self.clone();
        let id = id.to_string();
        let last_percent = parking_lot::Mutex::new(None::<u8>);

        Arc::new(move |fraction| {
            let attached: Vec<ProgressSink> = sinks.lock().clone();
            for sink in &attached {
                sink(fraction);
            }

            if manager.event_bus.is_none() {
                return;
            }

            let percent = (fraction * 100.0).floor() as u8;
            {
                let mut last = last_percent.lock();
                if matches!(*last, Some(previous) if percent <= previous) {
                    return;
                }
                *last = Some(percent);
            }

            let (bytes_downloaded, total_bytes) = manager
                .controller
                .progress(&id)
                .map(|p| (p.downloaded_bytes, p.total_bytes))
                .unwrap_or((0, None));

            manager.emit(DownloadEvent::Progress {
                asset_id: id.clone(),
                percent,
                bytes_downloaded,
                total_bytes,
            });
        })
    }

    /// Delete a cached asset: its file first, then its record.
    ///
    /// No-op when nothing is cached for `id`. A file that is already gone is
    /// not an error.
    #[instrument(skip(self))]
    pub async fn delete_cached_asset(&self, id: &str) -> Result<()> {
        validate_asset_id(id)?;

        let Some(record) = self.index.lookup(id).await else {
            debug!("Nothing cached; delete is a no-op");
            return Ok(());
        };

        self.evict(&record).await
    }

    async fn evict(&self, record: &CacheRecord) -> Result<()> {
        match self.fs.delete_file(&record.local_path).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(path = ?record.local_path, "Cached file already gone");
            }
            Err(e) => {
                error!(path = ?record.local_path, error = %e, "Failed to delete cached file");
                return Err(CacheError::FileDeleteFailed(format!(
                    "{}: {}",
                    record.local_path.display(),
                    e
                )));
            }
        }

        self.index.remove(&record.id).await?;

        info!(asset_id = %record.id, "Deleted cached asset");
        self.emit(DownloadEvent::Deleted {
            asset_id: record.id.clone(),
        });
        Ok(())
    }

    /// Cancel the in-flight download for `id`.
    ///
    /// Returns `false` when nothing is downloading. Every caller waiting on the
    /// download receives `TransferCancelled`.
    #[instrument(skip(self))]
    pub fn cancel_download(&self, id: &str) -> bool {
        self.controller.cancel(id)
    }

    /// Get download progress for an asset (if currently downloading).
    pub fn get_download_progress(&self, id: &str) -> Option<DownloadProgress> {
        self.controller.progress(id)
    }

    /// Get all assets currently being downloaded.
    pub fn active_downloads(&self) -> Vec<DownloadProgress> {
        self.controller.active_transfers()
    }

    /// Sum of the sizes of every valid cached file, in bytes.
    #[instrument(skip(self))]
    pub async fn cache_size(&self) -> u64 {
        let mut total = 0;

        for record in self.index.list_all().await {
            match self.fs.metadata(&record.local_path).await {
                Ok(metadata) => total += metadata.size,
                Err(e) => {
                    warn!(asset_id = %record.id, error = %e, "Failed to read cached file size")
                }
            }
        }

        total
    }

    /// Clear all cached assets, returning how many were removed.
    #[instrument(skip(self))]
    pub async fn clear_cache(&self) -> Result<usize> {
        info!("Clearing all cached assets");

        let mut cleared = 0;
        for record in self.index.list_all().await {
            if let Err(e) = self.evict(&record).await {
                error!("Failed to clear asset {}: {}", record.id, e);
            } else {
                cleared += 1;
            }
        }

        info!("Cleared {} assets from cache", cleared);
        Ok(cleared)
    }

    fn emit(&self, event: DownloadEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Download(event)).ok();
        }
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("config", &self.config)
            .field("cache_directory", &self.controller.base_dir())
            .field("event_bus", &self.event_bus.is_some())
            .finish_non_exhaustive()
    }
}
