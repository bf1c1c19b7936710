//! # Transfer Controller
//!
//! Streams one remote asset to its deterministic target path
//! (`<base_dir>/<id>.<extension>`) while tracking the in-flight handle.
//!
//! Registration is synchronous and happens before the first byte, so
//! [`TransferController::cancel`] is valid as soon as [`TransferController::register`]
//! returns. The controller never touches the cache index.

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::models::{AssetDescriptor, DownloadProgress, ProgressSink};
use bridge_traits::{DownloadStream, FileSystemAccess, HttpClient};
use core_runtime::logging::redact_url;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

type ActiveTable = Arc<Mutex<HashMap<String, ActiveTransfer>>>;

/// In-flight handle owned by the controller.
struct ActiveTransfer {
    generation: u64,
    token: CancellationToken,
    progress: Arc<Mutex<DownloadProgress>>,
}

/// Result of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Owns the table of in-flight transfers.
pub struct TransferController {
    http: Arc<dyn HttpClient>,
    fs: Arc<dyn FileSystemAccess>,
    config: CacheConfig,
    base_dir: RwLock<Option<PathBuf>>,
    active: ActiveTable,
    next_generation: AtomicU64,
    transfers_started: Arc<AtomicU64>,
}

impl TransferController {
    pub fn new(http: Arc<dyn HttpClient>, fs: Arc<dyn FileSystemAccess>, config: CacheConfig) -> Self {
        Self {
            http,
            fs,
            config,
            base_dir: RwLock::new(None),
            active: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(1),
            transfers_started: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Sets the directory transfers write into.
    pub fn set_base_dir(&self, dir: PathBuf) {
        *self.base_dir.write() = Some(dir);
    }

    pub fn base_dir(&self) -> Option<PathBuf> {
        self.base_dir.read().clone()
    }

    /// Deterministic target path for an asset id.
    pub fn target_path(&self, id: &str) -> Result<PathBuf> {
        let base = self.base_dir().ok_or(CacheError::NotInitialized)?;
        Ok(base.join(format!("{}.{}", id, self.config.file_extension)))
    }

    /// Registers an in-flight handle for `descriptor` without starting I/O.
    ///
    /// # Errors
    ///
    /// - `InvalidAssetId` if the id cannot name a file
    /// - `NotInitialized` if no base directory is set
    /// - `TransferInProgress` if the id already has a handle
    pub fn register(&self, descriptor: &AssetDescriptor) -> Result<Transfer> {
        descriptor.validate()?;
        let target = self.target_path(&descriptor.id)?;

        let token = CancellationToken::new();
        let progress = Arc::new(Mutex::new(DownloadProgress::new(descriptor.id.clone())));
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        {
            let mut active = self.active.lock();
            if active.contains_key(&descriptor.id) {
                return Err(CacheError::TransferInProgress(descriptor.id.clone()));
            }
            active.insert(
                descriptor.id.clone(),
                ActiveTransfer {
                    generation,
                    token: token.clone(),
                    progress: Arc::clone(&progress),
                },
            );
        }

        debug!(asset_id = %descriptor.id, generation, "Registered transfer");

        Ok(Transfer {
            descriptor: descriptor.clone(),
            target,
            token,
            progress,
            http: Arc::clone(&self.http),
            fs: Arc::clone(&self.fs),
            config: self.config.clone(),
            transfers_started: Arc::clone(&self.transfers_started),
            registration: Registration {
                active: Arc::clone(&self.active),
                id: descriptor.id.clone(),
                generation,
            },
        })
    }

    /// Registers and runs a transfer, returning the written path.
    pub async fn start(
        &self,
        descriptor: &AssetDescriptor,
        on_progress: Option<ProgressSink>,
    ) -> Result<PathBuf> {
        let transfer = self.register(descriptor)?;
        transfer.run(on_progress).await.map(|receipt| receipt.path)
    }

    /// Cancels and deregisters the handle for `id`.
    ///
    /// Returns `false` when nothing is in flight for `id`.
    pub fn cancel(&self, id: &str) -> bool {
        let removed = self.active.lock().remove(id);
        match removed {
            Some(transfer) => {
                transfer.token.cancel();
                info!(asset_id = %id, "Transfer cancelled");
                true
            }
            None => {
                debug!(asset_id = %id, "Cancel ignored; no transfer in flight");
                false
            }
        }
    }

    /// Snapshot of the progress of an in-flight transfer.
    pub fn progress(&self, id: &str) -> Option<DownloadProgress> {
        let active = self.active.lock();
        active.get(id).map(|t| t.progress.lock().clone())
    }

    /// Snapshots of every in-flight transfer.
    pub fn active_transfers(&self) -> Vec<DownloadProgress> {
        let active = self.active.lock();
        active.values().map(|t| t.progress.lock().clone()).collect()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.lock().contains_key(id)
    }

    /// Number of transfers that have begun streaming since construction.
    pub fn transfers_started(&self) -> u64 {
        self.transfers_started.load(Ordering::SeqCst)
    }
}

/// Removes the handle when the transfer finishes or is dropped.
///
/// Only removes its own generation so a cancelled transfer cannot evict a
/// newer registration for the same id.
struct Registration {
    active: ActiveTable,
    id: String,
    generation: u64,
}

impl Registration {
    /// Removes this registration's handle.
    ///
    /// Returns `false` when `cancel` or a newer registration already took
    /// the slot.
    fn release(&self) -> bool {
        let mut active = self.active.lock();
        if active.get(&self.id).map(|t| t.generation) == Some(self.generation) {
            active.remove(&self.id);
            true
        } else {
            false
        }
    }

    fn is_superseded(&self) -> bool {
        self.active
            .lock()
            .get(&self.id)
            .is_some_and(|t| t.generation != self.generation)
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.release();
    }
}

/// A registered transfer, ready to run.
///
/// Dropping it without calling [`Transfer::run`] deregisters the handle.
pub struct Transfer {
    descriptor: AssetDescriptor,
    target: PathBuf,
    token: CancellationToken,
    progress: Arc<Mutex<DownloadProgress>>,
    http: Arc<dyn HttpClient>,
    fs: Arc<dyn FileSystemAccess>,
    config: CacheConfig,
    transfers_started: Arc<AtomicU64>,
    registration: Registration,
}

impl std::fmt::Debug for Transfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transfer")
            .field("asset_id", &self.descriptor.id)
            .field("target", &self.target)
            .field("generation", &self.registration.generation)
            .finish()
    }
}

impl Transfer {
    pub fn asset_id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Deregisters without running.
    ///
    /// Returns `false` if the transfer was cancelled first.
    pub fn withdraw(&self) -> bool {
        self.registration.release()
    }

    /// Streams the asset to its target path.
    ///
    /// On failure or cancellation the partial file is removed (best-effort)
    /// before the handle is released.
    #[instrument(skip(self, on_progress), fields(asset_id = %self.descriptor.id))]
    pub async fn run(self, on_progress: Option<ProgressSink>) -> Result<TransferReceipt> {
        self.transfers_started.fetch_add(1, Ordering::SeqCst);
        info!(
            url = %redact_url(&self.descriptor.source_url),
            "Starting transfer"
        );

        let outcome = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                Err(CacheError::TransferCancelled(self.descriptor.id.clone()))
            }
            result = self.stream_with_timeout(on_progress.as_ref()) => result,
        };

        // A cancel that lands after the last byte still wins, as long as it
        // deregistered the handle before we release it here.
        let outcome = match outcome {
            Ok(_) if !self.registration.release() => {
                Err(CacheError::TransferCancelled(self.descriptor.id.clone()))
            }
            other => other,
        };

        match outcome {
            Ok(bytes) => {
                info!(bytes, "Transfer completed");
                Ok(TransferReceipt {
                    path: self.target.clone(),
                    bytes,
                })
            }
            Err(e) => {
                if e.is_cancelled() {
                    warn!("Transfer aborted by cancel");
                } else {
                    error!(error = %e, "Transfer failed");
                }
                self.discard_partial_file().await;
                Err(e)
            }
        }
    }

    async fn stream_with_timeout(&self, on_progress: Option<&ProgressSink>) -> Result<u64> {
        match self.config.download_timeout {
            Some(limit) => tokio::time::timeout(limit, self.stream_to_target(on_progress))
                .await
                .map_err(|_| {
                    CacheError::TransferFailed(format!(
                        "{} timed out after {:?}",
                        self.descriptor.id, limit
                    ))
                })?,
            None => self.stream_to_target(on_progress).await,
        }
    }

    async fn stream_to_target(&self, on_progress: Option<&ProgressSink>) -> Result<u64> {
        let failed = |what: &str, e: &dyn std::fmt::Display| {
            CacheError::TransferFailed(format!("{}: {}: {}", self.descriptor.id, what, e))
        };

        let DownloadStream {
            content_length,
            mut reader,
        } = self
            .http
            .download_stream_with_retry(&self.descriptor.source_url, self.config.retry_policy.clone())
            .await
            .map_err(|e| failed("request failed", &e))?;

        let total = content_length.filter(|&t| t > 0);
        self.progress.lock().set_total(content_length);
        debug!(total_bytes = ?content_length, "Response received");

        let mut reporter = FractionReporter::new(on_progress);
        if total.is_some() {
            reporter.report(0.0);
        }

        let mut writer = self
            .fs
            .open_write_stream(&self.target)
            .await
            .map_err(|e| failed("cannot open target", &e))?;

        let mut buffer = vec![0u8; self.config.chunk_size];
        let mut written: u64 = 0;

        loop {
            let read = reader
                .read(&mut buffer)
                .await
                .map_err(|e| failed("read error", &e))?;
            if read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..read])
                .await
                .map_err(|e| failed("write error", &e))?;
            written += read as u64;

            self.progress.lock().update(written);
            if let Some(total) = total {
                // 1.0 is reserved for the final report after the file is flushed
                let fraction = written as f64 / total as f64;
                if fraction < 1.0 {
                    reporter.report(fraction);
                }
            }
        }

        writer
            .shutdown()
            .await
            .map_err(|e| failed("flush error", &e))?;

        if let Some(expected) = content_length {
            if written < expected {
                return Err(CacheError::TransferFailed(format!(
                    "{}: body ended after {} of {} bytes",
                    self.descriptor.id, written, expected
                )));
            }
        }

        reporter.report(1.0);
        Ok(written)
    }

    async fn discard_partial_file(&self) {
        if self.registration.is_superseded() {
            debug!("Newer transfer owns the target; keeping file");
            return;
        }

        match self.fs.delete_file(&self.target).await {
            Ok(()) => debug!(path = ?self.target, "Removed partial file"),
            Err(e) if e.is_not_found() => {}
            Err(e) => warn!(path = ?self.target, error = %e, "Failed to remove partial file"),
        }
    }
}

/// Forwards fractions to the sink, clamped and never decreasing.
struct FractionReporter<'a> {
    sink: Option<&'a ProgressSink>,
    last: Option<f64>,
}

impl<'a> FractionReporter<'a> {
    fn new(sink: Option<&'a ProgressSink>) -> Self {
        Self { sink, last: None }
    }

    fn report(&mut self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        if matches!(self.last, Some(last) if fraction <= last) {
            return;
        }
        self.last = Some(fraction);
        if let Some(sink) = self.sink {
            sink(fraction);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::storage::FileMetadata;
    use std::collections::HashMap as Map;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::AsyncWrite;

    /// In-memory content store; writes land in `files` when the writer shuts down.
    #[derive(Default, Clone)]
    struct MemoryFs {
        files: Arc<Mutex<Map<PathBuf, Vec<u8>>>>,
    }

    struct MemoryWriter {
        path: PathBuf,
        buffer: Vec<u8>,
        files: Arc<Mutex<Map<PathBuf, Vec<u8>>>>,
    }

    impl AsyncWrite for MemoryWriter {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            self.buffer.extend_from_slice(buf);
            let snapshot = self.buffer.clone();
            let path = self.path.clone();
            self.files.lock().insert(path, snapshot);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[async_trait]
    impl FileSystemAccess for MemoryFs {
        async fn get_data_directory(&self) -> BridgeResult<PathBuf> {
            Ok(PathBuf::from("/data"))
        }

        async fn exists(&self, path: &Path) -> BridgeResult<bool> {
            Ok(self.files.lock().contains_key(path))
        }

        async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata> {
            let size = self
                .files
                .lock()
                .get(path)
                .map(|f| f.len() as u64)
                .ok_or_else(|| BridgeError::Io(io::Error::from(io::ErrorKind::NotFound)))?;
            Ok(FileMetadata {
                size,
                created_at: None,
                modified_at: None,
                is_directory: false,
            })
        }

        async fn create_dir_all(&self, _path: &Path) -> BridgeResult<()> {
            Ok(())
        }

        async fn delete_file(&self, path: &Path) -> BridgeResult<()> {
            self.files
                .lock()
                .remove(path)
                .map(|_| ())
                .ok_or_else(|| BridgeError::Io(io::Error::from(io::ErrorKind::NotFound)))
        }

        async fn open_write_stream(
            &self,
            path: &Path,
        ) -> BridgeResult<Box<dyn AsyncWrite + Send + Unpin>> {
            self.files.lock().insert(path.to_path_buf(), Vec::new());
            Ok(Box::new(MemoryWriter {
                path: path.to_path_buf(),
                buffer: Vec::new(),
                files: Arc::clone(&self.files),
            }))
        }
    }

    /// Serves a fixed body, optionally announcing a different length.
    struct StaticHttp {
        body: Vec<u8>,
        content_length: Option<u64>,
    }

    #[async_trait]
    impl HttpClient for StaticHttp {
        async fn download_stream(&self, _url: &str) -> BridgeResult<DownloadStream> {
            Ok(DownloadStream::new(
                self.content_length,
                Box::new(io::Cursor::new(self.body.clone())),
            ))
        }
    }

    /// Never produces a byte.
    struct StalledHttp;

    #[async_trait]
    impl HttpClient for StalledHttp {
        async fn download_stream(&self, _url: &str) -> BridgeResult<DownloadStream> {
            let (writer, rx) = tokio::io::duplex(16);
            // Leak the writer half so the reader stays pending
            std::mem::forget(writer);
            Ok(DownloadStream::new(Some(100), Box::new(rx)))
        }
    }

    struct RefusingHttp;

    #[async_trait]
    impl HttpClient for RefusingHttp {
        async fn download_stream(&self, _url: &str) -> BridgeResult<DownloadStream> {
            Err(BridgeError::HttpStatus {
                status: 404,
                message: "Not Found".to_string(),
            })
        }
    }

    fn controller(http: Arc<dyn HttpClient>, fs: MemoryFs, config: CacheConfig) -> TransferController {
        let controller = TransferController::new(http, Arc::new(fs), config);
        controller.set_base_dir(PathBuf::from("/data/lessons"));
        controller
    }

    fn recording_sink() -> (ProgressSink, Arc<Mutex<Vec<f64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: ProgressSink = Arc::new(move |f| sink_seen.lock().push(f));
        (sink, seen)
    }

    fn descriptor(id: &str) -> AssetDescriptor {
        AssetDescriptor::new(id, format!("https://cdn.example.com/{}.mp4", id))
    }

    #[tokio::test]
    async fn test_transfer_writes_target_and_reports_progress() {
        let fs = MemoryFs::default();
        let body = vec![7u8; 10_000];
        let http = Arc::new(StaticHttp {
            content_length: Some(body.len() as u64),
            body: body.clone(),
        });
        let config = CacheConfig::default().with_chunk_size(1000);
        let controller = controller(http, fs.clone(), config);
        let (sink, seen) = recording_sink();

        let path = controller.start(&descriptor("lesson-1"), Some(sink)).await.unwrap();

        assert_eq!(path, PathBuf::from("/data/lessons/lesson-1.mp4"));
        assert_eq!(fs.files.lock().get(&path), Some(&body));
        assert!(!controller.is_active("lesson-1"));
        assert_eq!(controller.transfers_started(), 1);

        let seen = seen.lock();
        assert_eq!(seen.first(), Some(&0.0));
        assert_eq!(seen.last(), Some(&1.0));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.iter().filter(|f| **f == 1.0).count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_length_only_reports_completion() {
        let fs = MemoryFs::default();
        let http = Arc::new(StaticHttp {
            body: vec![1u8; 5000],
            content_length: None,
        });
        let controller = controller(http, fs, CacheConfig::default().with_chunk_size(512));
        let (sink, seen) = recording_sink();

        controller.start(&descriptor("lesson-2"), Some(sink)).await.unwrap();

        assert_eq!(*seen.lock(), vec![1.0]);
    }

    #[tokio::test]
    async fn test_truncated_body_fails_and_removes_file() {
        let fs = MemoryFs::default();
        let http = Arc::new(StaticHttp {
            body: vec![1u8; 100],
            content_length: Some(1000),
        });
        let controller = controller(http, fs.clone(), CacheConfig::default());

        let err = controller
            .start(&descriptor("lesson-3"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, CacheError::TransferFailed(_)));
        assert!(fs.files.lock().is_empty());
        assert!(!controller.is_active("lesson-3"));
    }

    #[tokio::test]
    async fn test_request_failure_maps_to_transfer_failed() {
        let controller = controller(Arc::new(RefusingHttp), MemoryFs::default(), CacheConfig::default());

        let err = controller
            .start(&descriptor("lesson-4"), None)
            .await
            .unwrap_err();

        match err {
            CacheError::TransferFailed(msg) => assert!(msg.contains("404")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_rejected() {
        let controller = controller(Arc::new(StalledHttp), MemoryFs::default(), CacheConfig::default());

        let first = controller.register(&descriptor("lesson-5")).unwrap();
        assert!(matches!(
            controller.register(&descriptor("lesson-5")),
            Err(CacheError::TransferInProgress(_))
        ));

        // Dropping an unstarted transfer frees the id
        drop(first);
        assert!(!controller.is_active("lesson-5"));
        assert!(controller.register(&descriptor("lesson-5")).is_ok());
    }

    #[tokio::test]
    async fn test_cancel_before_and_during_run() {
        let fs = MemoryFs::default();
        let controller = Arc::new(controller(Arc::new(StalledHttp), fs.clone(), CacheConfig::default()));

        // Cancel right after registration
        let transfer = controller.register(&descriptor("lesson-6")).unwrap();
        assert!(controller.cancel("lesson-6"));
        assert!(matches!(
            transfer.run(None).await,
            Err(CacheError::TransferCancelled(_))
        ));

        // Cancel while the body is stalled
        let transfer = controller.register(&descriptor("lesson-6")).unwrap();
        let task = tokio::spawn(transfer.run(None));
        tokio::task::yield_now().await;
        assert!(controller.cancel("lesson-6"));

        let result = task.await.unwrap();
        assert!(matches!(result, Err(CacheError::TransferCancelled(_))));
        assert!(fs.files.lock().is_empty());
        assert!(!controller.cancel("lesson-6"));
    }

    #[tokio::test]
    async fn test_cancel_after_last_byte_still_aborts() {
        let fs = MemoryFs::default();
        let http = Arc::new(StaticHttp {
            body: vec![3u8; 4096],
            content_length: Some(4096),
        });
        let controller = Arc::new(controller(
            http,
            fs.clone(),
            CacheConfig::default().with_chunk_size(1024),
        ));

        let cancelled = Arc::new(Mutex::new(None));
        let sink: ProgressSink = {
            let controller = Arc::clone(&controller);
            let cancelled = Arc::clone(&cancelled);
            Arc::new(move |f| {
                if f >= 1.0 {
                    *cancelled.lock() = Some(controller.cancel("lesson-10"));
                }
            })
        };

        let result = controller.start(&descriptor("lesson-10"), Some(sink)).await;

        assert_eq!(*cancelled.lock(), Some(true));
        assert!(matches!(result, Err(CacheError::TransferCancelled(_))));
        assert!(fs.files.lock().is_empty());
        assert!(!controller.is_active("lesson-10"));
    }

    #[tokio::test]
    async fn test_withdraw_reports_prior_cancel() {
        let controller = controller(Arc::new(StalledHttp), MemoryFs::default(), CacheConfig::default());

        let transfer = controller.register(&descriptor("lesson-11")).unwrap();
        assert!(transfer.withdraw());
        assert!(!controller.is_active("lesson-11"));
        drop(transfer);

        let transfer = controller.register(&descriptor("lesson-11")).unwrap();
        assert!(controller.cancel("lesson-11"));
        assert!(!transfer.withdraw());
    }

    #[tokio::test]
    async fn test_timeout_turns_stall_into_failure() {
        let config = CacheConfig::default().with_download_timeout(std::time::Duration::from_millis(50));
        let controller = controller(Arc::new(StalledHttp), MemoryFs::default(), config);

        let err = controller
            .start(&descriptor("lesson-7"), None)
            .await
            .unwrap_err();

        match err {
            CacheError::TransferFailed(msg) => assert!(msg.contains("timed out")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_progress_snapshot_while_active() {
        let controller = controller(Arc::new(StalledHttp), MemoryFs::default(), CacheConfig::default());

        let _transfer = controller.register(&descriptor("lesson-8")).unwrap();
        let snapshot = controller.progress("lesson-8").unwrap();
        assert_eq!(snapshot.asset_id, "lesson-8");
        assert_eq!(snapshot.downloaded_bytes, 0);
        assert_eq!(controller.active_transfers().len(), 1);
        assert!(controller.progress("other").is_none());
    }

    #[tokio::test]
    async fn test_register_requires_base_dir_and_valid_id() {
        let controller = TransferController::new(
            Arc::new(StalledHttp),
            Arc::new(MemoryFs::default()),
            CacheConfig::default(),
        );
        assert!(matches!(
            controller.register(&descriptor("lesson-9")),
            Err(CacheError::NotInitialized)
        ));

        controller.set_base_dir(PathBuf::from("/data/lessons"));
        assert!(matches!(
            controller.register(&AssetDescriptor::new("../x", "https://h/x")),
            Err(CacheError::InvalidAssetId(_))
        ));
    }

    #[test]
    fn test_fraction_reporter_is_monotonic() {
        let (sink, seen) = recording_sink();
        let mut reporter = FractionReporter::new(Some(&sink));
        for f in [0.0, 0.5, 0.4, 1.5, 1.0] {
            reporter.report(f);
        }
        assert_eq!(*seen.lock(), vec![0.0, 0.5, 1.0]);
    }
}
