//! # Cache Index
//!
//! Durable map from asset id to [`CacheRecord`], stored as JSON strings in a
//! [`SettingsStore`] under `<prefix><id>`.
//!
//! A record only counts while its file exists. Every read re-checks the
//! content store and purges records whose file has disappeared, so callers
//! never see a record pointing at nothing.

use crate::error::{CacheError, Result};
use crate::models::CacheRecord;
use bridge_traits::{FileSystemAccess, SettingsStore};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Outcome of reading one stored record.
enum Observed {
    Valid(CacheRecord),
    Missing,
}

/// Persistent, self-healing index of cached assets.
pub struct CacheIndex {
    store: Arc<dyn SettingsStore>,
    fs: Arc<dyn FileSystemAccess>,
    key_prefix: String,
}

impl CacheIndex {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        fs: Arc<dyn FileSystemAccess>,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            fs,
            key_prefix: key_prefix.into(),
        }
    }

    /// Storage key for an asset id.
    pub fn key_for(&self, id: &str) -> String {
        format!("{}{}", self.key_prefix, id)
    }

    /// Returns the record for `id` if its file still exists.
    ///
    /// Read and parse failures are logged and reported as a miss.
    #[instrument(skip(self))]
    pub async fn lookup(&self, id: &str) -> Option<CacheRecord> {
        match self.observe(&self.key_for(id)).await {
            Observed::Valid(record) => Some(record),
            Observed::Missing => None,
        }
    }

    /// Returns every record whose file still exists, purging stale ones.
    ///
    /// Order is unspecified.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Vec<CacheRecord> {
        let keys = match self.store.list_keys_with_prefix(&self.key_prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Failed to enumerate cache records");
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            if let Observed::Valid(record) = self.observe(&key).await {
                records.push(record);
            }
        }

        debug!(count = records.len(), "Listed cache records");
        records
    }

    /// Persists `record`, replacing any previous record for the same id.
    #[instrument(skip(self, record), fields(asset_id = %record.id))]
    pub async fn commit(&self, record: &CacheRecord) -> Result<()> {
        let key = self.key_for(&record.id);
        let value = serde_json::to_string(record)
            .map_err(|e| CacheError::PersistenceWriteFailed(format!("{}: {}", key, e)))?;

        self.store
            .set_string(&key, &value)
            .await
            .map_err(|e| CacheError::PersistenceWriteFailed(format!("{}: {}", key, e)))?;

        debug!(key = %key, "Committed cache record");
        Ok(())
    }

    /// Deletes the record for `id`; absent records are not an error.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<()> {
        let key = self.key_for(id);
        self.store
            .delete(&key)
            .await
            .map_err(|e| CacheError::PersistenceWriteFailed(format!("{}: {}", key, e)))?;

        debug!(key = %key, "Removed cache record");
        Ok(())
    }

    async fn observe(&self, key: &str) -> Observed {
        let raw = match self.store.get_string(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Observed::Missing,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cache record");
                return Observed::Missing;
            }
        };

        let record: CacheRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                let error = CacheError::RecordCorrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                };
                warn!(error = %error, "Purging unreadable cache record");
                self.purge(key).await;
                return Observed::Missing;
            }
        };

        match self.fs.exists(&record.local_path).await {
            Ok(true) => Observed::Valid(record),
            Ok(false) => {
                warn!(
                    key = %key,
                    asset_id = %record.id,
                    "Cached file is gone; purging stale record"
                );
                self.purge(key).await;
                Observed::Missing
            }
            Err(e) => {
                // The file may still be there; keep the record for the next read
                warn!(key = %key, error = %e, "Could not verify cached file");
                Observed::Missing
            }
        }
    }

    async fn purge(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            warn!(key = %key, error = %e, "Failed to purge cache record");
        }
    }
}
