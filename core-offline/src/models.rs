//! Cache data model: asset descriptors, persisted records and progress snapshots.

use crate::error::{CacheError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Caller-supplied progress sink, invoked with a fraction in `[0, 1]`.
pub type ProgressSink = Arc<dyn Fn(f64) + Send + Sync>;

/// A remote asset the caller wants available offline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Stable identifier; also names the cached file
    pub id: String,
    /// Where the asset is fetched from
    pub source_url: String,
}

impl AssetDescriptor {
    pub fn new(id: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_url: source_url.into(),
        }
    }

    /// Rejects ids that cannot safely name a file inside the cache directory.
    pub fn validate(&self) -> Result<()> {
        validate_asset_id(&self.id)
    }
}

/// Checks that an id is non-empty and cannot escape the cache directory.
pub fn validate_asset_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(CacheError::InvalidAssetId("id cannot be empty".to_string()));
    }

    if id.contains(['/', '\\', '\0']) || id == "." || id == ".." {
        return Err(CacheError::InvalidAssetId(format!(
            "'{}' must not be '.' or '..' or contain path separators or NUL",
            id.escape_debug()
        )));
    }

    Ok(())
}

/// Durable proof that an asset was fully transferred.
///
/// Serialized as `{"id", "localPath", "cachedAt"}`; `cachedAt` is RFC 3339 UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub id: String,
    pub local_path: PathBuf,
    pub cached_at: DateTime<Utc>,
}

impl CacheRecord {
    pub fn new(id: impl Into<String>, local_path: PathBuf, cached_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            local_path,
            cached_at,
        }
    }
}

/// Download progress information for an in-flight transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// Asset identifier
    pub asset_id: String,

    /// Total size announced by the server
    pub total_bytes: Option<u64>,

    /// Bytes written so far
    pub downloaded_bytes: u64,

    /// `downloaded / total`, only when the total is known
    pub fraction: Option<f64>,

    /// Average download speed in bytes/second
    pub speed_bytes_per_sec: u64,

    /// Estimated time remaining in seconds
    pub eta_seconds: Option<u64>,

    /// Transfer start
    pub started_at: DateTime<Utc>,

    /// Last update
    pub updated_at: DateTime<Utc>,
}

impl DownloadProgress {
    /// Create a new progress tracker; the total is unknown until the response arrives.
    pub fn new(asset_id: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            asset_id: asset_id.into(),
            total_bytes: None,
            downloaded_bytes: 0,
            fraction: None,
            speed_bytes_per_sec: 0,
            eta_seconds: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Record the announced body size.
    pub fn set_total(&mut self, total_bytes: Option<u64>) {
        self.total_bytes = total_bytes;
        self.fraction = self.compute_fraction();
    }

    /// Update progress with the number of bytes written so far.
    pub fn update(&mut self, downloaded_bytes: u64) {
        let now = Utc::now();
        let elapsed_ms = (now - self.started_at).num_milliseconds().max(1) as u64;

        self.downloaded_bytes = downloaded_bytes;
        self.updated_at = now;
        self.fraction = self.compute_fraction();
        self.speed_bytes_per_sec = downloaded_bytes.saturating_mul(1000) / elapsed_ms;

        self.eta_seconds = match (self.total_bytes, self.speed_bytes_per_sec) {
            (Some(total), speed) if speed > 0 => {
                Some(total.saturating_sub(downloaded_bytes) / speed)
            }
            _ => None,
        };
    }

    fn compute_fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(total) if total > 0 => {
                Some((self.downloaded_bytes as f64 / total as f64).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }

    /// Whole percent, when the total is known.
    pub fn percent(&self) -> Option<u8> {
        self.fraction.map(|f| (f * 100.0).floor() as u8)
    }

    /// Returns true once every announced byte has been written.
    pub fn is_complete(&self) -> bool {
        matches!(self.total_bytes, Some(total) if self.downloaded_bytes >= total)
    }

    /// Format speed as human-readable string.
    pub fn speed_string(&self) -> String {
        format_bytes_per_sec(self.speed_bytes_per_sec)
    }

    /// Format ETA as human-readable string.
    pub fn eta_string(&self) -> String {
        match self.eta_seconds {
            Some(secs) => format_duration_seconds(secs),
            None => "calculating...".to_string(),
        }
    }
}

fn format_bytes_per_sec(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B/s", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB/s", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB/s", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB/s", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

fn format_duration_seconds(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_asset_id_validation() {
        assert!(validate_asset_id("lesson-1").is_ok());
        assert!(validate_asset_id("intro_2.v3").is_ok());
        assert!(validate_asset_id("intro..v2").is_ok());

        for bad in ["", "a/b", "a\\b", "..", "../etc", "x\0y", "."] {
            assert!(
                matches!(validate_asset_id(bad), Err(CacheError::InvalidAssetId(_))),
                "expected {:?} to be rejected",
                bad
            );
        }

        let descriptor = AssetDescriptor::new("lesson-1", "https://host/a.mp4");
        assert!(descriptor.validate().is_ok());
    }

    #[test]
    fn test_record_wire_format() {
        let record = CacheRecord::new(
            "lesson-1",
            PathBuf::from("/data/lessons/lesson-1.mp4"),
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
        );

        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(object["id"], "lesson-1");
        assert_eq!(object["localPath"], "/data/lessons/lesson-1.mp4");
        assert_eq!(object["cachedAt"], "2024-03-01T12:30:00Z");

        let parsed: CacheRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_record_accepts_offset_timestamps() {
        let raw = r#"{"id":"a","localPath":"/x/a.mp4","cachedAt":"2024-03-01T14:30:00.250+02:00"}"#;
        let parsed: CacheRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.cached_at,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
                + chrono::Duration::milliseconds(250)
        );
    }

    #[test]
    fn test_download_progress_with_known_total() {
        let mut progress = DownloadProgress::new("lesson-1");
        assert_eq!(progress.fraction, None);

        progress.set_total(Some(10_000_000));
        assert_eq!(progress.fraction, Some(0.0));
        assert!(!progress.is_complete());

        std::thread::sleep(std::time::Duration::from_millis(20));
        progress.update(5_000_000);

        assert_eq!(progress.percent(), Some(50));
        assert!(progress.speed_bytes_per_sec > 0);
        assert!(progress.eta_seconds.is_some());

        progress.update(10_000_000);
        assert_eq!(progress.fraction, Some(1.0));
        assert!(progress.is_complete());
    }

    #[test]
    fn test_download_progress_with_unknown_total() {
        let mut progress = DownloadProgress::new("lesson-1");
        progress.set_total(None);
        progress.update(4096);

        assert_eq!(progress.fraction, None);
        assert_eq!(progress.percent(), None);
        assert_eq!(progress.eta_seconds, None);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_fraction_is_clamped() {
        let mut progress = DownloadProgress::new("lesson-1");
        progress.set_total(Some(100));
        progress.update(150);
        assert_eq!(progress.fraction, Some(1.0));
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_bytes_per_sec(500), "500 B/s");
        assert_eq!(format_bytes_per_sec(1024), "1.0 KB/s");
        assert_eq!(format_bytes_per_sec(1024 * 1024), "1.0 MB/s");

        assert_eq!(format_duration_seconds(30), "30s");
        assert_eq!(format_duration_seconds(90), "1m 30s");
        assert_eq!(format_duration_seconds(3661), "1h 1m");
    }
}
