//! # Offline Cache Error Types

use thiserror::Error;

/// Errors that can occur during cache operations.
///
/// Payloads are plain strings so the error is `Clone`: callers that join an
/// in-flight download all receive the same outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    // ========================================================================
    // Transfer Errors
    // ========================================================================
    /// Network or I/O failure (or timeout) while transferring an asset.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Transfer was aborted through `cancel`.
    #[error("Transfer cancelled: {0}")]
    TransferCancelled(String),

    /// A transfer for this asset is already registered.
    #[error("Transfer already in progress: {0}")]
    TransferInProgress(String),

    // ========================================================================
    // Index Errors
    // ========================================================================
    /// A stored cache record could not be parsed.
    #[error("Corrupt cache record under '{key}': {reason}")]
    RecordCorrupt { key: String, reason: String },

    /// Writing or removing a cache record failed.
    #[error("Failed to persist cache record: {0}")]
    PersistenceWriteFailed(String),

    // ========================================================================
    // Content Store Errors
    // ========================================================================
    /// An existing cached file could not be deleted.
    #[error("Failed to delete cached file: {0}")]
    FileDeleteFailed(String),

    /// The cache directory could not be resolved or created.
    #[error("Cache storage unavailable: {0}")]
    StorageUnavailable(String),

    // ========================================================================
    // Usage Errors
    // ========================================================================
    /// Asset id is unusable as a cache key / file name.
    #[error("Invalid asset id: {0}")]
    InvalidAssetId(String),

    /// `initialize()` has not completed yet.
    #[error("Cache manager not initialized")]
    NotInitialized,

    /// Invalid cache configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Returns `true` if retrying the same download may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CacheError::TransferFailed(_) | CacheError::PersistenceWriteFailed(_)
        )
    }

    /// Returns `true` if the error came from an explicit cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CacheError::TransferCancelled(_))
    }
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CacheError::TransferFailed("reset".into()).is_transient());
        assert!(CacheError::PersistenceWriteFailed("disk full".into()).is_transient());
        assert!(!CacheError::TransferCancelled("lesson-1".into()).is_transient());
        assert!(!CacheError::NotInitialized.is_transient());
        assert!(CacheError::TransferCancelled("lesson-1".into()).is_cancelled());
    }

    #[test]
    fn test_display_includes_context() {
        let err = CacheError::RecordCorrupt {
            key: "lesson:1".to_string(),
            reason: "expected value at line 1".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("lesson:1"));
        assert!(message.contains("expected value"));
    }
}
