//! # Offline Cache Module
//!
//! Downloads remote lesson assets to local storage and keeps a durable,
//! self-healing index of what is available offline.
//!
//! ## Overview
//!
//! This module handles:
//! - A persistent cache index backed by a `SettingsStore`
//! - Streamed transfers with progress, cancellation and timeouts
//! - A cache manager facade that joins concurrent downloads of the same asset
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_offline::{AssetDescriptor, CacheConfig, CacheManager};
//!
//! let manager = CacheManager::new(config, settings_store, fs, http_client, clock);
//! manager.initialize().await?;
//!
//! let lesson = AssetDescriptor::new("lesson-1", "https://cdn.example.com/lesson-1.mp4");
//! let path = manager.download(&lesson, None).await?;
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod manager;
pub mod models;
pub mod transfer;

pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use index::CacheIndex;
pub use manager::CacheManager;
pub use models::{AssetDescriptor, CacheRecord, DownloadProgress, ProgressSink};
pub use transfer::{Transfer, TransferController, TransferReceipt};
