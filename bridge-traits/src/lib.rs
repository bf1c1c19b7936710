//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the offline cache core and
//! platform-specific implementations. Each trait represents a capability that
//! the core requires but that must be implemented differently per platform
//! (desktop, iOS, Android).
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Streamed downloads with retry and TLS
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Content store for downloaded assets
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - Durable key-value storage (cache index backend)
//!
//! ### Utilities
//! - [`Clock`](clock::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](logger::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for consistent
//! error handling. Platform implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Keep `std::io::Error` kinds intact (callers rely on `NotFound`)
//! - Include error context (e.g., file paths, HTTP status)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent usage
//! across async tasks.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{DownloadStream, HttpClient};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient;
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn download_stream(&self, url: &str) -> Result<DownloadStream> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod clock;
pub mod error;
pub mod http;
pub mod logger;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{DownloadStream, HttpClient, RetryPolicy};
pub use storage::{FileMetadata, FileSystemAccess, SettingsStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use logger::{LogEntry, LogLevel, LoggerSink, MemoryLogger};
