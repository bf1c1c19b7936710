//! # Desktop Bridges
//!
//! Bridge implementations used by desktop hosts (macOS, Windows, Linux) and by
//! the workspace integration tests.
//!
//! | Trait              | Implementation         | Backed by                  |
//! |--------------------|------------------------|----------------------------|
//! | `HttpClient`       | [`ReqwestHttpClient`]  | `reqwest` byte stream      |
//! | `FileSystemAccess` | [`TokioFileSystem`]    | `tokio::fs`, `dirs`        |
//! | `SettingsStore`    | [`SqliteSettingsStore`]| one `sqlx` SQLite table    |
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore, TokioFileSystem};
//!
//! let http_client = ReqwestHttpClient::new()?;
//! let fs = TokioFileSystem::with_data_directory(data_dir.clone());
//! let settings = SqliteSettingsStore::new(data_dir.join("settings.db")).await?;
//! ```

mod filesystem;
mod http;
mod settings;

pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
pub use settings::SqliteSettingsStore;
