//! Workspace umbrella crate.
//!
//! Maps feature flags onto the workspace crates so a host can depend on
//! `offline-lessons-workspace` alone:
//! - `desktop-shims` (default): [`CoreService`] and [`bootstrap_desktop`]
//!   backed by the desktop bridges
//! - `offline-cache`: the bare cache crate as [`offline`], for hosts that
//!   inject their own bridges

#[cfg(feature = "desktop-shims")]
pub use core_service::{bootstrap_desktop, CoreError, CoreService};

#[cfg(feature = "offline-cache")]
pub use core_offline as offline;
