//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the offline lesson core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the cache crates depend on.
//! It establishes the logging conventions, configuration builder and event
//! broadcasting used throughout the workspace.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
