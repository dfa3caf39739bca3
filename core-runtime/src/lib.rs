//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the migrator:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its configuration type and
//! logging conventions. Human-facing progress goes to stdout; everything
//! emitted through `tracing` goes to stderr.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{DownloadFailurePolicy, MigrationConfig, MigrationConfigBuilder};
pub use error::{Error, Result};
