//! # Google Drive Provider
//!
//! Implements `MediaSource` for the Google Drive API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - Paged file listing filtered by a Drive query expression
//! - Ranged chunk downloads of file content (`alt=media`)

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GoogleDriveConnector;
pub use error::{GoogleDriveError, Result};
