//! # Google Photos Provider
//!
//! Implements `MediaLibrary` for the Google Photos Library API v1.
//!
//! ## Overview
//!
//! Adding an item is a two-step protocol:
//! 1. POST the raw bytes to `/v1/uploads` and receive an upload token
//! 2. POST `/v1/mediaItems:batchCreate` referencing that token
//!
//! The app-created items scope (`photoslibrary.appendonly`) is enough for both.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GooglePhotosConnector;
pub use error::{GooglePhotosError, Result};
