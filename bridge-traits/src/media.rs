//! Media Library Abstraction
//!
//! Destination side of a migration: a photo library that accepts raw bytes
//! and turns the resulting upload token into a permanent item.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Opaque handle for bytes accepted by [`MediaLibrary::upload_bytes`]
///
/// Only good for one [`NewMediaItem`]; building the item consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct UploadToken(String);

impl UploadToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Item to create from a previously uploaded byte stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMediaItem {
    /// Opaque token returned by [`MediaLibrary::upload_bytes`]
    pub upload_token: String,
    /// File name shown in the library
    pub file_name: String,
    /// Free-form description attached to the item
    pub description: String,
}

impl NewMediaItem {
    pub fn new(
        upload_token: UploadToken,
        file_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            upload_token: upload_token.0,
            file_name: file_name.into(),
            description: description.into(),
        }
    }
}

/// Outcome for one item of a batch create call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItemResult {
    /// Upload token the result refers to, when echoed back
    pub upload_token: Option<String>,
    /// Status message reported by the service (e.g. `"Success"`)
    pub status_message: Option<String>,
}

impl MediaItemResult {
    /// True when the service reported the literal `Success` message
    pub fn is_success(&self) -> bool {
        self.status_message.as_deref() == Some("Success")
    }
}

/// Photo library destination
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// Upload raw bytes and return the upload token for them
    ///
    /// # Errors
    ///
    /// Fails on transport errors and on any non-2xx response.
    async fn upload_bytes(
        &self,
        access_token: &str,
        file_name: &str,
        mime_type: &str,
        data: Bytes,
    ) -> Result<UploadToken>;

    /// Turn uploaded tokens into library items
    ///
    /// Returns one result per requested item, in service order.
    async fn batch_create(
        &self,
        access_token: &str,
        items: Vec<NewMediaItem>,
    ) -> Result<Vec<MediaItemResult>>;
}
