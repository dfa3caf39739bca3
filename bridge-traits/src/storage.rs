//! Storage and File System Abstractions
//!
//! Provides platform-agnostic traits for local file I/O, credential
//! persistence and the remote source of media files.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File system access trait
///
/// Covers the handful of operations the migration needs: scratch files that
/// are written chunk by chunk and removed afterwards, and an append-only
/// report log.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn scratch(fs: &dyn FileSystemAccess, data: &[u8]) -> Result<()> {
///     let dir = fs.get_scratch_directory().await?;
///     let path = dir.join("photo.jpg");
///     fs.write_file(&path, Bytes::copy_from_slice(data)).await?;
///     fs.delete_file(&path).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Directory that holds transient copies of remote files
    ///
    /// Created on first access if missing.
    async fn get_scratch_directory(&self) -> Result<PathBuf>;

    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, truncating it if it exists
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Append data to an existing file or create it
    async fn append_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;
}

/// Secure credential storage trait
///
/// Values are opaque byte blobs keyed by name. Writes replace the previous
/// value wholesale; there is no partial merge.
///
/// # Security Requirements
///
/// Implementations MUST never log or expose stored values.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SecureStore;
///
/// async fn store_token(store: &dyn SecureStore, token: &str) -> Result<()> {
///     store.set_secret("token.json", token.as_bytes()).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Store a secret value, replacing any previous value
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret value
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret. Succeeds when the key is already absent.
    async fn delete_secret(&self, key: &str) -> Result<()>;

    /// Check if a secret exists without retrieving it
    async fn has_secret(&self, key: &str) -> Result<bool> {
        Ok(self.get_secret(key).await?.is_some())
    }
}

/// Remote file descriptor
///
/// Snapshot of one item returned by a listing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Provider-specific file ID
    pub id: String,
    /// Display name
    pub name: String,
    /// MIME type
    pub mime_type: String,
    /// Declared size in bytes, when the service reports one
    pub size: Option<u64>,
}

impl RemoteFile {
    /// Declared size, with an absent size counted as zero
    pub fn declared_size(&self) -> u64 {
        self.size.unwrap_or(0)
    }
}

/// Listing parameters for [`MediaSource::list_page`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Provider query expression (e.g. Drive's `q` parameter)
    pub filter: String,
    /// Items per page
    pub page_size: u32,
}

/// One chunk of a ranged download
#[derive(Debug, Clone)]
pub struct DownloadChunk {
    /// Bytes received for this range
    pub data: Bytes,
    /// Total size of the remote content, when the service reported it
    pub total_size: Option<u64>,
}

/// Source of media files
///
/// Implemented by cloud storage connectors. The access token is passed per
/// call so the caller owns the credential lifecycle.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Fetch one page of files matching `query`
    ///
    /// Returns the files and the continuation token for the next page,
    /// `None` once the listing is exhausted.
    async fn list_page(
        &self,
        access_token: &str,
        query: &ListQuery,
        page_token: Option<String>,
    ) -> Result<(Vec<RemoteFile>, Option<String>)>;

    /// Download `length` bytes of a file starting at `offset`
    ///
    /// The returned chunk may be shorter than requested at end of file.
    async fn download_chunk(
        &self,
        access_token: &str,
        file_id: &str,
        offset: u64,
        length: u64,
    ) -> Result<DownloadChunk>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_size_defaults_to_zero() {
        let file = RemoteFile {
            id: "1".to_string(),
            name: "a.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            size: None,
        };
        assert_eq!(file.declared_size(), 0);

        let sized = RemoteFile {
            size: Some(1_048_576),
            ..file
        };
        assert_eq!(sized.declared_size(), 1_048_576);
    }
}
