//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::FileSystemAccess,
};
use bytes::Bytes;
use core_runtime::logging::strip_path;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// File name only, so debug logs don't carry the user's directory layout
fn file_label(path: &Path) -> String {
    strip_path(&path.to_string_lossy()).to_string()
}

/// Tokio-based file system implementation
pub struct TokioFileSystem {
    scratch_dir: PathBuf,
}

impl TokioFileSystem {
    /// Create a file system accessor whose scratch files live in `scratch_dir`
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Convert std::io::Error to BridgeError
    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }

    async fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(Self::map_io_error)?;
        }
        Ok(())
    }
}

impl Default for TokioFileSystem {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn get_scratch_directory(&self) -> Result<PathBuf> {
        if !fs::try_exists(&self.scratch_dir)
            .await
            .map_err(Self::map_io_error)?
        {
            fs::create_dir_all(&self.scratch_dir)
                .await
                .map_err(Self::map_io_error)?;
            debug!(path = ?self.scratch_dir, "Created scratch directory");
        }
        Ok(self.scratch_dir.clone())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path).await.map_err(Self::map_io_error)
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await.map_err(Self::map_io_error)?;
        debug!(file = %file_label(path), size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        Self::ensure_parent(path).await?;

        fs::write(path, data.as_ref())
            .await
            .map_err(Self::map_io_error)?;
        debug!(file = %file_label(path), size = data.len(), "Wrote file");
        Ok(())
    }

    async fn append_file(&self, path: &Path, data: Bytes) -> Result<()> {
        Self::ensure_parent(path).await?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(Self::map_io_error)?;

        file.write_all(data.as_ref())
            .await
            .map_err(Self::map_io_error)?;
        file.flush().await.map_err(Self::map_io_error)?;

        debug!(file = %file_label(path), size = data.len(), "Appended to file");
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).await.map_err(Self::map_io_error)?;
        debug!(file = %file_label(path), "Deleted file");
        Ok(())
    }
}
