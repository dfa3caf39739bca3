//! Append-only upload report.

use crate::error::{MigrationError, Result};
use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Outcome line for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    Uploaded { name: String },
    Failed { name: String },
}

impl ReportLine {
    pub fn name(&self) -> &str {
        match self {
            ReportLine::Uploaded { name } | ReportLine::Failed { name } => name,
        }
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLine::Uploaded { name } => write!(f, "Uploaded {} to Google Photos", name),
            ReportLine::Failed { name } => write!(f, "Error! {} upload failed.", name),
        }
    }
}

/// Plain-text report file, one line per processed item
///
/// Lines are appended and never read back. Not safe for concurrent writers.
pub struct UploadReport {
    fs: Arc<dyn FileSystemAccess>,
    path: PathBuf,
}

impl UploadReport {
    pub fn new(fs: Arc<dyn FileSystemAccess>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub async fn append(&self, line: &ReportLine) -> Result<()> {
        self.fs
            .append_file(&self.path, Bytes::from(format!("{}\n", line)))
            .await
            .map_err(|source| MigrationError::Report {
                path: self.path.clone(),
                source,
            })?;

        debug!(name = %line.name(), "Report line written");
        Ok(())
    }
}
