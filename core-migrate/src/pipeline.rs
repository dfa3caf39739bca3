//! # Transfer Pipeline
//!
//! Moves listed files one at a time from the source service into the photo
//! library.
//!
//! ## Per-item steps
//!
//! 1. Download the file in ranged chunks into `<scratch>/<name>`, reporting a
//!    percentage after every chunk
//! 2. Upload the scratch bytes and receive an upload token
//! 3. Commit the token with a single-item batch create
//! 4. Append the outcome to the report file
//! 5. Delete the scratch file
//!
//! Upload and commit failures are recorded as a failed report line and the
//! run moves on. A failed or truncated download either skips the item or
//! aborts the run, depending on [`DownloadFailurePolicy`]. Scratch and report
//! write failures always end the run. The scratch file is removed before the
//! next item starts in every case.

use crate::error::{MigrationError, Result};
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::report::{ReportLine, UploadReport};
use crate::summary::SizeSummary;
use bridge_traits::error::BridgeError;
use bridge_traits::media::{MediaItemResult, MediaLibrary, NewMediaItem};
use bridge_traits::storage::{FileSystemAccess, MediaSource, RemoteFile};
use core_auth::OAuthTokens;
use core_runtime::config::{DownloadFailurePolicy, DEFAULT_CHUNK_SIZE};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Description attached to every created library item
pub const ITEM_DESCRIPTION: &str = "Uploaded from Google Drive";

/// Counters for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub items_processed: usize,
    pub items_uploaded: usize,
    pub items_failed: usize,
    /// Sum of the declared sizes of every processed item
    pub total_bytes: u64,
}

impl RunSummary {
    pub fn size(&self) -> SizeSummary {
        SizeSummary::from_bytes(self.total_bytes)
    }
}

/// What happened to a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Uploaded,
    UploadFailed,
    DownloadFailed,
}

pub struct TransferPipeline {
    source: Arc<dyn MediaSource>,
    library: Arc<dyn MediaLibrary>,
    fs: Arc<dyn FileSystemAccess>,
    report: UploadReport,
    progress: Arc<dyn ProgressObserver>,
    chunk_size: u64,
    failure_policy: DownloadFailurePolicy,
}

impl TransferPipeline {
    pub fn new(
        source: Arc<dyn MediaSource>,
        library: Arc<dyn MediaLibrary>,
        fs: Arc<dyn FileSystemAccess>,
        report: UploadReport,
        progress: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            source,
            library,
            fs,
            report,
            progress,
            chunk_size: DEFAULT_CHUNK_SIZE,
            failure_policy: DownloadFailurePolicy::default(),
        }
    }

    /// Bytes requested per ranged download call. Zero is bumped to one.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_failure_policy(mut self, policy: DownloadFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Run every item through the pipeline, in order
    ///
    /// # Errors
    ///
    /// - `Download` when a chunk fails or the content ends short of its
    ///   declared size, and the policy is `AbortRun`
    /// - `Scratch` / `Report` when the local disk cannot be used
    #[instrument(skip(self, files, tokens), fields(items = files.len()))]
    pub async fn process_all(
        &self,
        files: &[RemoteFile],
        tokens: &OAuthTokens,
    ) -> Result<RunSummary> {
        let scratch_dir = self
            .fs
            .get_scratch_directory()
            .await
            .map_err(|source| MigrationError::Scratch {
                path: PathBuf::new(),
                source,
            })?;

        let mut summary = RunSummary::default();

        for file in files {
            summary.total_bytes += file.declared_size();

            let outcome = self
                .process_one(file, &scratch_dir, &tokens.access_token)
                .await?;

            summary.items_processed += 1;
            match outcome {
                ItemOutcome::Uploaded => summary.items_uploaded += 1,
                ItemOutcome::UploadFailed | ItemOutcome::DownloadFailed => {
                    summary.items_failed += 1
                }
            }
        }

        info!(
            processed = summary.items_processed,
            uploaded = summary.items_uploaded,
            failed = summary.items_failed,
            total_bytes = summary.total_bytes,
            "Transfer pipeline finished"
        );

        Ok(summary)
    }

    #[instrument(skip(self, file, scratch_dir, access_token), fields(file_id = %file.id, name = %file.name))]
    async fn process_one(
        &self,
        file: &RemoteFile,
        scratch_dir: &Path,
        access_token: &str,
    ) -> Result<ItemOutcome> {
        let scratch_path = scratch_dir.join(scratch_file_name(file));

        match self.download(file, &scratch_path, access_token).await {
            Ok(()) => {}
            Err(err @ MigrationError::Download { .. }) => {
                self.remove_scratch(&scratch_path).await?;

                return match self.failure_policy {
                    DownloadFailurePolicy::AbortRun => Err(err),
                    DownloadFailurePolicy::SkipItem => {
                        warn!(error = %err, "Download failed, skipping item");
                        self.report
                            .append(&ReportLine::Failed {
                                name: file.name.clone(),
                            })
                            .await?;
                        Ok(ItemOutcome::DownloadFailed)
                    }
                };
            }
            // Local disk trouble ends the run whatever the policy
            Err(err) => {
                self.remove_scratch(&scratch_path).await?;
                return Err(err);
            }
        }

        let uploaded = self.upload(file, &scratch_path, access_token).await;

        let line = match uploaded {
            Ok(true) => ReportLine::Uploaded {
                name: file.name.clone(),
            },
            Ok(false) => ReportLine::Failed {
                name: file.name.clone(),
            },
            Err(err) => {
                self.remove_scratch(&scratch_path).await?;
                return Err(err);
            }
        };
        self.report.append(&line).await?;

        self.remove_scratch(&scratch_path).await?;

        Ok(match line {
            ReportLine::Uploaded { .. } => ItemOutcome::Uploaded,
            ReportLine::Failed { .. } => ItemOutcome::UploadFailed,
        })
    }

    /// Write the remote content to `path` chunk by chunk
    async fn download(&self, file: &RemoteFile, path: &Path, access_token: &str) -> Result<()> {
        let mut received: u64 = 0;

        loop {
            let chunk = self
                .source
                .download_chunk(access_token, &file.id, received, self.chunk_size)
                .await
                .map_err(|source| MigrationError::Download {
                    name: file.name.clone(),
                    source,
                })?;

            let len = chunk.data.len() as u64;
            let written = if received == 0 {
                self.fs.write_file(path, chunk.data).await
            } else {
                self.fs.append_file(path, chunk.data).await
            };
            written.map_err(|source| MigrationError::Scratch {
                path: path.to_path_buf(),
                source,
            })?;
            received += len;

            if len == 0 {
                if let Some(total) = chunk.total_size.filter(|&total| received < total) {
                    return Err(MigrationError::Download {
                        name: file.name.clone(),
                        source: BridgeError::OperationFailed(format!(
                            "Download ended after {} of {} bytes",
                            received, total
                        )),
                    });
                }
            }

            let done = len == 0
                || match chunk.total_size {
                    Some(total) => received >= total,
                    None => len < self.chunk_size,
                };

            self.progress.on_event(&ProgressEvent::Downloading {
                name: file.name.clone(),
                percent: download_percent(received, chunk.total_size, done),
            });

            if done {
                debug!(bytes = received, "Download complete");
                return Ok(());
            }
        }
    }

    /// Two-phase upload of the scratch file
    ///
    /// `Ok(false)` covers every rejection by the library. Only a local read
    /// failure is an error.
    async fn upload(&self, file: &RemoteFile, path: &Path, access_token: &str) -> Result<bool> {
        let data = self
            .fs
            .read_file(path)
            .await
            .map_err(|source| MigrationError::Scratch {
                path: path.to_path_buf(),
                source,
            })?;

        let upload_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.name.clone());

        let token = match self
            .library
            .upload_bytes(access_token, &upload_name, &file.mime_type, data)
            .await
        {
            Ok(token) => token,
            Err(source) => {
                let err = MigrationError::UploadInit {
                    name: file.name.clone(),
                    source,
                };
                warn!(error = %err, "Upload init failed");
                return Ok(false);
            }
        };

        let item = NewMediaItem::new(token, file.name.clone(), ITEM_DESCRIPTION);
        match self.library.batch_create(access_token, vec![item]).await {
            Ok(results) => {
                let success = results.first().is_some_and(MediaItemResult::is_success);
                if !success {
                    warn!(
                        status = ?results.first().and_then(|r| r.status_message.as_deref()),
                        "Media item was not created"
                    );
                }
                Ok(success)
            }
            Err(e) => {
                warn!(error = %e, "batchCreate failed");
                Ok(false)
            }
        }
    }

    async fn remove_scratch(&self, path: &Path) -> Result<()> {
        let scratch_err = |source| MigrationError::Scratch {
            path: path.to_path_buf(),
            source,
        };

        if !self.fs.exists(path).await.map_err(scratch_err)? {
            return Ok(());
        }

        self.fs.delete_file(path).await.map_err(scratch_err)?;
        self.progress.on_event(&ProgressEvent::ScratchDeleted {
            path: path.to_path_buf(),
        });
        Ok(())
    }
}

/// Scratch files are named after the display name.
///
/// Only the last path component is kept so a name can't escape the scratch
/// directory. Names that leave nothing usable fall back to the file id.
fn scratch_file_name(file: &RemoteFile) -> String {
    file.name
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
        .unwrap_or(file.id.as_str())
        .to_string()
}

/// Whole percent received, rounded down
fn download_percent(received: u64, total: Option<u64>, done: bool) -> u8 {
    match total {
        Some(total) if total > 0 => {
            let pct = (u128::from(received) * 100 / u128::from(total)).min(100);
            pct as u8
        }
        _ if done => 100,
        _ => 0,
    }
}
