//! # Migration Run
//!
//! Ties listing, the quota guard, the transfer pipeline and the size summary
//! into one linear run.
//!
//! ## Workflow
//!
//! 1. List every matching file
//! 2. Stop with `No files found.` when the listing is empty
//! 3. Stop before any transfer when the count is above the daily quota
//! 4. Print the item count and run the pipeline
//! 5. Print the total size in MB, or GB above 1 GiB
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_migrate::{ConsoleProgress, Migration, RunOutcome};
//!
//! let migration = Migration::new(&config, drive, photos, fs, Arc::new(ConsoleProgress));
//! match migration.run(&tokens).await? {
//!     RunOutcome::Completed(summary) => println!("{} uploaded", summary.items_uploaded),
//!     RunOutcome::NoFiles | RunOutcome::QuotaExceeded { .. } => {}
//! }
//! ```

use crate::error::Result;
use crate::lister::list_media_files;
use crate::pipeline::{RunSummary, TransferPipeline};
use crate::progress::{ProgressEvent, ProgressObserver};
use crate::report::UploadReport;
use bridge_traits::media::MediaLibrary;
use bridge_traits::storage::{FileSystemAccess, ListQuery, MediaSource};
use core_auth::OAuthTokens;
use core_runtime::MigrationConfig;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing matched the filter
    NoFiles,
    /// The listing was larger than the quota; nothing was transferred
    QuotaExceeded { count: usize },
    /// Every listed item went through the pipeline
    Completed(RunSummary),
}

pub struct Migration {
    source: Arc<dyn MediaSource>,
    pipeline: TransferPipeline,
    progress: Arc<dyn ProgressObserver>,
    query: ListQuery,
    max_items: usize,
}

impl Migration {
    pub fn new(
        config: &MigrationConfig,
        source: Arc<dyn MediaSource>,
        library: Arc<dyn MediaLibrary>,
        fs: Arc<dyn FileSystemAccess>,
        progress: Arc<dyn ProgressObserver>,
    ) -> Self {
        let report = UploadReport::new(fs.clone(), config.report_path.clone());
        let pipeline = TransferPipeline::new(
            source.clone(),
            library,
            fs,
            report,
            progress.clone(),
        )
        .with_chunk_size(config.chunk_size)
        .with_failure_policy(config.download_failure_policy);

        Self {
            source,
            pipeline,
            progress,
            query: ListQuery {
                filter: config.media_filter.clone(),
                page_size: config.page_size,
            },
            max_items: config.max_items,
        }
    }

    #[instrument(skip(self, tokens))]
    pub async fn run(&self, tokens: &OAuthTokens) -> Result<RunOutcome> {
        let files = list_media_files(self.source.as_ref(), &tokens.access_token, &self.query).await?;

        if files.is_empty() {
            self.progress.on_event(&ProgressEvent::NoFiles);
            return Ok(RunOutcome::NoFiles);
        }

        if files.len() > self.max_items {
            warn!(
                count = files.len(),
                limit = self.max_items,
                "Listing exceeds daily upload quota"
            );
            self.progress.on_event(&ProgressEvent::QuotaExceeded {
                limit: self.max_items,
            });
            return Ok(RunOutcome::QuotaExceeded { count: files.len() });
        }

        self.progress
            .on_event(&ProgressEvent::TotalItems(files.len()));

        let summary = self.pipeline.process_all(&files, tokens).await?;

        self.progress
            .on_event(&ProgressEvent::TotalSize(summary.size()));
        info!(
            uploaded = summary.items_uploaded,
            failed = summary.items_failed,
            "Migration finished"
        );

        Ok(RunOutcome::Completed(summary))
    }
}
