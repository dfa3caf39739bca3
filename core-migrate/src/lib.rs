//! # Migration Core
//!
//! Copies images and videos from a [`MediaSource`](bridge_traits::MediaSource)
//! into a [`MediaLibrary`](bridge_traits::MediaLibrary), one file at a time.
//!
//! ## Components
//!
//! - **Lister** (`lister`): exhaustive paged listing
//! - **Transfer Pipeline** (`pipeline`): download, two-phase upload, report, cleanup
//! - **Report** (`report`): append-only outcome log
//! - **Progress** (`progress`): human-readable lines, printed or collected
//! - **Summary** (`summary`): MB/GB size line
//! - **Migration** (`migration`): the linear run with the quota guard

pub mod error;
pub mod lister;
pub mod migration;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod summary;

pub use error::{MigrationError, Result};
pub use lister::list_media_files;
pub use migration::{Migration, RunOutcome};
pub use pipeline::{ItemOutcome, RunSummary, TransferPipeline, ITEM_DESCRIPTION};
pub use progress::{CollectingProgress, ConsoleProgress, ProgressEvent, ProgressObserver};
pub use report::{ReportLine, UploadReport};
pub use summary::SizeSummary;
