//! End-to-end runs of `Migration` against in-memory services and a real
//! scratch directory.

use async_trait::async_trait;
use bridge_desktop::TokioFileSystem;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::media::{MediaItemResult, MediaLibrary, NewMediaItem, UploadToken};
use bridge_traits::storage::{DownloadChunk, FileSystemAccess, ListQuery, MediaSource, RemoteFile};
use bytes::Bytes;
use core_auth::OAuthTokens;
use core_migrate::{CollectingProgress, Migration, MigrationError, RunOutcome, RunSummary};
use core_runtime::{DownloadFailurePolicy, MigrationConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Drive stand-in: a fixed listing split into pages plus file contents
struct FakeDrive {
    files: Vec<RemoteFile>,
    contents: HashMap<String, Vec<u8>>,
    broken: Vec<String>,
    page_size_seen: Mutex<Option<u32>>,
    downloads: Mutex<Vec<String>>,
}

impl FakeDrive {
    fn new(files: Vec<(RemoteFile, Vec<u8>)>) -> Self {
        let contents = files
            .iter()
            .map(|(f, data)| (f.id.clone(), data.clone()))
            .collect();
        Self {
            files: files.into_iter().map(|(f, _)| f).collect(),
            contents,
            broken: Vec::new(),
            page_size_seen: Mutex::new(None),
            downloads: Mutex::new(Vec::new()),
        }
    }

    fn downloaded_ids(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaSource for FakeDrive {
    async fn list_page(
        &self,
        _access_token: &str,
        query: &ListQuery,
        page_token: Option<String>,
    ) -> BridgeResult<(Vec<RemoteFile>, Option<String>)> {
        *self.page_size_seen.lock().unwrap() = Some(query.page_size);

        let start: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + query.page_size as usize).min(self.files.len());
        let next = (end < self.files.len()).then(|| end.to_string());
        Ok((self.files[start..end].to_vec(), next))
    }

    async fn download_chunk(
        &self,
        _access_token: &str,
        file_id: &str,
        offset: u64,
        length: u64,
    ) -> BridgeResult<DownloadChunk> {
        if offset == 0 {
            self.downloads.lock().unwrap().push(file_id.to_string());
        }
        if self.broken.iter().any(|id| id == file_id) {
            return Err(BridgeError::HttpStatus {
                status: 500,
                message: "Internal Error".to_string(),
            });
        }
        let data = &self.contents[file_id];
        let start = (offset as usize).min(data.len());
        let end = (start + length as usize).min(data.len());
        Ok(DownloadChunk {
            data: Bytes::copy_from_slice(&data[start..end]),
            total_size: Some(data.len() as u64),
        })
    }
}

/// Photos stand-in recording both upload phases
#[derive(Default)]
struct FakePhotos {
    failing_names: Vec<String>,
    uploads: Mutex<Vec<String>>,
    created: Mutex<Vec<NewMediaItem>>,
}

#[async_trait]
impl MediaLibrary for FakePhotos {
    async fn upload_bytes(
        &self,
        _access_token: &str,
        file_name: &str,
        _mime_type: &str,
        _data: Bytes,
    ) -> BridgeResult<UploadToken> {
        self.uploads.lock().unwrap().push(file_name.to_string());
        Ok(UploadToken::new(format!("upload-{}", file_name)))
    }

    async fn batch_create(
        &self,
        _access_token: &str,
        items: Vec<NewMediaItem>,
    ) -> BridgeResult<Vec<MediaItemResult>> {
        let results = items
            .iter()
            .map(|item| {
                let message = if self.failing_names.contains(&item.file_name) {
                    "Failed to create media item"
                } else {
                    "Success"
                };
                MediaItemResult {
                    upload_token: Some(item.upload_token.clone()),
                    status_message: Some(message.to_string()),
                }
            })
            .collect();
        self.created.lock().unwrap().extend(items);
        Ok(results)
    }
}

/// Wraps a real file system and remembers every scratch file that was written
struct TrackingFs {
    inner: TokioFileSystem,
    written: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl FileSystemAccess for TrackingFs {
    async fn get_scratch_directory(&self) -> BridgeResult<PathBuf> {
        self.inner.get_scratch_directory().await
    }

    async fn exists(&self, path: &Path) -> BridgeResult<bool> {
        self.inner.exists(path).await
    }

    async fn read_file(&self, path: &Path) -> BridgeResult<Bytes> {
        self.inner.read_file(path).await
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> BridgeResult<()> {
        self.written.lock().unwrap().push(path.to_path_buf());
        self.inner.write_file(path, data).await
    }

    async fn append_file(&self, path: &Path, data: Bytes) -> BridgeResult<()> {
        self.inner.append_file(path, data).await
    }

    async fn delete_file(&self, path: &Path) -> BridgeResult<()> {
        self.inner.delete_file(path).await
    }
}

struct Run {
    _dir: tempfile::TempDir,
    scratch: PathBuf,
    report: PathBuf,
    drive: Arc<FakeDrive>,
    photos: Arc<FakePhotos>,
    fs: Arc<TrackingFs>,
    progress: Arc<CollectingProgress>,
    config: MigrationConfig,
}

impl Run {
    fn new(drive: FakeDrive, photos: FakePhotos) -> Self {
        Self::with_config(drive, photos, |b| b)
    }

    fn with_config(
        drive: FakeDrive,
        photos: FakePhotos,
        configure: impl FnOnce(core_runtime::MigrationConfigBuilder) -> core_runtime::MigrationConfigBuilder,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        let report = dir.path().join("upload_report.txt");
        let config = configure(
            MigrationConfig::builder()
                .scratch_dir(&scratch)
                .report_path(&report)
                .page_size(2),
        )
        .build()
        .unwrap();

        Self {
            fs: Arc::new(TrackingFs {
                inner: TokioFileSystem::new(&scratch),
                written: Mutex::new(Vec::new()),
            }),
            _dir: dir,
            scratch,
            report,
            drive: Arc::new(drive),
            photos: Arc::new(photos),
            progress: Arc::new(CollectingProgress::new()),
            config,
        }
    }

    async fn execute(&self) -> core_migrate::Result<RunOutcome> {
        let migration = Migration::new(
            &self.config,
            self.drive.clone(),
            self.photos.clone(),
            self.fs.clone(),
            self.progress.clone(),
        );
        migration.run(&OAuthTokens::new("access".to_string(), None, 3600)).await
    }

    fn report_contents(&self) -> String {
        std::fs::read_to_string(&self.report).unwrap_or_default()
    }

    fn leftover_scratch_files(&self) -> usize {
        std::fs::read_dir(&self.scratch)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

fn remote(id: &str, name: &str, mime: &str, size: Option<u64>) -> RemoteFile {
    RemoteFile {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: mime.to_string(),
        size,
    }
}

#[tokio::test]
async fn test_single_file_is_migrated_end_to_end() {
    let drive = FakeDrive::new(vec![(
        remote("1", "a.jpg", "image/jpeg", Some(1_048_576)),
        vec![7u8; 1_048_576],
    )]);
    let run = Run::new(drive, FakePhotos::default());

    let outcome = run.execute().await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Completed(RunSummary {
            items_processed: 1,
            items_uploaded: 1,
            items_failed: 0,
            total_bytes: 1_048_576,
        })
    );

    let written = run.fs.written.lock().unwrap().clone();
    assert_eq!(written, vec![run.scratch.join("a.jpg")]);
    assert_eq!(*run.photos.uploads.lock().unwrap(), vec!["a.jpg"]);
    assert_eq!(run.photos.created.lock().unwrap()[0].upload_token, "upload-a.jpg");
    assert_eq!(run.report_contents(), "Uploaded a.jpg to Google Photos\n");
    assert_eq!(run.leftover_scratch_files(), 0);

    assert_eq!(
        run.progress.lines(),
        vec![
            "Total images & videos: 1".to_string(),
            "Downloading a.jpg 100%.".to_string(),
            format!("Deleted temporary file: {}", run.scratch.join("a.jpg").display()),
            "Total size (MB): 1.0".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_listing_spans_pages_and_every_item_is_processed_once() {
    let drive = FakeDrive::new(
        (1..=5)
            .map(|i| {
                (
                    remote(&i.to_string(), &format!("{}.png", i), "image/png", Some(10)),
                    vec![0u8; 10],
                )
            })
            .collect(),
    );
    let run = Run::new(drive, FakePhotos::default());

    let outcome = run.execute().await.unwrap();

    assert!(matches!(outcome, RunOutcome::Completed(s) if s.items_uploaded == 5));
    assert_eq!(*run.drive.page_size_seen.lock().unwrap(), Some(2));
    assert_eq!(run.drive.downloaded_ids(), vec!["1", "2", "3", "4", "5"]);
    assert_eq!(run.report_contents().lines().count(), 5);
    assert_eq!(run.leftover_scratch_files(), 0);
}

#[tokio::test]
async fn test_failed_commit_is_reported_and_run_continues() {
    let drive = FakeDrive::new(vec![
        (remote("1", "a.jpg", "image/jpeg", Some(3)), b"abc".to_vec()),
        (remote("2", "clip.mp4", "video/mp4", Some(4)), b"abcd".to_vec()),
        (remote("3", "c.jpg", "image/jpeg", None), b"ab".to_vec()),
    ]);
    let photos = FakePhotos {
        failing_names: vec!["clip.mp4".to_string()],
        ..Default::default()
    };
    let run = Run::new(drive, photos);

    let outcome = run.execute().await.unwrap();

    // Declared sizes only; the missing size counts as zero
    assert!(matches!(
        outcome,
        RunOutcome::Completed(RunSummary {
            items_processed: 3,
            items_uploaded: 2,
            items_failed: 1,
            total_bytes: 7,
        })
    ));
    assert_eq!(
        run.report_contents(),
        "Uploaded a.jpg to Google Photos\n\
         Error! clip.mp4 upload failed.\n\
         Uploaded c.jpg to Google Photos\n"
    );
    assert_eq!(run.leftover_scratch_files(), 0);
}

#[tokio::test]
async fn test_empty_listing_prints_no_files() {
    let run = Run::new(FakeDrive::new(Vec::new()), FakePhotos::default());

    let outcome = run.execute().await.unwrap();

    assert_eq!(outcome, RunOutcome::NoFiles);
    assert_eq!(run.progress.lines(), vec!["No files found."]);
    assert!(!run.report.exists());
}

#[tokio::test]
async fn test_quota_guard_prevents_any_transfer() {
    let drive = FakeDrive::new(
        (1..=3)
            .map(|i| {
                (
                    remote(&i.to_string(), &format!("{}.jpg", i), "image/jpeg", Some(1)),
                    vec![1u8],
                )
            })
            .collect(),
    );
    let run = Run::with_config(drive, FakePhotos::default(), |b| b.max_items(2));

    let outcome = run.execute().await.unwrap();

    assert_eq!(outcome, RunOutcome::QuotaExceeded { count: 3 });
    assert_eq!(
        run.progress.lines(),
        vec![
            "Unable to run, total files exceed API limit of 2 / day. \
             Contact your developer for making the necessary modifications"
        ]
    );
    assert!(run.drive.downloaded_ids().is_empty());
    assert!(run.photos.uploads.lock().unwrap().is_empty());
    assert!(!run.report.exists());
}

#[tokio::test]
async fn test_broken_download_is_skipped_by_default() {
    let mut drive = FakeDrive::new(vec![
        (remote("1", "bad.jpg", "image/jpeg", Some(5)), b"xxxxx".to_vec()),
        (remote("2", "good.jpg", "image/jpeg", Some(2)), b"ok".to_vec()),
    ]);
    drive.broken.push("1".to_string());
    let run = Run::new(drive, FakePhotos::default());

    let outcome = run.execute().await.unwrap();

    assert!(matches!(outcome, RunOutcome::Completed(s) if s.items_failed == 1 && s.total_bytes == 7));
    assert_eq!(
        run.report_contents(),
        "Error! bad.jpg upload failed.\nUploaded good.jpg to Google Photos\n"
    );
    assert_eq!(*run.photos.uploads.lock().unwrap(), vec!["good.jpg"]);
}

#[tokio::test]
async fn test_broken_download_aborts_when_configured() {
    let mut drive = FakeDrive::new(vec![
        (remote("1", "bad.jpg", "image/jpeg", Some(5)), b"xxxxx".to_vec()),
        (remote("2", "good.jpg", "image/jpeg", Some(2)), b"ok".to_vec()),
    ]);
    drive.broken.push("1".to_string());
    let run = Run::with_config(drive, FakePhotos::default(), |b| {
        b.download_failure_policy(DownloadFailurePolicy::AbortRun)
    });

    let err = run.execute().await.unwrap_err();

    assert!(matches!(err, MigrationError::Download { .. }));
    assert_eq!(err.to_string(), "Download of bad.jpg failed: HTTP 500: Internal Error");
    assert_eq!(run.drive.downloaded_ids(), vec!["1"]);
    assert!(run.photos.uploads.lock().unwrap().is_empty());
    assert_eq!(run.leftover_scratch_files(), 0);
    assert!(!run
        .progress
        .lines()
        .iter()
        .any(|l| l.starts_with("Total size")));
}

#[tokio::test]
async fn test_size_summary_switches_to_gigabytes() {
    let two_gib = 2 * 1024 * 1024 * 1024;
    let drive = FakeDrive::new(vec![(
        remote("1", "huge.mov", "video/quicktime", Some(two_gib)),
        b"not really two gigabytes".to_vec(),
    )]);
    let run = Run::new(drive, FakePhotos::default());

    run.execute().await.unwrap();

    assert_eq!(
        run.progress.lines().last().map(String::as_str),
        Some("Total size (GB): 2.0")
    );
}
