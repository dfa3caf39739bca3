//! # Migration Configuration
//!
//! Every path, limit and policy the migration uses lives in one
//! [`MigrationConfig`] value that is built once at startup and passed
//! explicitly to the components that need it.
//!
//! ## Usage
//!
//! ### Defaults
//!
//! ```
//! use core_runtime::config::MigrationConfig;
//!
//! let config = MigrationConfig::builder().build().unwrap();
//! assert_eq!(config.max_items, 10_000);
//! ```
//!
//! ### Environment overrides
//!
//! ```ignore
//! use core_runtime::config::MigrationConfig;
//!
//! // MIGRATOR_REPORT_PATH=/var/log/photos.txt MIGRATOR_PAGE_SIZE=500
//! let config = MigrationConfig::from_env()?;
//! ```
//!
//! ## Error Handling
//!
//! The builder validates every value and reports the offending setting:
//!
//! ```
//! use core_runtime::config::MigrationConfig;
//!
//! let err = MigrationConfig::builder().page_size(0).build().unwrap_err();
//! assert!(err.to_string().contains("Page size"));
//! ```

use crate::error::{Error, Result};
use crate::logging::LogFormat;
use bridge_traits::LogLevel;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Drive query selecting images and videos
pub const DEFAULT_MEDIA_FILTER: &str = "mimeType contains 'image/' or mimeType contains 'video/'";

/// Daily upload quota of the Photos Library API
pub const DEFAULT_MAX_ITEMS: usize = 10_000;

/// Download chunk size, matching the Google client libraries (100 MiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 100 * 1024 * 1024;

const MIN_CHUNK_SIZE: u64 = 64 * 1024;
const MAX_PAGE_SIZE: u32 = 1000;

/// What to do when downloading one file fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadFailurePolicy {
    /// Record the item as failed and continue with the next one
    #[default]
    SkipItem,
    /// Stop the whole run and surface the error
    AbortRun,
}

impl FromStr for DownloadFailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "skip" | "skip_item" => Ok(Self::SkipItem),
            "abort" | "abort_run" => Ok(Self::AbortRun),
            other => Err(Error::Config(format!(
                "Unknown download failure policy '{}': expected 'skip' or 'abort'",
                other
            ))),
        }
    }
}

impl fmt::Display for DownloadFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkipItem => write!(f, "skip"),
            Self::AbortRun => write!(f, "abort"),
        }
    }
}

/// Configuration for one migration run.
///
/// Use [`MigrationConfigBuilder`] (or [`MigrationConfig::from_env`]) to
/// construct instances; both validate before returning.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationConfig {
    /// Persisted OAuth token set, read and written wholesale
    pub token_path: PathBuf,

    /// OAuth client secrets JSON, needed only for interactive consent
    pub client_secret_path: PathBuf,

    /// Directory for transient copies of remote files
    pub scratch_dir: PathBuf,

    /// Append-only outcome log
    pub report_path: PathBuf,

    /// Source listing query
    pub media_filter: String,

    /// Items requested per listing page
    pub page_size: u32,

    /// Bytes requested per download chunk
    pub chunk_size: u64,

    /// Abort before any transfer when more items than this are listed
    pub max_items: usize,

    /// Local port receiving the OAuth redirect
    pub callback_port: u16,

    /// How long to wait for the user to finish consent
    pub consent_timeout: Duration,

    /// Behavior when a single download fails
    pub download_failure_policy: DownloadFailurePolicy,

    /// Attempts per HTTP request (1 = no retry)
    pub http_max_attempts: u32,

    /// Log verbosity for the diagnostic log stream
    pub log_level: LogLevel,

    /// Log output format
    pub log_format: LogFormat,
}

impl MigrationConfig {
    /// Creates a new builder pre-filled with defaults
    pub fn builder() -> MigrationConfigBuilder {
        MigrationConfigBuilder::default()
    }

    /// Build a configuration from `MIGRATOR_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    ///
    /// Recognized keys: `MIGRATOR_TOKEN_PATH`, `MIGRATOR_CLIENT_SECRET_PATH`,
    /// `MIGRATOR_SCRATCH_DIR`, `MIGRATOR_REPORT_PATH`, `MIGRATOR_PAGE_SIZE`,
    /// `MIGRATOR_CHUNK_SIZE`, `MIGRATOR_CALLBACK_PORT`,
    /// `MIGRATOR_CONSENT_TIMEOUT_SECS`, `MIGRATOR_DOWNLOAD_FAILURE_POLICY`,
    /// `MIGRATOR_HTTP_MAX_ATTEMPTS`, `MIGRATOR_LOG`, `MIGRATOR_LOG_FORMAT`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(v) = lookup("MIGRATOR_TOKEN_PATH") {
            builder = builder.token_path(v);
        }
        if let Some(v) = lookup("MIGRATOR_CLIENT_SECRET_PATH") {
            builder = builder.client_secret_path(v);
        }
        if let Some(v) = lookup("MIGRATOR_SCRATCH_DIR") {
            builder = builder.scratch_dir(v);
        }
        if let Some(v) = lookup("MIGRATOR_REPORT_PATH") {
            builder = builder.report_path(v);
        }
        if let Some(v) = lookup("MIGRATOR_PAGE_SIZE") {
            builder = builder.page_size(parse_number("MIGRATOR_PAGE_SIZE", &v)?);
        }
        if let Some(v) = lookup("MIGRATOR_CHUNK_SIZE") {
            builder = builder.chunk_size(parse_number("MIGRATOR_CHUNK_SIZE", &v)?);
        }
        if let Some(v) = lookup("MIGRATOR_CALLBACK_PORT") {
            builder = builder.callback_port(parse_number("MIGRATOR_CALLBACK_PORT", &v)?);
        }
        if let Some(v) = lookup("MIGRATOR_CONSENT_TIMEOUT_SECS") {
            let secs: u64 = parse_number("MIGRATOR_CONSENT_TIMEOUT_SECS", &v)?;
            builder = builder.consent_timeout(Duration::from_secs(secs));
        }
        if let Some(v) = lookup("MIGRATOR_DOWNLOAD_FAILURE_POLICY") {
            builder = builder.download_failure_policy(v.parse()?);
        }
        if let Some(v) = lookup("MIGRATOR_HTTP_MAX_ATTEMPTS") {
            builder = builder.http_max_attempts(parse_number("MIGRATOR_HTTP_MAX_ATTEMPTS", &v)?);
        }
        if let Some(v) = lookup("MIGRATOR_LOG") {
            builder = builder.log_level(
                v.parse()
                    .map_err(|e| Error::Config(format!("MIGRATOR_LOG: {}", e)))?,
            );
        }
        if let Some(v) = lookup("MIGRATOR_LOG_FORMAT") {
            builder = builder.log_format(v.parse()?);
        }

        builder.build()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("Token path", &self.token_path),
            ("Client secret path", &self.client_secret_path),
            ("Scratch directory", &self.scratch_dir),
            ("Report path", &self.report_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(Error::Config(format!("{} cannot be empty", name)));
            }
        }

        if self.token_path.file_name().is_none() {
            return Err(Error::Config(
                "Token path must name a file, not a directory".to_string(),
            ));
        }

        if self.media_filter.trim().is_empty() {
            return Err(Error::Config("Media filter cannot be empty".to_string()));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(Error::Config(format!(
                "Chunk size must be at least {} bytes",
                MIN_CHUNK_SIZE
            )));
        }

        if self.max_items == 0 {
            return Err(Error::Config(
                "Item limit must be greater than 0".to_string(),
            ));
        }

        if self.callback_port == 0 {
            return Err(Error::Config(
                "Callback port must be fixed; it is part of the registered redirect URI"
                    .to_string(),
            ));
        }

        if self.consent_timeout.is_zero() {
            return Err(Error::Config(
                "Consent timeout must be greater than 0".to_string(),
            ));
        }

        if self.http_max_attempts == 0 {
            return Err(Error::Config(
                "HTTP attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, value)))
}

/// Builder for [`MigrationConfig`]
#[derive(Debug, Clone)]
pub struct MigrationConfigBuilder {
    config: MigrationConfig,
}

impl Default for MigrationConfigBuilder {
    fn default() -> Self {
        Self {
            config: MigrationConfig {
                token_path: PathBuf::from("token.json"),
                client_secret_path: PathBuf::from("credentials.json"),
                scratch_dir: std::env::temp_dir(),
                report_path: PathBuf::from("upload_report.txt"),
                media_filter: DEFAULT_MEDIA_FILTER.to_string(),
                page_size: 100,
                chunk_size: DEFAULT_CHUNK_SIZE,
                max_items: DEFAULT_MAX_ITEMS,
                callback_port: 8080,
                consent_timeout: Duration::from_secs(300),
                download_failure_policy: DownloadFailurePolicy::default(),
                http_max_attempts: 1,
                log_level: LogLevel::Warn,
                log_format: LogFormat::Compact,
            },
        }
    }
}

impl MigrationConfigBuilder {
    pub fn token_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.token_path = path.into();
        self
    }

    pub fn client_secret_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.client_secret_path = path.into();
        self
    }

    pub fn scratch_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.scratch_dir = path.into();
        self
    }

    pub fn report_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.report_path = path.into();
        self
    }

    pub fn media_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.media_filter = filter.into();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    pub fn max_items(mut self, max_items: usize) -> Self {
        self.config.max_items = max_items;
        self
    }

    pub fn callback_port(mut self, port: u16) -> Self {
        self.config.callback_port = port;
        self
    }

    pub fn consent_timeout(mut self, timeout: Duration) -> Self {
        self.config.consent_timeout = timeout;
        self
    }

    pub fn download_failure_policy(mut self, policy: DownloadFailurePolicy) -> Self {
        self.config.download_failure_policy = policy;
        self
    }

    pub fn http_max_attempts(mut self, attempts: u32) -> Self {
        self.config.http_max_attempts = attempts;
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.log_level = level;
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.config.log_format = format;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<MigrationConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
