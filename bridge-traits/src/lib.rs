//! # Host Bridge Traits
//!
//! Capability traits that the migration core depends on but that are
//! implemented per host (desktop today).
//!
//! ## Overview
//!
//! The core never talks to `reqwest`, the filesystem or a TCP socket directly.
//! Every side effect goes through one of the traits below so the pipeline can
//! be exercised in tests with in-memory stand-ins.
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with an optional retry policy
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Scratch files and the report log
//!
//! ### Credentials
//! - [`SecureStore`](storage::SecureStore) - Token persistence
//! - [`AuthCallbackListener`](auth::AuthCallbackListener) - Receives the OAuth redirect
//!
//! ### Remote services
//! - [`MediaSource`](storage::MediaSource) - Lists and downloads files from the source account
//! - [`MediaLibrary`](media::MediaLibrary) - Uploads bytes and creates library items
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert their own error types at the boundary and keep the message
//! actionable (status code, path, endpoint).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be held behind `Arc`
//! and used from any tokio task.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod auth;
pub mod error;
pub mod http;
pub mod log;
pub mod media;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use auth::{AuthCallbackListener, AuthorizationCallback};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use log::LogLevel;
pub use media::{MediaItemResult, MediaLibrary, NewMediaItem, UploadToken};
pub use storage::{DownloadChunk, FileSystemAccess, ListQuery, MediaSource, RemoteFile, SecureStore};
