//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `FileSystemAccess` using `tokio::fs`
//! - `SecureStore` backed by plain files next to the token path
//! - `AuthCallbackListener` as a one-shot loopback HTTP listener
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, TokioFileSystem};
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let fs = TokioFileSystem::new(std::env::temp_dir());
//! }
//! ```

mod callback;
mod filesystem;
mod http;
mod secure_store;

pub use callback::LoopbackCallbackListener;
pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
pub use secure_store::FileSecureStore;
