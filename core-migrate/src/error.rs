use bridge_traits::error::BridgeError;
use core_auth::AuthError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Remote service error: {0}")]
    RemoteService(#[source] BridgeError),

    #[error("Download of {name} failed: {source}")]
    Download {
        name: String,
        #[source]
        source: BridgeError,
    },

    #[error("Upload of {name} failed: {source}")]
    UploadInit {
        name: String,
        #[source]
        source: BridgeError,
    },

    #[error("Failed to write report {}: {source}", .path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: BridgeError,
    },

    #[error("Scratch file error at {}: {source}", .path.display())]
    Scratch {
        path: PathBuf,
        #[source]
        source: BridgeError,
    },

    #[error(transparent)]
    Config(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, MigrationError>;
