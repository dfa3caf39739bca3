//! Error types for Google Photos provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Google Photos provider errors
#[derive(Error, Debug)]
pub enum GooglePhotosError {
    /// The upload endpoint refused the bytes
    #[error("Upload rejected (status {status_code}): {message}")]
    UploadRejected { status_code: u16, message: String },

    /// The upload endpoint answered without a token
    #[error("Upload response did not contain an upload token")]
    EmptyUploadToken,

    /// API request returned an error
    #[error("Google Photos API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Google Photos operations
pub type Result<T> = std::result::Result<T, GooglePhotosError>;

impl From<GooglePhotosError> for BridgeError {
    fn from(error: GooglePhotosError) -> Self {
        match error {
            GooglePhotosError::UploadRejected {
                status_code,
                message,
            } => BridgeError::HttpStatus {
                status: status_code,
                message: format!("Google Photos upload: {}", message),
            },
            GooglePhotosError::ApiError {
                status_code,
                message,
            } => BridgeError::HttpStatus {
                status: status_code,
                message: format!("Google Photos: {}", message),
            },
            GooglePhotosError::EmptyUploadToken | GooglePhotosError::ParseError(_) => {
                BridgeError::OperationFailed(error.to_string())
            }
            GooglePhotosError::BridgeError(e) => e,
        }
    }
}
