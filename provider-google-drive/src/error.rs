//! Error types for Google Drive provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum GoogleDriveError {
    /// API request returned an error
    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// File not found
    #[error("File not found: {file_id}")]
    FileNotFound { file_id: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Missing or malformed `Content-Range` on a partial response
    #[error("Invalid Content-Range header: {0}")]
    InvalidContentRange(String),

    /// Full content came back for a request that started past byte zero
    #[error("Range request at offset {offset} was answered with the full file")]
    RangeIgnored { offset: u64 },

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, GoogleDriveError>;

impl From<GoogleDriveError> for BridgeError {
    fn from(error: GoogleDriveError) -> Self {
        match error {
            GoogleDriveError::ApiError {
                status_code,
                message,
            } => BridgeError::HttpStatus {
                status: status_code,
                message: format!("Google Drive: {}", message),
            },
            GoogleDriveError::FileNotFound { file_id } => BridgeError::HttpStatus {
                status: 404,
                message: format!("Google Drive file not found: {}", file_id),
            },
            GoogleDriveError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Google Drive parse error: {}", msg))
            }
            GoogleDriveError::InvalidContentRange(msg) => BridgeError::OperationFailed(format!(
                "Google Drive invalid Content-Range: {}",
                msg
            )),
            GoogleDriveError::RangeIgnored { offset } => BridgeError::OperationFailed(format!(
                "Google Drive ignored Range at offset {}",
                offset
            )),
            GoogleDriveError::BridgeError(e) => e,
        }
    }
}
