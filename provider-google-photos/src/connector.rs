//! Google Photos Library API connector implementation
//!
//! Implements the `MediaLibrary` trait for the Photos Library API v1.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::media::{MediaItemResult, MediaLibrary, NewMediaItem, UploadToken};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::GooglePhotosError;
use crate::types::{BatchCreateRequest, BatchCreateResponse};

/// Photos Library API base URL
const PHOTOS_API_BASE: &str = "https://photoslibrary.googleapis.com/v1";

/// Google Photos Library API connector
///
/// # Example
///
/// ```ignore
/// use provider_google_photos::GooglePhotosConnector;
/// use bridge_traits::media::{MediaLibrary, NewMediaItem};
///
/// let photos = GooglePhotosConnector::new(http_client);
/// let token = photos.upload_bytes(&access_token, "a.jpg", "image/jpeg", bytes).await?;
/// let results = photos
///     .batch_create(&access_token, vec![NewMediaItem::new(token, "a.jpg", "Uploaded from Google Drive")])
///     .await?;
/// ```
pub struct GooglePhotosConnector {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl GooglePhotosConnector {
    /// Create a new Google Photos connector
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_base_url(http_client, PHOTOS_API_BASE)
    }

    /// Create a connector against a different API root
    pub fn with_base_url(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaLibrary for GooglePhotosConnector {
    #[instrument(skip(self, access_token, data), fields(size = data.len()))]
    async fn upload_bytes(
        &self,
        access_token: &str,
        file_name: &str,
        mime_type: &str,
        data: Bytes,
    ) -> Result<UploadToken> {
        let request = HttpRequest::new(HttpMethod::Post, format!("{}/uploads", self.base_url))
            .bearer_token(access_token)
            .header("Content-Type", "application/octet-stream")
            .header("X-Goog-Upload-File-Name", file_name)
            .header("X-Goog-Upload-Content-Type", mime_type)
            .header("X-Goog-Upload-Protocol", "raw")
            .body(data);

        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            warn!(status = response.status, "Upload rejected");
            return Err(GooglePhotosError::UploadRejected {
                status_code: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            }
            .into());
        }

        let token = response.text()?;
        if token.trim().is_empty() {
            return Err(GooglePhotosError::EmptyUploadToken.into());
        }

        debug!("Received upload token");
        Ok(UploadToken::new(token))
    }

    #[instrument(skip(self, access_token, items), fields(count = items.len()))]
    async fn batch_create(
        &self,
        access_token: &str,
        items: Vec<NewMediaItem>,
    ) -> Result<Vec<MediaItemResult>> {
        let body = BatchCreateRequest {
            new_media_items: items.into_iter().map(Into::into).collect(),
        };

        let request = HttpRequest::new(
            HttpMethod::Post,
            format!("{}/mediaItems:batchCreate", self.base_url),
        )
        .bearer_token(access_token)
        .json(&body)?;

        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            warn!(status = response.status, "batchCreate request failed");
            return Err(GooglePhotosError::ApiError {
                status_code: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
            }
            .into());
        }

        let parsed: BatchCreateResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GooglePhotosError::ParseError(format!("Failed to parse batchCreate response: {}", e))
        })?;

        let results: Vec<MediaItemResult> = parsed
            .new_media_item_results
            .into_iter()
            .map(MediaItemResult::from)
            .collect();

        debug!(
            results = results.len(),
            succeeded = results.iter().filter(|r| r.is_success()).count(),
            "batchCreate completed"
        );

        Ok(results)
    }
}
