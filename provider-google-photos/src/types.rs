//! Google Photos Library API request and response types
//!
//! See: https://developers.google.com/photos/library/reference/rest/v1/mediaItems/batchCreate

use bridge_traits::media::{MediaItemResult, NewMediaItem};
use serde::{Deserialize, Serialize};

/// mediaItems.batchCreate request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateRequest {
    pub new_media_items: Vec<NewMediaItemBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMediaItemBody {
    pub description: String,
    pub simple_media_item: SimpleMediaItem,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleMediaItem {
    pub file_name: String,
    pub upload_token: String,
}

impl From<NewMediaItem> for NewMediaItemBody {
    fn from(item: NewMediaItem) -> Self {
        Self {
            description: item.description,
            simple_media_item: SimpleMediaItem {
                file_name: item.file_name,
                upload_token: item.upload_token,
            },
        }
    }
}

/// mediaItems.batchCreate response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateResponse {
    #[serde(default)]
    pub new_media_item_results: Vec<NewMediaItemResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMediaItemResult {
    #[serde(default)]
    pub upload_token: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub media_item: Option<MediaItem>,
}

/// google.rpc.Status
#[derive(Debug, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    #[serde(default)]
    pub product_url: Option<String>,
}

impl From<NewMediaItemResult> for MediaItemResult {
    fn from(result: NewMediaItemResult) -> Self {
        MediaItemResult {
            upload_token: result.upload_token,
            status_message: result.status.and_then(|status| status.message),
        }
    }
}
