//! Google Drive API response types
//!
//! Data structures for deserializing Google Drive API v3 responses.

use bridge_traits::storage::RemoteFile;
use serde::{Deserialize, Serialize};

/// Google Drive API file resource, restricted to the listed fields
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    /// File ID
    pub id: String,

    /// File name
    pub name: String,

    /// MIME type
    pub mime_type: String,

    /// File size in bytes, as a decimal string. Omitted for Google Docs
    /// formats and shortcuts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl From<DriveFile> for RemoteFile {
    fn from(file: DriveFile) -> Self {
        RemoteFile {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            size: file.size.and_then(|s| s.parse().ok()),
        }
    }
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    /// Files on this page; the key is absent when the page is empty
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for next page
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Parsed `Content-Range` header of a partial response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// First and last byte of the returned range, absent for `bytes */N`
    pub range: Option<(u64, u64)>,
    /// Complete size of the content, absent for `bytes a-b/*`
    pub total: Option<u64>,
}

impl ContentRange {
    /// Parse `bytes 0-99/1234`, `bytes */1234` or `bytes 0-99/*`
    pub fn parse(value: &str) -> Option<Self> {
        let spec = value.trim().strip_prefix("bytes")?.trim_start();
        let (range, total) = spec.split_once('/')?;

        let total = match total.trim() {
            "*" => None,
            n => Some(n.parse().ok()?),
        };

        let range = match range.trim() {
            "*" => None,
            r => {
                let (start, end) = r.split_once('-')?;
                let (start, end): (u64, u64) = (start.parse().ok()?, end.parse().ok()?);
                if end < start {
                    return None;
                }
                Some((start, end))
            }
        };

        Some(Self { range, total })
    }
}
