//! Google Drive API connector implementation
//!
//! Implements the `MediaSource` trait for Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::storage::{DownloadChunk, ListQuery, MediaSource, RemoteFile};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::GoogleDriveError;
use crate::types::{ContentRange, FilesListResponse};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Fields requested for each listing page
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size)";

/// Google Drive API connector
///
/// # Features
///
/// - Paginated file listing with a caller-supplied `q` filter
/// - Ranged downloads that report the total content size
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::GoogleDriveConnector;
/// use bridge_traits::storage::{ListQuery, MediaSource};
///
/// let connector = GoogleDriveConnector::new(http_client);
/// let query = ListQuery { filter: "mimeType contains 'image/'".into(), page_size: 100 };
/// let (files, next_page) = connector.list_page(&access_token, &query, None).await?;
/// ```
pub struct GoogleDriveConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl GoogleDriveConnector {
    /// Create a new Google Drive connector
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_base_url(http_client, DRIVE_API_BASE)
    }

    /// Create a connector against a different API root
    pub fn with_base_url(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn list_url(&self, query: &ListQuery, page_token: Option<&str>) -> String {
        let mut url = format!(
            "{}/files?q={}&pageSize={}&fields={}",
            self.base_url,
            urlencoding::encode(&query.filter),
            query.page_size,
            urlencoding::encode(LIST_FIELDS)
        );

        if let Some(page_token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(page_token)));
        }

        url
    }

    fn media_url(&self, file_id: &str) -> String {
        format!(
            "{}/files/{}?alt=media",
            self.base_url,
            urlencoding::encode(file_id)
        )
    }

    fn api_error(response: &HttpResponse) -> GoogleDriveError {
        GoogleDriveError::ApiError {
            status_code: response.status,
            message: String::from_utf8_lossy(&response.body).to_string(),
        }
    }

    fn content_range(response: &HttpResponse) -> std::result::Result<ContentRange, GoogleDriveError> {
        let header = response.header("Content-Range").ok_or_else(|| {
            GoogleDriveError::InvalidContentRange("header missing".to_string())
        })?;

        ContentRange::parse(header)
            .ok_or_else(|| GoogleDriveError::InvalidContentRange(header.to_string()))
    }
}

#[async_trait]
impl MediaSource for GoogleDriveConnector {
    #[instrument(skip(self, access_token, query), fields(page_size = query.page_size))]
    async fn list_page(
        &self,
        access_token: &str,
        query: &ListQuery,
        page_token: Option<String>,
    ) -> Result<(Vec<RemoteFile>, Option<String>)> {
        let request = HttpRequest::new(HttpMethod::Get, self.list_url(query, page_token.as_deref()))
            .bearer_token(access_token)
            .header("Accept", "application/json");

        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            warn!(status = response.status, "Listing request failed");
            return Err(Self::api_error(&response).into());
        }

        let list_response: FilesListResponse =
            serde_json::from_slice(&response.body).map_err(|e| {
                GoogleDriveError::ParseError(format!("Failed to parse files list response: {}", e))
            })?;

        let files: Vec<RemoteFile> = list_response
            .files
            .into_iter()
            .map(RemoteFile::from)
            .collect();

        debug!(
            count = files.len(),
            has_more = list_response.next_page_token.is_some(),
            "Listed page from Google Drive"
        );

        Ok((files, list_response.next_page_token))
    }

    #[instrument(skip(self, access_token), fields(file_id = %file_id))]
    async fn download_chunk(
        &self,
        access_token: &str,
        file_id: &str,
        offset: u64,
        length: u64,
    ) -> Result<DownloadChunk> {
        let last_byte = offset + length.max(1) - 1;

        let request = HttpRequest::new(HttpMethod::Get, self.media_url(file_id))
            .bearer_token(access_token)
            .header("Range", format!("bytes={}-{}", offset, last_byte));

        let response = self.http_client.execute(request).await?;

        match response.status {
            206 => {
                let range = Self::content_range(&response)?;
                debug!(
                    received = response.body.len(),
                    total = ?range.total,
                    "Downloaded partial content"
                );
                Ok(DownloadChunk {
                    data: response.body,
                    total_size: range.total,
                })
            }
            // Range ignored: the body is the whole file
            200 if offset == 0 => {
                let total = response.body.len() as u64;
                info!(total, "Server returned full content for ranged request");
                Ok(DownloadChunk {
                    data: response.body,
                    total_size: Some(total),
                })
            }
            200 => {
                warn!(offset, "Server ignored Range on a continuation request");
                Err(GoogleDriveError::RangeIgnored { offset }.into())
            }
            416 => {
                // Zero-byte files answer any range with 416 and `bytes */0`
                let range = Self::content_range(&response)?;
                match range.total {
                    Some(total) if total <= offset => Ok(DownloadChunk {
                        data: bytes::Bytes::new(),
                        total_size: Some(total),
                    }),
                    _ => Err(Self::api_error(&response).into()),
                }
            }
            404 => Err(GoogleDriveError::FileNotFound {
                file_id: file_id.to_string(),
            }
            .into()),
            status => {
                warn!(status, "Download request failed");
                Err(Self::api_error(&response).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn query() -> ListQuery {
        ListQuery {
            filter: "mimeType contains 'image/' or mimeType contains 'video/'".to_string(),
            page_size: 100,
        }
    }

    fn response(status: u16, headers: &[(&str, &str)], body: impl Into<Bytes>) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            body: body.into(),
        }
    }

    #[tokio::test]
    async fn test_list_page_success() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Get
                    && req.url.starts_with("https://www.googleapis.com/drive/v3/files?q=")
                    && req.url.contains("pageSize=100")
                    && req.url.contains("mimeType%20contains%20%27image%2F%27")
                    && req.url.contains("fields=nextPageToken%2C%20files%28id%2C%20name%2C%20mimeType%2C%20size%29")
                    && !req.url.contains("pageToken=")
                    && req.headers.get("Authorization").map(String::as_str) == Some("Bearer tok")
            })
            .times(1)
            .returning(|_| {
                Ok(response(
                    200,
                    &[],
                    r#"{
                        "files": [
                            {"id": "1", "name": "a.jpg", "mimeType": "image/jpeg", "size": "10"},
                            {"id": "2", "name": "b.mp4", "mimeType": "video/mp4"}
                        ],
                        "nextPageToken": "next_page"
                    }"#,
                ))
            });

        let connector = GoogleDriveConnector::new(Arc::new(mock_http));
        let (files, cursor) = connector.list_page("tok", &query(), None).await.unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "a.jpg");
        assert_eq!(files[0].size, Some(10));
        assert_eq!(files[1].size, None);
        assert_eq!(cursor, Some("next_page".to_string()));
    }

    #[tokio::test]
    async fn test_list_page_forwards_page_token() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| req.url.ends_with("&pageToken=abc%2Fdef"))
            .times(1)
            .returning(|_| Ok(response(200, &[], r#"{"files": []}"#)));

        let connector = GoogleDriveConnector::new(Arc::new(mock_http));
        let (files, cursor) = connector
            .list_page("tok", &query(), Some("abc/def".to_string()))
            .await
            .unwrap();

        assert!(files.is_empty());
        assert_eq!(cursor, None);
    }

    #[tokio::test]
    async fn test_list_page_api_error() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Ok(response(403, &[], "rateLimitExceeded")));

        let connector = GoogleDriveConnector::new(Arc::new(mock_http));
        let err = connector.list_page("tok", &query(), None).await.unwrap_err();

        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("rateLimitExceeded"));
    }

    #[tokio::test]
    async fn test_list_page_malformed_body() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Ok(response(200, &[], "<html>")));

        let connector = GoogleDriveConnector::new(Arc::new(mock_http));
        let err = connector.list_page("tok", &query(), None).await.unwrap_err();

        assert!(matches!(err, BridgeError::OperationFailed(_)));
    }

    #[tokio::test]
    async fn test_download_chunk_partial_content() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| {
                req.url == "https://www.googleapis.com/drive/v3/files/file1?alt=media"
                    && req.headers.get("Range").map(String::as_str) == Some("bytes=4-7")
            })
            .times(1)
            .returning(|_| {
                Ok(response(
                    206,
                    &[("content-range", "bytes 4-7/10")],
                    vec![4u8, 5, 6, 7],
                ))
            });

        let connector = GoogleDriveConnector::new(Arc::new(mock_http));
        let chunk = connector.download_chunk("tok", "file1", 4, 4).await.unwrap();

        assert_eq!(&chunk.data[..], &[4, 5, 6, 7]);
        assert_eq!(chunk.total_size, Some(10));
    }

    #[tokio::test]
    async fn test_download_chunk_full_body() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Ok(response(200, &[], vec![1u8, 2, 3])));

        let connector = GoogleDriveConnector::new(Arc::new(mock_http));
        let chunk = connector.download_chunk("tok", "f", 0, 1024).await.unwrap();

        assert_eq!(chunk.data.len(), 3);
        assert_eq!(chunk.total_size, Some(3));
    }

    #[tokio::test]
    async fn test_download_chunk_full_body_past_first_chunk_is_rejected() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .withf(|req| req.headers.get("Range").map(String::as_str) == Some("bytes=4-7"))
            .times(1)
            .returning(|_| Ok(response(200, &[], vec![0u8; 10])));

        let connector = GoogleDriveConnector::new(Arc::new(mock_http));
        let err = connector.download_chunk("tok", "f", 4, 4).await.unwrap_err();

        assert!(matches!(err, BridgeError::OperationFailed(_)));
        assert!(err.to_string().contains("offset 4"));
    }

    #[tokio::test]
    async fn test_download_chunk_empty_file() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Ok(response(416, &[("Content-Range", "bytes */0")], Bytes::new())));

        let connector = GoogleDriveConnector::new(Arc::new(mock_http));
        let chunk = connector.download_chunk("tok", "empty", 0, 1024).await.unwrap();

        assert!(chunk.data.is_empty());
        assert_eq!(chunk.total_size, Some(0));
    }

    #[tokio::test]
    async fn test_download_chunk_missing_content_range() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Ok(response(206, &[], vec![0u8; 4])));

        let connector = GoogleDriveConnector::new(Arc::new(mock_http));
        let err = connector.download_chunk("tok", "f", 0, 4).await.unwrap_err();

        assert!(err.to_string().contains("Content-Range"));
    }

    #[tokio::test]
    async fn test_download_chunk_not_found() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Ok(response(404, &[], "notFound")));

        let connector = GoogleDriveConnector::new(Arc::new(mock_http));
        let err = connector.download_chunk("tok", "gone", 0, 4).await.unwrap_err();

        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .returning(|_| Err(BridgeError::OperationFailed("Connection failed".to_string())));

        let connector = GoogleDriveConnector::with_base_url(Arc::new(mock_http), "http://drive.test/");
        let err = connector.download_chunk("tok", "f", 0, 4).await.unwrap_err();

        assert!(err.to_string().contains("Connection failed"));
    }
}
