//! File listing over a [`MediaSource`].

use crate::error::{MigrationError, Result};
use bridge_traits::storage::{ListQuery, MediaSource, RemoteFile};
use tracing::{debug, info, instrument};

/// Collect every file matching `query`, following continuation tokens
///
/// The whole result set is held in memory before returning. Items keep the
/// order the service returned them in.
///
/// # Errors
///
/// Any failed page request ends the listing with
/// [`MigrationError::RemoteService`].
#[instrument(skip(source, access_token), fields(filter = %query.filter, page_size = query.page_size))]
pub async fn list_media_files(
    source: &dyn MediaSource,
    access_token: &str,
    query: &ListQuery,
) -> Result<Vec<RemoteFile>> {
    let mut files = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let (page, next) = source
            .list_page(access_token, query, page_token.take())
            .await
            .map_err(MigrationError::RemoteService)?;

        pages += 1;
        debug!(page = pages, items = page.len(), "Fetched listing page");
        files.extend(page);

        match next {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    info!(total = files.len(), pages, "Listing complete");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::BridgeError;
    use bridge_traits::storage::DownloadChunk;
    use std::sync::Mutex;

    /// Returns canned pages and remembers which tokens were asked for
    struct PagedSource {
        pages: Vec<(Vec<RemoteFile>, Option<String>)>,
        fail_on_page: Option<usize>,
        seen_tokens: Mutex<Vec<Option<String>>>,
    }

    impl PagedSource {
        fn new(pages: Vec<(Vec<RemoteFile>, Option<String>)>) -> Self {
            Self {
                pages,
                fail_on_page: None,
                seen_tokens: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MediaSource for PagedSource {
        async fn list_page(
            &self,
            _access_token: &str,
            _query: &ListQuery,
            page_token: Option<String>,
        ) -> bridge_traits::error::Result<(Vec<RemoteFile>, Option<String>)> {
            let mut seen = self.seen_tokens.lock().unwrap();
            let index = seen.len();
            seen.push(page_token);

            if self.fail_on_page == Some(index) {
                return Err(BridgeError::HttpStatus {
                    status: 403,
                    message: "rate limited".to_string(),
                });
            }
            Ok(self.pages[index].clone())
        }

        async fn download_chunk(
            &self,
            _access_token: &str,
            _file_id: &str,
            _offset: u64,
            _length: u64,
        ) -> bridge_traits::error::Result<DownloadChunk> {
            unreachable!("listing never downloads")
        }
    }

    fn file(id: &str) -> RemoteFile {
        RemoteFile {
            id: id.to_string(),
            name: format!("{}.jpg", id),
            mime_type: "image/jpeg".to_string(),
            size: None,
        }
    }

    fn query() -> ListQuery {
        ListQuery {
            filter: "mimeType contains 'image/'".to_string(),
            page_size: 2,
        }
    }

    #[tokio::test]
    async fn test_follows_page_tokens_in_order() {
        let source = PagedSource::new(vec![
            (vec![file("1"), file("2")], Some("p2".to_string())),
            (vec![file("3"), file("4")], Some("p3".to_string())),
            (vec![file("5")], None),
        ]);

        let files = list_media_files(&source, "tok", &query()).await.unwrap();

        let ids: Vec<_> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(
            *source.seen_tokens.lock().unwrap(),
            vec![None, Some("p2".to_string()), Some("p3".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let source = PagedSource::new(vec![(Vec::new(), None)]);

        let files = list_media_files(&source, "tok", &query()).await.unwrap();

        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_empty_token_ends_listing() {
        let source = PagedSource::new(vec![(vec![file("1")], Some(String::new()))]);

        let files = list_media_files(&source, "tok", &query()).await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(source.seen_tokens.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_page_failure_is_remote_service_error() {
        let mut source = PagedSource::new(vec![(vec![file("1")], Some("p2".to_string()))]);
        source.fail_on_page = Some(1);

        let err = list_media_files(&source, "tok", &query()).await.unwrap_err();

        assert!(matches!(err, MigrationError::RemoteService(ref e) if e.status() == Some(403)));
    }
}
