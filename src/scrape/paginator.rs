//! Bookmark-cursor pagination.
//!
//! Every listing endpoint speaks the same protocol: each page carries an
//! opaque continuation bookmark, an absent bookmark ends the stream, and a
//! bookmark identical to the previous one also ends it (a server echoing a
//! stale cursor would otherwise loop the crawl forever). Cursors are never
//! persisted; every crawl starts from `None`.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;

use crate::api::types::ResourceResponse;
use crate::cancel::CancelToken;
use crate::error::Result;

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub bookmark: Option<String>,
}

impl<T> Page<T> {
    /// Lift a resource response into a page. A `None` data field means the
    /// backend has no payload ready yet; the paginator retries it.
    pub fn from_resource(resource: ResourceResponse<Vec<T>>) -> Option<Self> {
        resource.data.map(|items| Page {
            items,
            bookmark: resource.bookmark,
        })
    }
}

/// The page-fetch seam: one implementation per listing endpoint scope.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    type Item: Send;

    /// Fetch the page at `bookmark` (`None` = first page). `Ok(None)` means
    /// the page was not ready and should be retried at the same cursor.
    async fn fetch_page(&self, bookmark: Option<&str>) -> Result<Option<Page<Self::Item>>>;
}

/// Default bound on same-cursor retries (null pages and transient errors).
const DEFAULT_MAX_PAGE_RETRIES: u32 = 3;

/// Default base politeness delay between pages; the actual pause is
/// randomized between one and two times this.
const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(1);

/// Generic bookmark-cursor crawl loop.
pub struct CursorPaginator {
    label: String,
    cancel: CancelToken,
    expected_total: Option<u64>,
    max_page_retries: u32,
    page_delay: Duration,
}

impl CursorPaginator {
    pub fn new(label: impl Into<String>, cancel: CancelToken) -> Self {
        Self {
            label: label.into(),
            cancel,
            expected_total: None,
            max_page_retries: DEFAULT_MAX_PAGE_RETRIES,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }

    /// Advertise an expected item count for progress lines. Advisory only;
    /// the actual count may exceed or fall short.
    pub fn expected_total(mut self, total: u64) -> Self {
        self.expected_total = Some(total);
        self
    }

    pub fn max_page_retries(mut self, retries: u32) -> Self {
        self.max_page_retries = retries;
        self
    }

    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Walk the cursor chain and accumulate every page's items in order.
    ///
    /// Transient fetch errors and not-ready pages are retried at the *same*
    /// cursor (never advanced past), bounded by `max_page_retries`; exhausted
    /// null-page retries end the crawl with whatever was accumulated, while
    /// exhausted error retries propagate. Cancellation returns the partial
    /// result, never an error.
    pub async fn crawl<F: PageFetcher>(&self, fetcher: &F) -> Result<Vec<F::Item>> {
        let mut items = Vec::new();
        let mut bookmark: Option<String> = None;
        let mut retries: u32 = 0;
        let mut page_no: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!(
                    "{}: interrupted, returning {} items scraped so far",
                    self.label,
                    items.len()
                );
                break;
            }

            let page = match fetcher.fetch_page(bookmark.as_deref()).await {
                Ok(page) => page,
                Err(e) if e.is_transient() && retries < self.max_page_retries => {
                    retries += 1;
                    tracing::warn!(
                        "{}: transient error at current cursor (retry {}/{}): {}",
                        self.label,
                        retries,
                        self.max_page_retries,
                        e
                    );
                    self.pause().await;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Some(page) = page else {
                if retries >= self.max_page_retries {
                    tracing::warn!(
                        "{}: page still empty after {} retries, stopping crawl",
                        self.label,
                        retries
                    );
                    break;
                }
                retries += 1;
                tracing::debug!("{}: received null page, retrying same cursor", self.label);
                self.pause().await;
                continue;
            };

            retries = 0;
            page_no += 1;
            items.extend(page.items);

            match self.expected_total {
                Some(total) => tracing::info!(
                    "{}: page {}: {} of {} scraped",
                    self.label,
                    page_no,
                    items.len(),
                    total
                ),
                None => tracing::info!("{}: page {}: {} scraped", self.label, page_no, items.len()),
            }

            match page.bookmark {
                None => break,
                Some(next) if bookmark.as_deref() == Some(next.as_str()) => {
                    tracing::debug!("{}: bookmark repeated, treating as end of stream", self.label);
                    break;
                }
                Some(next) => bookmark = Some(next),
            }

            self.pause().await;
        }

        Ok(items)
    }

    async fn pause(&self) {
        if self.page_delay.is_zero() {
            return;
        }
        let factor = 1.0 + rand::thread_rng().gen_range(0.0..1.0);
        sleep(self.page_delay.mul_f64(factor)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed script of fetch results, recording the cursor each
    /// call was made with.
    struct ScriptedFetcher {
        script: Mutex<Vec<Result<Option<Page<u32>>>>>,
        calls: AtomicU32,
        cursors_seen: Mutex<Vec<Option<String>>>,
        cancel_on_first_call: Option<CancelToken>,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Result<Option<Page<u32>>>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicU32::new(0),
                cursors_seen: Mutex::new(Vec::new()),
                cancel_on_first_call: None,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        type Item = u32;

        async fn fetch_page(&self, bookmark: Option<&str>) -> Result<Option<Page<u32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.cursors_seen
                .lock()
                .unwrap()
                .push(bookmark.map(String::from));
            if let Some(token) = &self.cancel_on_first_call {
                token.cancel();
            }
            self.script.lock().unwrap().remove(0)
        }
    }

    fn page(items: &[u32], bookmark: Option<&str>) -> Result<Option<Page<u32>>> {
        Ok(Some(Page {
            items: items.to_vec(),
            bookmark: bookmark.map(String::from),
        }))
    }

    fn paginator() -> CursorPaginator {
        CursorPaginator::new("test", CancelToken::new()).page_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_terminates_on_absent_bookmark() {
        let fetcher = ScriptedFetcher::new(vec![
            page(&[1, 2], Some("a")),
            page(&[3], Some("b")),
            page(&[4], None),
        ]);

        let items = paginator().crawl(&fetcher).await.unwrap();
        assert_eq!(items, vec![1, 2, 3, 4]);
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_stale_cursor_ends_crawl_without_extra_page() {
        let fetcher = ScriptedFetcher::new(vec![page(&[1], Some("a")), page(&[2], Some("a"))]);

        let items = paginator().crawl(&fetcher).await.unwrap();
        assert_eq!(items, vec![1, 2]);
        // The repeated bookmark must end the crawl after the second fetch.
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_null_page_retried_at_same_cursor() {
        let fetcher = ScriptedFetcher::new(vec![
            page(&[1], Some("a")),
            Ok(None),
            Ok(None),
            page(&[2], None),
        ]);

        let items = paginator().crawl(&fetcher).await.unwrap();
        assert_eq!(items, vec![1, 2]);

        let cursors = fetcher.cursors_seen.lock().unwrap().clone();
        assert_eq!(
            cursors,
            vec![
                None,
                Some("a".to_string()),
                Some("a".to_string()),
                Some("a".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_permanently_null_page_stops_after_bound() {
        let fetcher = ScriptedFetcher::new(vec![Ok(None), Ok(None), Ok(None)]);

        let items = paginator()
            .max_page_retries(2)
            .crawl(&fetcher)
            .await
            .unwrap();
        assert!(items.is_empty());
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_transient_error_retries_same_cursor() {
        let fetcher = ScriptedFetcher::new(vec![
            Err(Error::Api("upstream hiccup".into())),
            page(&[7], None),
        ]);

        let items = paginator().crawl(&fetcher).await.unwrap();
        assert_eq!(items, vec![7]);

        let cursors = fetcher.cursors_seen.lock().unwrap().clone();
        assert_eq!(cursors, vec![None, None]);
    }

    #[tokio::test]
    async fn test_terminal_error_propagates() {
        let fetcher = ScriptedFetcher::new(vec![Err(Error::UserNotFound("ghost".into()))]);

        let result = paginator().crawl(&fetcher).await;
        assert!(matches!(result, Err(Error::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancellation_returns_partial_result() {
        let cancel = CancelToken::new();
        let mut fetcher = ScriptedFetcher::new(vec![page(&[1, 2], Some("a"))]);
        fetcher.cancel_on_first_call = Some(cancel.clone());

        let items = CursorPaginator::new("test", cancel)
            .page_delay(Duration::ZERO)
            .crawl(&fetcher)
            .await
            .unwrap();

        // First page is returned; the cancelled loop never asks for a second.
        assert_eq!(items, vec![1, 2]);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_progress_total_is_advisory() {
        // More items than advertised must not error or truncate.
        let fetcher = ScriptedFetcher::new(vec![page(&[1, 2, 3], None)]);

        let items = paginator()
            .expected_total(1)
            .crawl(&fetcher)
            .await
            .unwrap();
        assert_eq!(items.len(), 3);
    }
}
