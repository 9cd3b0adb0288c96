//! Profile graph aggregation.
//!
//! Drives one paginator crawl over the board listing, one per board for its
//! pin feed, and one over the user's own created-pins stream. Crawls are
//! strictly sequential: cursor state is per-board and the listing endpoints
//! are rate-limit sensitive, so there is nothing to win by overlapping them.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;

use crate::api::client::ApiClient;
use crate::api::types::{RawBoardSummary, RawPin};
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::model::{board_from_raw, post_from_raw, Board, Post, User};
use crate::scrape::paginator::{CursorPaginator, Page, PageFetcher};

/// Type tag of real boards in the listing endpoint; the listing interleaves
/// other entities (section headers, story blocks) that must be dropped.
const BOARD_TYPE_TAG: &str = "board";

/// The listing endpoints the aggregator crawls, scoped per call.
///
/// `ApiClient` is the production implementation; tests substitute stubs.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn board_list_page(
        &self,
        username: &str,
        bookmark: Option<&str>,
    ) -> Result<Option<Page<RawBoardSummary>>>;

    async fn board_pins_page(
        &self,
        board_id: u64,
        board_url: &str,
        bookmark: Option<&str>,
    ) -> Result<Option<Page<RawPin>>>;

    async fn created_pins_page(
        &self,
        user_id: u64,
        username: &str,
        bookmark: Option<&str>,
    ) -> Result<Option<Page<RawPin>>>;
}

#[async_trait]
impl ProfileSource for ApiClient {
    async fn board_list_page(
        &self,
        username: &str,
        bookmark: Option<&str>,
    ) -> Result<Option<Page<RawBoardSummary>>> {
        ApiClient::board_list_page(self, username, bookmark).await
    }

    async fn board_pins_page(
        &self,
        board_id: u64,
        board_url: &str,
        bookmark: Option<&str>,
    ) -> Result<Option<Page<RawPin>>> {
        ApiClient::board_pins_page(self, board_id, board_url, bookmark).await
    }

    async fn created_pins_page(
        &self,
        user_id: u64,
        username: &str,
        bookmark: Option<&str>,
    ) -> Result<Option<Page<RawPin>>> {
        ApiClient::created_pins_page(self, user_id, username, bookmark).await
    }
}

/// The assembled profile content: created-pins stream plus populated boards.
#[derive(Debug, Default)]
pub struct AggregateResult {
    pub created: Vec<Post>,
    pub boards: Vec<Board>,
}

/// Builds the full profile graph by orchestrating paginator crawls.
pub struct BoardAggregator<'a, S: ProfileSource> {
    source: &'a S,
    cancel: CancelToken,
    page_delay: Duration,
    max_page_retries: u32,
}

impl<'a, S: ProfileSource> BoardAggregator<'a, S> {
    pub fn new(source: &'a S, cancel: CancelToken) -> Self {
        Self {
            source,
            cancel,
            page_delay: Duration::from_secs(1),
            max_page_retries: 3,
        }
    }

    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn max_page_retries(mut self, retries: u32) -> Self {
        self.max_page_retries = retries;
        self
    }

    /// Assemble the user's content graph.
    ///
    /// A failure on the created-pins stream or on a single board's pin feed
    /// is logged and that part omitted; a failure listing the boards
    /// themselves aborts the aggregation. On interrupt the result holds only
    /// boards whose pin crawl finished completely; a partially-crawled board
    /// is discarded, never half-saved.
    pub async fn aggregate(&self, user: &User) -> Result<AggregateResult> {
        let created = self.crawl_created(user).await;
        let boards = self.crawl_boards(user).await?;

        Ok(AggregateResult { created, boards })
    }

    async fn crawl_created(&self, user: &User) -> Vec<Post> {
        tracing::info!("Scraping created pins for {}", user.username);

        let fetcher = CreatedPinsPages {
            source: self.source,
            user_id: user.id,
            username: &user.username,
        };

        let crawl = self
            .paginator(format!("created pins of {}", user.username))
            .expected_total(user.pin_count)
            .crawl(&fetcher)
            .await;

        match crawl {
            Ok(raw) => raw.iter().filter_map(post_from_raw).collect(),
            Err(e) => {
                tracing::error!("Error retrieving created pins: {}", e);
                Vec::new()
            }
        }
    }

    async fn crawl_boards(&self, user: &User) -> Result<Vec<Board>> {
        tracing::info!("Scraping boards for {}", user.username);

        let fetcher = BoardListPages {
            source: self.source,
            username: &user.username,
        };

        let listing = self
            .paginator(format!("boards of {}", user.username))
            .expected_total(user.board_count)
            .crawl(&fetcher)
            .await?;

        let summaries: Vec<Board> = listing
            .iter()
            .filter(|entry| entry.kind == BOARD_TYPE_TAG)
            .filter_map(board_from_raw)
            .collect();

        let mut boards = Vec::new();
        for mut board in summaries {
            if self.cancel.is_cancelled() {
                tracing::info!(
                    "Interrupted; keeping {} fully scraped board(s)",
                    boards.len()
                );
                break;
            }

            let label = format!("board '{}'", board.title_or_id());
            let fetcher = BoardPinsPages {
                source: self.source,
                board_id: board.id,
                board_url: &board.url,
            };

            match self
                .paginator(label.clone())
                .expected_total(board.pin_count)
                .crawl(&fetcher)
                .await
            {
                Ok(raw_pins) => {
                    if self.cancel.is_cancelled() {
                        tracing::info!("Interrupted during {}; discarding partial board", label);
                        break;
                    }
                    board.pins = raw_pins.iter().filter_map(post_from_raw).collect();
                    tracing::info!("Completed {} with {} pins", label, board.pins.len());
                    boards.push(board);
                }
                Err(e) => {
                    tracing::error!("Failed to fetch pins for {}: {}", label, e);
                }
            }

            self.pause().await;
        }

        Ok(boards)
    }

    fn paginator(&self, label: String) -> CursorPaginator {
        CursorPaginator::new(label, self.cancel.clone())
            .max_page_retries(self.max_page_retries)
            .page_delay(self.page_delay)
    }

    async fn pause(&self) {
        if self.page_delay.is_zero() {
            return;
        }
        let factor = 1.0 + rand::thread_rng().gen_range(0.0..1.0);
        sleep(self.page_delay.mul_f64(factor)).await;
    }
}

struct BoardListPages<'a, S: ProfileSource> {
    source: &'a S,
    username: &'a str,
}

#[async_trait]
impl<S: ProfileSource> PageFetcher for BoardListPages<'_, S> {
    type Item = RawBoardSummary;

    async fn fetch_page(&self, bookmark: Option<&str>) -> Result<Option<Page<RawBoardSummary>>> {
        self.source.board_list_page(self.username, bookmark).await
    }
}

struct BoardPinsPages<'a, S: ProfileSource> {
    source: &'a S,
    board_id: u64,
    board_url: &'a str,
}

#[async_trait]
impl<S: ProfileSource> PageFetcher for BoardPinsPages<'_, S> {
    type Item = RawPin;

    async fn fetch_page(&self, bookmark: Option<&str>) -> Result<Option<Page<RawPin>>> {
        self.source
            .board_pins_page(self.board_id, self.board_url, bookmark)
            .await
    }
}

struct CreatedPinsPages<'a, S: ProfileSource> {
    source: &'a S,
    user_id: u64,
    username: &'a str,
}

#[async_trait]
impl<S: ProfileSource> PageFetcher for CreatedPinsPages<'_, S> {
    type Item = RawPin;

    async fn fetch_page(&self, bookmark: Option<&str>) -> Result<Option<Page<RawPin>>> {
        self.source
            .created_pins_page(self.user_id, self.username, bookmark)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn test_user() -> User {
        User {
            id: 1,
            username: "someuser".to_string(),
            display_name: "Some User".to_string(),
            pfp_url: None,
            banner_url: None,
            follower_count: 0,
            following_count: 0,
            board_count: 3,
            pin_count: 2,
            bio: String::new(),
        }
    }

    fn summary(kind: &str, id: u64, name: &str) -> RawBoardSummary {
        RawBoardSummary {
            kind: kind.to_string(),
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            url: Some(format!("/someuser/{}/", name)),
            pin_count: Some(1),
            ..Default::default()
        }
    }

    fn pin(id: u64) -> RawPin {
        RawPin {
            id: Some(id.to_string()),
            title: Some(format!("pin {}", id)),
            ..Default::default()
        }
    }

    fn single_page<T>(items: Vec<T>) -> Result<Option<Page<T>>> {
        Ok(Some(Page {
            items,
            bookmark: None,
        }))
    }

    /// One page of everything; the pin feed of `failing_board` errors, and
    /// fetching `cancel_on_board` trips the given token.
    struct StubSource {
        boards: Vec<RawBoardSummary>,
        failing_board: Option<u64>,
        created_fails: bool,
        cancel_on_board: Option<(u64, CancelToken)>,
    }

    #[async_trait]
    impl ProfileSource for StubSource {
        async fn board_list_page(
            &self,
            _username: &str,
            _bookmark: Option<&str>,
        ) -> Result<Option<Page<RawBoardSummary>>> {
            single_page(self.boards.clone())
        }

        async fn board_pins_page(
            &self,
            board_id: u64,
            _board_url: &str,
            _bookmark: Option<&str>,
        ) -> Result<Option<Page<RawPin>>> {
            if self.failing_board == Some(board_id) {
                return Err(Error::Payload("unexpected pin shape".into()));
            }
            if let Some((id, token)) = &self.cancel_on_board {
                if *id == board_id {
                    token.cancel();
                }
            }
            single_page(vec![pin(board_id * 10)])
        }

        async fn created_pins_page(
            &self,
            _user_id: u64,
            _username: &str,
            _bookmark: Option<&str>,
        ) -> Result<Option<Page<RawPin>>> {
            if self.created_fails {
                return Err(Error::Payload("unexpected pin shape".into()));
            }
            single_page(vec![pin(1), pin(2)])
        }
    }

    fn aggregator(source: &StubSource) -> BoardAggregator<'_, StubSource> {
        BoardAggregator::new(source, CancelToken::new()).page_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_aggregates_created_and_boards() {
        let source = StubSource {
            boards: vec![summary("board", 1, "alpha"), summary("board", 2, "beta")],
            failing_board: None,
            created_fails: false,
            cancel_on_board: None,
        };

        let result = aggregator(&source).aggregate(&test_user()).await.unwrap();
        assert_eq!(result.created.len(), 2);
        assert_eq!(result.boards.len(), 2);
        assert_eq!(result.boards[0].pins.len(), 1);
        assert_eq!(result.boards[1].pins.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_board_does_not_abort_the_others() {
        let source = StubSource {
            boards: vec![
                summary("board", 1, "alpha"),
                summary("board", 2, "beta"),
                summary("board", 3, "gamma"),
            ],
            failing_board: Some(2),
            created_fails: false,
            cancel_on_board: None,
        };

        let result = aggregator(&source).aggregate(&test_user()).await.unwrap();
        let ids: Vec<u64> = result.boards.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(result.boards.iter().all(|b| !b.pins.is_empty()));
    }

    #[tokio::test]
    async fn test_non_board_entries_are_filtered() {
        let source = StubSource {
            boards: vec![
                summary("board", 1, "alpha"),
                summary("story", 9, "section-header"),
            ],
            failing_board: None,
            created_fails: false,
            cancel_on_board: None,
        };

        let result = aggregator(&source).aggregate(&test_user()).await.unwrap();
        assert_eq!(result.boards.len(), 1);
        assert_eq!(result.boards[0].id, 1);
    }

    #[tokio::test]
    async fn test_created_failure_leaves_boards_intact() {
        let source = StubSource {
            boards: vec![summary("board", 1, "alpha")],
            failing_board: None,
            created_fails: true,
            cancel_on_board: None,
        };

        let result = aggregator(&source).aggregate(&test_user()).await.unwrap();
        assert!(result.created.is_empty());
        assert_eq!(result.boards.len(), 1);
    }

    #[tokio::test]
    async fn test_interrupt_discards_partial_board() {
        let cancel = CancelToken::new();
        let source = StubSource {
            boards: vec![summary("board", 1, "alpha"), summary("board", 2, "beta")],
            failing_board: None,
            created_fails: false,
            cancel_on_board: Some((2, cancel.clone())),
        };

        let result = BoardAggregator::new(&source, cancel)
            .page_delay(Duration::ZERO)
            .aggregate(&test_user())
            .await
            .unwrap();

        // Board 2's crawl was interrupted mid-flight: only board 1 survives.
        let ids: Vec<u64> = result.boards.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1]);
    }
}
