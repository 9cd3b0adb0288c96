//! Pinterest Downloader - profile scraper and media downloader
//!
//! This library scrapes a Pinterest profile's content graph (created pins and
//! boards with their pins) through the paginated resource API, persists it as
//! a normalized JSON record, and downloads the referenced media.
//!
//! # Features
//!
//! - Bookmark-cursor pagination with stale-cursor and null-page handling
//! - Per-board pin aggregation with per-board failure isolation
//! - Phased, bounded-concurrency media downloads (images, then videos)
//! - M3U8 video capture via ffmpeg stream copy
//! - Collision-free, filesystem-safe output naming
//! - Graceful interrupt handling with partial results
//!
//! # Example
//!
//! ```no_run
//! use pinterest_downloader::{ApiClient, BoardAggregator, CancelToken, Config};
//! use pinterest_downloader::model::{user_from_raw, ProfileGraph};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let client = ApiClient::new(&config.network)?;
//!     let cancel = CancelToken::new();
//!
//!     let user = user_from_raw(client.get_user("someuser").await?)?;
//!     let result = BoardAggregator::new(&client, cancel).aggregate(&user).await?;
//!     let graph = ProfileGraph::new(user, result.created, result.boards);
//!
//!     // ... persist and download
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod model;
pub mod output;
pub mod persist;
pub mod scrape;

// Re-exports for convenience
pub use api::{ApiClient, UrlResolver};
pub use cancel::CancelToken;
pub use config::Config;
pub use download::{DownloadReport, Downloader, HttpMediaFetcher, MediaFetcher};
pub use error::{Error, Result};
pub use model::{Board, MediaRef, Post, ProfileGraph, User};
pub use scrape::{BoardAggregator, CursorPaginator, PageFetcher};
