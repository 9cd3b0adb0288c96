//! Board and profile download orchestration.
//!
//! Each board is processed in two phases: all image downloads as one
//! bounded-concurrency batch, a full barrier, then all video downloads as a
//! second batch. Video remuxing is CPU and IO heavy and must not compete
//! with the image fetch burst. Boards themselves are processed strictly in
//! listing order, one at a time.

use std::path::Path;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use rand::Rng;
use tokio::time::sleep;

use crate::cancel::CancelToken;
use crate::download::fetcher::MediaFetcher;
use crate::error::{Error, Result};
use crate::fs::paths::ProfilePaths;
use crate::model::{Board, Post, ProfileGraph, User};

/// Worker pool cap for a download batch.
pub const DEFAULT_MAX_CONCURRENT: usize = 50;

/// Base pause between phases and between boards.
const DEFAULT_PHASE_PAUSE: Duration = Duration::from_secs(2);

/// Per-board outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoardTotals {
    pub bytes: u64,
    pub images: u64,
    pub videos: u64,
}

/// Whole-run outcome, for the end-of-run summary.
#[derive(Debug, Default, Clone, Copy)]
pub struct DownloadReport {
    pub boards_processed: u64,
    pub boards_failed: u64,
    pub images: u64,
    pub videos: u64,
    pub total_bytes: u64,
}

/// Fans per-post downloads out over a bounded worker pool, board by board.
pub struct Downloader<F: MediaFetcher> {
    fetcher: F,
    paths: ProfilePaths,
    cancel: CancelToken,
    max_concurrent: usize,
    phase_pause: Duration,
}

impl<F: MediaFetcher> Downloader<F> {
    pub fn new(fetcher: F, paths: ProfilePaths, cancel: CancelToken) -> Self {
        Self {
            fetcher,
            paths,
            cancel,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            phase_pause: DEFAULT_PHASE_PAUSE,
        }
    }

    pub fn max_concurrent(mut self, cap: usize) -> Self {
        self.max_concurrent = cap.max(1);
        self
    }

    pub fn phase_pause(mut self, pause: Duration) -> Self {
        self.phase_pause = pause;
        self
    }

    /// Download everything in the graph: the created pseudo-board first, then
    /// every real board in listing order, then the profile assets.
    ///
    /// Per-board failures are logged and skipped. On interrupt the current
    /// batch drains (in-flight downloads are not force-stopped); no further
    /// boards are dispatched.
    pub async fn download(&self, graph: &ProfileGraph) -> Result<DownloadReport> {
        let user = &graph.user;

        if graph.created.is_empty() && graph.boards.is_empty() {
            return Err(Error::Download(format!(
                "{} has no pins or boards to download",
                user.username
            )));
        }

        tracing::info!(
            "Downloading {} into {}",
            user.username,
            self.paths.downloads_dir().display()
        );

        let mut report = DownloadReport::default();
        let created = Board::created(graph.created.clone());

        for board in std::iter::once(&created).chain(graph.boards.iter()) {
            if self.cancel.is_cancelled() {
                tracing::info!("Interrupted; stopping before board '{}'", board.title_or_id());
                break;
            }

            match self.download_board(board).await {
                Ok(totals) => {
                    report.boards_processed += 1;
                    report.images += totals.images;
                    report.videos += totals.videos;
                    report.total_bytes += totals.bytes;
                }
                Err(Error::EmptyBoard(name)) => {
                    tracing::warn!("Board '{}' has no pins, skipping", name);
                }
                Err(e) => {
                    report.boards_failed += 1;
                    tracing::error!("Unable to download board '{}': {}", board.title_or_id(), e);
                }
            }

            self.pause().await;
        }

        report.total_bytes += self.download_profile_assets(user).await;

        tracing::info!(
            "Downloaded {} [{:.2} MB total]",
            user.username,
            report.total_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(report)
    }

    /// Download one board's media: image batch, barrier, video batch.
    pub async fn download_board(&self, board: &Board) -> Result<BoardTotals> {
        if board.pins.is_empty() {
            return Err(Error::EmptyBoard(board.title_or_id()));
        }

        let dir = self.paths.board_dir(board);
        tokio::fs::create_dir_all(&dir).await?;

        // A post carrying both media kinds goes to the video bucket.
        let mut image_posts: Vec<&Post> = Vec::new();
        let mut video_posts: Vec<&Post> = Vec::new();
        for pin in &board.pins {
            if !pin.videos.is_empty() {
                video_posts.push(pin);
            } else if pin.images.is_some() {
                image_posts.push(pin);
            } else {
                tracing::warn!(
                    "'{}' does not have any downloadable resource",
                    pin.title_or_id()
                );
            }
        }

        tracing::info!(
            "Downloading board '{}' ({} image pins, {} video pins)",
            board.title_or_id(),
            image_posts.len(),
            video_posts.len()
        );

        let mut totals = BoardTotals::default();

        let image_results: Vec<Option<u64>> = stream::iter(
            image_posts
                .iter()
                .copied()
                .map(|pin| self.download_image_post(pin, &dir)),
        )
        .buffer_unordered(self.max_concurrent)
        .collect()
        .await;
        for bytes in image_results.into_iter().flatten() {
            totals.images += 1;
            totals.bytes += bytes;
        }

        // Phase barrier: every image task has finished before the first
        // video task is dispatched.
        self.pause().await;

        let video_results: Vec<Option<u64>> = stream::iter(
            video_posts
                .iter()
                .copied()
                .map(|pin| self.download_video_post(pin, &dir)),
        )
        .buffer_unordered(self.max_concurrent)
        .collect()
        .await;
        for bytes in video_results.into_iter().flatten() {
            totals.videos += 1;
            totals.bytes += bytes;
        }

        tracing::info!(
            "Board '{}' done: {} images, {} videos, {} bytes",
            board.title_or_id(),
            totals.images,
            totals.videos,
            totals.bytes
        );

        Ok(totals)
    }

    /// Avatar and banner, sequential and best-effort. Returns bytes written.
    pub async fn download_profile_assets(&self, user: &User) -> u64 {
        let dir = self.paths.profile_assets_dir();
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            tracing::warn!("Cannot create profile asset directory: {}", e);
            return 0;
        }

        let mut total = 0u64;

        if let Some(url) = &user.pfp_url {
            total += self
                .fetch_asset(url, &dir, &format!("{}_avatar_", user.username))
                .await;
        } else {
            tracing::debug!("{} has no avatar", user.username);
        }

        if let Some(url) = &user.banner_url {
            total += self
                .fetch_asset(url, &dir, &format!("{}_banner_", user.username))
                .await;
        } else {
            tracing::debug!("{} has no banner", user.username);
        }

        total
    }

    async fn fetch_asset(&self, url: &str, dir: &Path, base: &str) -> u64 {
        match self.fetcher.fetch_image(url, dir, base).await {
            Ok(bytes) => {
                tracing::info!("Downloaded {} [{:.2} KB]", base, bytes as f64 / 1024.0);
                bytes
            }
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", base, e);
                0
            }
        }
    }

    /// `None` means the item contributed nothing (failure or nothing usable).
    async fn download_image_post(&self, pin: &Post, dir: &Path) -> Option<u64> {
        let image = pin.images.as_ref()?;

        match self.fetcher.fetch_image(&image.url, dir, &pin.title_or_id()).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("Failed to download '{}': {}", pin.title_or_id(), e);
                None
            }
        }
    }

    async fn download_video_post(&self, pin: &Post, dir: &Path) -> Option<u64> {
        let Some(video) = pin.videos.iter().find(|v| v.is_downloadable()) else {
            tracing::warn!(
                "'{}' has no playlist-format video, skipping",
                pin.title_or_id()
            );
            return None;
        };

        match self.fetcher.fetch_video(&video.url, dir, &pin.title_or_id()).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("Failed to download '{}': {}", pin.title_or_id(), e);
                None
            }
        }
    }

    async fn pause(&self) {
        if self.phase_pause.is_zero() {
            return;
        }
        let factor = 1.0 + rand::thread_rng().gen_range(0.0..1.0);
        sleep(self.phase_pause.mul_f64(factor)).await;
    }
}
