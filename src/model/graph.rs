//! Normalized profile records.
//!
//! The stable on-disk schema: everything the scraper persists and the
//! downloader later consumes. Records are built incrementally during the
//! crawl and treated as read-only once serialized.

use serde::{Deserialize, Serialize};

/// Reserved id of the synthetic board holding the user's own created pins.
pub const CREATED_BOARD_ID: u64 = 0;

/// Name given to the synthetic created-pins board.
pub const CREATED_BOARD_NAME: &str = "created";

/// Profile owner. Fetched once per run; root of the object graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub display_name: String,
    pub pfp_url: Option<String>,
    pub banner_url: Option<String>,
    pub follower_count: u64,
    pub following_count: u64,
    pub board_count: u64,
    pub pin_count: u64,
    pub bio: String,
}

/// A named, ordered collection of posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub pin_count: u64,
    pub follower_count: u64,
    pub cover_url: Option<String>,
    pub created_at: Option<String>,
    #[serde(default)]
    pub pins: Vec<Post>,
}

impl Board {
    /// The synthetic id-0 board wrapping the user's created-pins stream, so
    /// the download path can treat it like any other board.
    pub fn created(pins: Vec<Post>) -> Self {
        Self {
            id: CREATED_BOARD_ID,
            name: CREATED_BOARD_NAME.to_string(),
            url: String::new(),
            pin_count: pins.len() as u64,
            follower_count: 0,
            cover_url: None,
            created_at: None,
            pins,
        }
    }

    /// Display/filename handle: board name, falling back to the id.
    pub fn title_or_id(&self) -> String {
        if self.name.trim().is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }
}

/// A single content item with optional image and/or video media.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub created_at: Option<String>,
    pub alt_text: Option<String>,
    pub images: Option<MediaRef>,
    #[serde(default)]
    pub videos: Vec<MediaRef>,
}

impl Post {
    /// Display/filename handle: title, falling back to the id.
    pub fn title_or_id(&self) -> String {
        if self.title.trim().is_empty() {
            self.id.to_string()
        } else {
            self.title.clone()
        }
    }

    /// Whether anything here can be downloaded at all.
    pub fn has_media(&self) -> bool {
        self.images.is_some() || !self.videos.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A reference to a downloadable asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<u64>,
}

impl MediaRef {
    /// Video refs are only downloadable as streaming playlists; anything else
    /// (bare mp4 previews, story fragments) is skipped.
    pub fn is_downloadable(&self) -> bool {
        match self.kind {
            MediaKind::Image => true,
            MediaKind::Video => self.url.ends_with(".m3u8"),
        }
    }
}

/// Top-level persisted record: the full normalized profile graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileGraph {
    pub user: User,
    #[serde(default)]
    pub created: Vec<Post>,
    #[serde(default)]
    pub boards: Vec<Board>,
    pub scraped_at: i64,
}

impl ProfileGraph {
    pub fn new(user: User, created: Vec<Post>, boards: Vec<Board>) -> Self {
        Self {
            user,
            created,
            boards,
            scraped_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_ref(url: &str) -> MediaRef {
        MediaRef {
            kind: MediaKind::Video,
            url: url.to_string(),
            width: None,
            height: None,
            duration: None,
        }
    }

    #[test]
    fn test_created_board_is_reserved_id() {
        let board = Board::created(Vec::new());
        assert_eq!(board.id, CREATED_BOARD_ID);
        assert_eq!(board.title_or_id(), CREATED_BOARD_NAME);
    }

    #[test]
    fn test_title_fallback_to_id() {
        let post = Post {
            id: 42,
            title: "  ".to_string(),
            description: String::new(),
            created_at: None,
            alt_text: None,
            images: None,
            videos: Vec::new(),
        };
        assert_eq!(post.title_or_id(), "42");
    }

    #[test]
    fn test_only_playlist_videos_are_downloadable() {
        assert!(video_ref("https://v.example/clip.m3u8").is_downloadable());
        assert!(!video_ref("https://v.example/clip.mp4").is_downloadable());
    }
}
