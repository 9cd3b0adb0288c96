//! Raw payload → normalized record conversion.
//!
//! Default policy is explicit per field: counts default to zero, text to the
//! empty string, genuinely-optional fields stay `Option`. A record whose id is
//! missing or unparseable is dropped with a warning; aggregation continues
//! with whatever parsed.

use crate::api::types::{RawBoardSummary, RawPin, RawUser, RawVideo};
use crate::error::{Error, Result};
use crate::model::graph::{Board, MediaKind, MediaRef, Post, User};

fn parse_id(id: Option<&str>) -> Option<u64> {
    id.and_then(|s| s.parse().ok())
}

/// Normalize the user record. The user is the root of the graph, so a payload
/// without a usable id or username is terminal rather than skippable.
pub fn user_from_raw(raw: RawUser) -> Result<User> {
    let id = parse_id(raw.id.as_deref())
        .ok_or_else(|| Error::Payload("user record has no parseable id".to_string()))?;
    let username = raw
        .username
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::Payload("user record has no username".to_string()))?;

    let banner_url = raw
        .profile_cover
        .and_then(|c| c.images)
        .and_then(|i| i.originals)
        .and_then(|o| o.url);

    Ok(User {
        id,
        username,
        display_name: raw.full_name.unwrap_or_default(),
        pfp_url: raw.image_xlarge_url.or(raw.image_large_url),
        banner_url,
        follower_count: raw.follower_count.unwrap_or(0),
        following_count: raw.following_count.unwrap_or(0),
        board_count: raw.board_count.unwrap_or(0),
        pin_count: raw.pin_count.unwrap_or(0),
        bio: raw.about.unwrap_or_default(),
    })
}

/// Normalize a board-listing entry. Returns `None` (with a warning) for
/// records without a parseable id.
pub fn board_from_raw(raw: &RawBoardSummary) -> Option<Board> {
    let Some(id) = parse_id(raw.id.as_deref()) else {
        tracing::warn!("Skipping board entry with unparseable id {:?}", raw.id);
        return None;
    };

    Some(Board {
        id,
        name: raw.name.clone().unwrap_or_default(),
        url: raw.url.clone().unwrap_or_default(),
        pin_count: raw.pin_count.unwrap_or(0),
        follower_count: raw.follower_count.unwrap_or(0),
        cover_url: raw.image_cover_hd_url.clone(),
        created_at: raw.created_at.clone(),
        pins: Vec::new(),
    })
}

/// Normalize a pin record. Returns `None` (with a warning) for records
/// without a parseable id.
pub fn post_from_raw(raw: &RawPin) -> Option<Post> {
    let Some(id) = parse_id(raw.id.as_deref()) else {
        tracing::warn!("Skipping pin with unparseable id {:?}", raw.id);
        return None;
    };

    let images = raw
        .images
        .as_ref()
        .and_then(|set| set.orig.as_ref())
        .and_then(|orig| {
            orig.url.as_ref().map(|url| MediaRef {
                kind: MediaKind::Image,
                url: url.clone(),
                width: orig.width,
                height: orig.height,
                duration: None,
            })
        });

    let videos = raw.videos.iter().filter_map(video_ref).collect();

    let title = raw
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| raw.grid_title.clone())
        .unwrap_or_default();

    Some(Post {
        id,
        title,
        description: raw.description.clone().unwrap_or_default(),
        created_at: raw.created_at.clone(),
        alt_text: raw.auto_alt_text.clone(),
        images,
        videos,
    })
}

fn video_ref(raw: &RawVideo) -> Option<MediaRef> {
    raw.url.as_ref().map(|url| MediaRef {
        kind: MediaKind::Video,
        url: url.clone(),
        width: raw.width,
        height: raw.height,
        duration: raw.duration,
    })
}
