//! Raw resource-API payload definitions.
//!
//! Upstream responses are loosely typed: almost any field may be absent or
//! null depending on the endpoint and account. Every field here is therefore
//! optional (or defaulted), and `model::convert` decides the default policy
//! per field when normalizing. Nothing in this module errors on a missing key.

use serde::Deserialize;

/// Envelope around every resource endpoint response.
#[derive(Debug, Deserialize)]
pub struct ResourceEnvelope<T> {
    pub resource_response: ResourceResponse<T>,
}

/// The inner resource response: payload plus the continuation bookmark.
///
/// A `None` data field is a valid response (eventually-consistent backends
/// return it before the page is ready); the paginator retries it.
#[derive(Debug, Deserialize)]
pub struct ResourceResponse<T> {
    #[serde(default = "default_status")]
    pub status: String,
    pub data: Option<T>,
    pub bookmark: Option<String>,
}

fn default_status() -> String {
    "success".to_string()
}

/// Raw user record from the user resource endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawUser {
    pub id: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub about: Option<String>,
    pub image_xlarge_url: Option<String>,
    pub image_large_url: Option<String>,
    pub profile_cover: Option<RawProfileCover>,
    pub follower_count: Option<u64>,
    pub following_count: Option<u64>,
    pub board_count: Option<u64>,
    pub pin_count: Option<u64>,
}

/// Profile banner wrapper. The banner URL sits two levels deep upstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProfileCover {
    pub images: Option<RawCoverImages>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCoverImages {
    pub originals: Option<RawImage>,
}

/// Board entry from the board-listing endpoint.
///
/// The listing interleaves non-board entities (section headers, story blocks);
/// `kind` carries the upstream type tag used to filter them out.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBoardSummary {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub pin_count: Option<u64>,
    pub follower_count: Option<u64>,
    pub image_cover_hd_url: Option<String>,
    pub created_at: Option<String>,
}

/// Pin record from the board-feed and created-pins endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPin {
    pub id: Option<String>,
    pub title: Option<String>,
    pub grid_title: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub auto_alt_text: Option<String>,
    pub images: Option<RawImageSet>,
    #[serde(default)]
    pub videos: Vec<RawVideo>,
}

/// Image variants keyed by size; only the original-resolution entry is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImageSet {
    pub orig: Option<RawImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImage {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVideo {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_tolerates_missing_fields() {
        let json = r#"{"resource_response": {"data": null}}"#;
        let envelope: ResourceEnvelope<Vec<RawPin>> = serde_json::from_str(json).unwrap();
        assert!(envelope.resource_response.data.is_none());
        assert!(envelope.resource_response.bookmark.is_none());
    }

    #[test]
    fn test_pin_with_sparse_payload() {
        let json = r#"{"id": "123", "videos": [{"url": "v.m3u8"}]}"#;
        let pin: RawPin = serde_json::from_str(json).unwrap();
        assert_eq!(pin.id.as_deref(), Some("123"));
        assert!(pin.images.is_none());
        assert_eq!(pin.videos.len(), 1);
    }

    #[test]
    fn test_board_summary_type_tag() {
        let json = r#"{"type": "story", "id": "9"}"#;
        let board: RawBoardSummary = serde_json::from_str(json).unwrap();
        assert_eq!(board.kind, "story");
    }
}
