//! Resolving operator input to a canonical username.
//!
//! Accepts a full profile URL, a `pin.it` short link (expanded by fetching the
//! page and scanning the body for the canonical profile URL) or a bare
//! username.

use regex::Regex;

use crate::api::client::ApiClient;
use crate::error::{Error, Result};

/// A resolved scrape target: canonical username plus the optional board slug
/// present in board URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub username: String,
    pub board: Option<String>,
}

pub struct UrlResolver {
    short_link: Regex,
    profile: Regex,
    embedded_profile: Regex,
    bare_username: Regex,
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlResolver {
    pub fn new() -> Self {
        Self {
            short_link: Regex::new(r"^https?://(?:[\w\d-]+\.)?pin\.it/").unwrap(),
            profile: Regex::new(
                r#"^https?://(?:[a-zA-Z0-9-]+\.)?pinterest\.com/(?P<username>[^"/?#]+)(?:/(?P<board>[^"/?#]+))?/?"#,
            )
            .unwrap(),
            // Short-link pages embed the canonical invite URL in their body.
            embedded_profile: Regex::new(
                r#"https?://(?:[a-zA-Z0-9-]+\.)?pinterest\.com/(?P<username>[^"/?#]+)/(?:(?P<board>[^"/?#]+)/)?\?invite_code=[\w\d]+"#,
            )
            .unwrap(),
            bare_username: Regex::new(r"^[\w.-]{3,30}$").unwrap(),
        }
    }

    /// Resolve operator input, expanding short links over the network.
    pub async fn resolve(&self, input: &str, client: &ApiClient) -> Result<ResolvedTarget> {
        let input = input.trim();

        if self.short_link.is_match(input) {
            let body = client.get_text(input).await?;
            return self
                .capture(&self.embedded_profile, &body)
                .ok_or_else(|| Error::UnresolvedTarget(input.to_string()));
        }

        self.resolve_offline(input)
            .ok_or_else(|| Error::UnresolvedTarget(input.to_string()))
    }

    /// Resolve the forms that need no network round trip.
    pub fn resolve_offline(&self, input: &str) -> Option<ResolvedTarget> {
        let input = input.trim();

        if let Some(target) = self.capture(&self.profile, input) {
            return Some(target);
        }

        if self.bare_username.is_match(input) {
            return Some(ResolvedTarget {
                username: input.to_string(),
                board: None,
            });
        }

        None
    }

    fn capture(&self, pattern: &Regex, haystack: &str) -> Option<ResolvedTarget> {
        let caps = pattern.captures(haystack)?;
        let username = caps.name("username")?.as_str().to_string();
        let board = caps.name("board").map(|m| m.as_str().to_string());
        Some(ResolvedTarget { username, board })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_url() {
        let resolver = UrlResolver::new();
        let target = resolver
            .resolve_offline("https://www.pinterest.com/someuser/")
            .unwrap();
        assert_eq!(target.username, "someuser");
        assert_eq!(target.board, None);
    }

    #[test]
    fn test_board_url() {
        let resolver = UrlResolver::new();
        let target = resolver
            .resolve_offline("https://jp.pinterest.com/someuser/travel-ideas/")
            .unwrap();
        assert_eq!(target.username, "someuser");
        assert_eq!(target.board.as_deref(), Some("travel-ideas"));
    }

    #[test]
    fn test_bare_username() {
        let resolver = UrlResolver::new();
        let target = resolver.resolve_offline("some_user.99").unwrap();
        assert_eq!(target.username, "some_user.99");
    }

    #[test]
    fn test_garbage_input_rejected() {
        let resolver = UrlResolver::new();
        assert!(resolver.resolve_offline("https://example.com/nope").is_none());
        assert!(resolver.resolve_offline("two words").is_none());
        assert!(resolver.resolve_offline("").is_none());
    }

    #[test]
    fn test_embedded_invite_url() {
        let resolver = UrlResolver::new();
        let body = r#"<a href="https://www.pinterest.com/someuser/recipes/?invite_code=abc123">"#;
        let target = resolver.capture(&resolver.embedded_profile, body).unwrap();
        assert_eq!(target.username, "someuser");
        assert_eq!(target.board.as_deref(), Some("recipes"));
    }
}
