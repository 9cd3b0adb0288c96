//! Pinterest resource-API HTTP client.

use std::time::Duration;

use rand::Rng;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::time::sleep;

use crate::api::types::*;
use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use crate::scrape::paginator::Page;

/// Resource endpoint names, appended to `<base>/resource/<name>/get/`.
const USER_RESOURCE: &str = "UserResource";
const BOARDS_RESOURCE: &str = "BoardsResource";
const BOARD_FEED_RESOURCE: &str = "BoardFeedResource";
const USER_PINS_RESOURCE: &str = "UserActivityPinsResource";

/// Page size requested from the board feed endpoint.
const BOARD_PAGE_SIZE: u32 = 25;

/// HTTP client with transport-level retry and backoff.
///
/// Constructed once at process start and passed explicitly to every
/// collaborator; there is no ambient session.
pub struct ApiClient {
    http: Client,
    base_url: String,
    max_retries: u32,
    backoff_factor: f64,
    retryable_statuses: Vec<u16>,
}

impl ApiClient {
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Ok(value) = network.base_url.parse() {
            headers.insert(header::REFERER, value);
        }

        let http = Client::builder()
            .user_agent(&network.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(network.request_timeout_seconds))
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: network.base_url.trim_end_matches('/').to_string(),
            max_retries: network.max_retries,
            backoff_factor: network.backoff_factor,
            retryable_statuses: network.retryable_statuses.clone(),
        })
    }

    /// GET with retry on transport errors and retryable statuses.
    ///
    /// Backoff grows as `factor * 2^attempt` with a little jitter. A 429 is
    /// surfaced as `Error::RateLimited` immediately so the caller can decide
    /// to back off longer than the transport policy would.
    async fn get_with_retry(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let mut attempt: u32 = 0;

        loop {
            let result = self.http.get(url).query(query).send().await;

            let retryable = match &result {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        return Err(Error::RateLimited(60));
                    }
                    self.retryable_statuses.contains(&status.as_u16())
                }
                Err(e) => !e.is_builder(),
            };

            if !retryable {
                return Ok(result?);
            }

            if attempt >= self.max_retries {
                return match result {
                    Ok(response) => Err(Error::Api(format!(
                        "HTTP {} from {} after {} retries",
                        response.status(),
                        url,
                        attempt
                    ))),
                    Err(e) => Err(Error::Http(e)),
                };
            }

            let backoff = self.backoff_factor * f64::from(1u32 << attempt);
            let jitter = rand::thread_rng().gen_range(0.0..0.1);
            tracing::warn!(
                "Request to {} failed (attempt {}), retrying in {:.1}s",
                url,
                attempt + 1,
                backoff + jitter
            );
            sleep(Duration::from_secs_f64(backoff + jitter)).await;
            attempt += 1;
        }
    }

    /// Query string shared by every resource endpoint: the originating page,
    /// a JSON options blob and a cache-busting timestamp.
    fn resource_query(source_url: &str, options: serde_json::Value) -> [(&'static str, String); 3] {
        let data = json!({ "options": options, "context": {} });
        [
            ("source_url", source_url.to_string()),
            ("data", data.to_string()),
            ("_", chrono::Utc::now().timestamp_millis().to_string()),
        ]
    }

    /// Call a resource endpoint and unwrap the response envelope.
    async fn get_resource<T: DeserializeOwned>(
        &self,
        resource: &str,
        source_url: &str,
        options: serde_json::Value,
    ) -> Result<ResourceResponse<T>> {
        let url = format!("{}/resource/{}/get/", self.base_url, resource);
        let query = Self::resource_query(source_url, options);

        tracing::debug!("GET {} source_url={}", url, source_url);
        let response = self.get_with_retry(&url, &query).await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::Api(format!(
                "{} request failed: HTTP {}",
                resource, status
            )));
        }

        let text = response.text().await?;
        let envelope: ResourceEnvelope<T> = serde_json::from_str(&text).map_err(|e| {
            Error::Payload(format!(
                "{} response did not match expected shape: {} - {}",
                resource,
                e,
                &text[..text.len().min(200)]
            ))
        })?;

        Ok(envelope.resource_response)
    }

    /// Fetch a user's profile record.
    ///
    /// An unknown username is terminal for the whole run, so 404 and an empty
    /// payload both map to `Error::UserNotFound` here rather than the generic
    /// retry path.
    pub async fn get_user(&self, username: &str) -> Result<RawUser> {
        let url = format!("{}/resource/{}/get/", self.base_url, USER_RESOURCE);
        let query = Self::resource_query(&format!("/{}/", username), json!({ "username": username }));

        let response = self.get_with_retry(&url, &query).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(Error::UserNotFound(username.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Api(format!(
                "User lookup for '{}' failed: HTTP {}",
                username, status
            )));
        }

        let text = response.text().await?;
        let envelope: ResourceEnvelope<RawUser> = serde_json::from_str(&text).map_err(|e| {
            Error::Payload(format!(
                "user response did not match expected shape: {} - {}",
                e,
                &text[..text.len().min(200)]
            ))
        })?;

        envelope
            .resource_response
            .data
            .ok_or_else(|| Error::UserNotFound(username.to_string()))
    }

    /// One page of the board listing for a user.
    pub async fn board_list_page(
        &self,
        username: &str,
        bookmark: Option<&str>,
    ) -> Result<Option<Page<RawBoardSummary>>> {
        let options = json!({
            "field_set_key": "profile_grid_item",
            "filter_stories": false,
            "sort": "last_pinned_to",
            "username": username,
            "bookmarks": [bookmark],
        });

        let resource = self
            .get_resource::<Vec<RawBoardSummary>>(
                BOARDS_RESOURCE,
                &format!("/{}/", username),
                options,
            )
            .await?;

        Ok(Page::from_resource(resource))
    }

    /// One page of a board's pin feed.
    pub async fn board_pins_page(
        &self,
        board_id: u64,
        board_url: &str,
        bookmark: Option<&str>,
    ) -> Result<Option<Page<RawPin>>> {
        let options = json!({
            "board_id": board_id.to_string(),
            "board_url": board_url,
            "sort": "default",
            "page_size": BOARD_PAGE_SIZE,
            "filter_stories": false,
            "bookmarks": [bookmark],
        });

        let resource = self
            .get_resource::<Vec<RawPin>>(BOARD_FEED_RESOURCE, board_url, options)
            .await?;

        Ok(Page::from_resource(resource))
    }

    /// One page of the user's own created-pins stream.
    pub async fn created_pins_page(
        &self,
        user_id: u64,
        username: &str,
        bookmark: Option<&str>,
    ) -> Result<Option<Page<RawPin>>> {
        let options = json!({
            "exclude_add_pin_rep": true,
            "field_set_key": "grid_item",
            "user_id": user_id.to_string(),
            "username": username,
            "bookmarks": [bookmark],
        });

        let resource = self
            .get_resource::<Vec<RawPin>>(
                USER_PINS_RESOURCE,
                &format!("/{}/_created/", username),
                options,
            )
            .await?;

        Ok(Page::from_resource(resource))
    }

    /// Download a file from a URL, returning the streaming response.
    pub async fn download_file(&self, url: &str) -> Result<Response> {
        let response = self.get_with_retry(url, &[]).await?;

        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "Failed to download file: HTTP {}",
                response.status()
            )));
        }

        Ok(response)
    }

    /// Fetch a page body as text (used for short-link expansion).
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.get_with_retry(url, &[]).await?;
        Ok(response.text().await?)
    }
}
