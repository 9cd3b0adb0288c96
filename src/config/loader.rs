//! Configuration structures and loading logic.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub options: OptionsConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Scrape and download options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Base directory for downloads.
    #[serde(default)]
    pub download_directory: Option<PathBuf>,

    /// Worker pool cap for a per-board download batch.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Same-cursor retries for null pages and transient page errors.
    #[serde(default = "default_page_retries")]
    pub page_retries: u32,

    /// Base politeness delay between pages, seconds (randomized up to 2x).
    #[serde(default = "default_page_delay")]
    pub page_delay_seconds: f64,

    /// Base pause between download phases and boards, seconds.
    #[serde(default = "default_phase_pause")]
    pub phase_pause_seconds: f64,

    /// Stop after persisting the scraped graph; skip all downloads.
    #[serde(default)]
    pub scrape_only: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            download_directory: None,
            max_concurrent_downloads: default_max_concurrent(),
            page_retries: default_page_retries(),
            page_delay_seconds: default_page_delay(),
            phase_pause_seconds: default_phase_pause(),
            scrape_only: false,
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// API host; regional mirrors (`jp.pinterest.com`, ...) work too.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Browser user agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport-level retries per request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Exponential backoff factor between transport retries, seconds.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Statuses worth retrying at the transport level.
    #[serde(default = "default_retryable_statuses")]
    pub retryable_statuses: Vec<u16>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            retryable_statuses: default_retryable_statuses(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_max_concurrent() -> usize {
    50
}

fn default_page_retries() -> u32 {
    3
}

fn default_page_delay() -> f64 {
    1.0
}

fn default_phase_pause() -> f64 {
    2.0
}

fn default_base_url() -> String {
    "https://www.pinterest.com".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    0.3
}

fn default_retryable_statuses() -> Vec<u16> {
    vec![500, 502, 503, 504]
}

fn default_request_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!("Configuration file not found: {}", path.display()))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the effective download directory.
    pub fn download_directory(&self) -> PathBuf {
        self.options
            .download_directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_secs_f64(self.options.page_delay_seconds.max(0.0))
    }

    pub fn phase_pause(&self) -> Duration {
        Duration::from_secs_f64(self.options.phase_pause_seconds.max(0.0))
    }
}
