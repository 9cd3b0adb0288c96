//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Pinterest profile scraper and downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "pinterest-downloader",
    version,
    about = "Scrape a Pinterest profile and download its media",
    long_about = "Scrapes a profile's boards and created pins into a JSON graph,\n\
                  then downloads the referenced images and videos.\n\n\
                  Accepts a profile URL, a pin.it short link, or a bare username."
)]
pub struct Args {
    /// Profile URL, pin.it short link, or username to scrape.
    pub target: Option<String>,

    /// Base directory for downloads.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Maximum concurrent downloads per batch.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// API base URL (e.g. a regional mirror).
    #[arg(long, env = "PINTEREST_BASE_URL")]
    pub base_url: Option<String>,

    /// Browser user agent string.
    #[arg(short = 'a', long = "user-agent", env = "PINTEREST_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Scrape and persist the profile graph only; skip all downloads.
    #[arg(long)]
    pub scrape_only: bool,

    /// Re-run downloads from a previously saved profile graph JSON.
    #[arg(long, value_name = "FILE", conflicts_with = "target")]
    pub from_json: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(dir) = &self.download_directory {
            config.options.download_directory = Some(dir.clone());
        }

        if let Some(cap) = self.concurrency {
            config.options.max_concurrent_downloads = cap;
        }

        if let Some(base_url) = &self.base_url {
            config.network.base_url = base_url.clone();
        }

        if let Some(user_agent) = &self.user_agent {
            config.network.user_agent = user_agent.clone();
        }

        if self.scrape_only {
            config.options.scrape_only = true;
        }
    }
}
