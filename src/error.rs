//! Error types for the pinterest-downloader application.

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // API errors
    #[error("API error: {0}")]
    Api(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Unexpected payload shape: {0}")]
    Payload(String),

    #[error("Could not resolve a username from input: {0}")]
    UnresolvedTarget(String),

    // Download errors
    #[error("Download failed: {0}")]
    Download(String),

    #[error("Board '{0}' has no pins to download")]
    EmptyBoard(String),

    // File system errors
    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    // External tool errors
    #[error("Remux error: {0}")]
    Remux(String),

    #[error("ffmpeg not found. Please install ffmpeg and ensure it's in your PATH.")]
    RemuxNotFound,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Whether a caller may retry the failed operation.
    ///
    /// Terminal conditions (unknown user, malformed payload, local
    /// misconfiguration) are never retried; everything network-shaped is.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => !matches!(e.status(), Some(s) if s == reqwest::StatusCode::NOT_FOUND),
            Error::Api(_) | Error::Download(_) | Error::RateLimited(_) => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const API_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::Api("server hiccup".into()).is_transient());
        assert!(Error::RateLimited(60).is_transient());
        assert!(!Error::UserNotFound("ghost".into()).is_transient());
        assert!(!Error::Payload("missing field".into()).is_transient());
        assert!(!Error::Config("bad".into()).is_transient());
    }
}
