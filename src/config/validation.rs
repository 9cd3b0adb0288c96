//! Configuration validation logic.

use url::Url;

use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Upper bound on the download worker pool.
const MAX_CONCURRENT_LIMIT: usize = 200;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_base_url(&config.network.base_url)?;
    validate_concurrency(config.options.max_concurrent_downloads)?;
    validate_statuses(&config.network.retryable_statuses)?;
    validate_backoff(config.network.backoff_factor)?;

    Ok(())
}

pub fn validate_base_url(base_url: &str) -> Result<()> {
    let url = Url::parse(base_url).map_err(|e| Error::ConfigValidation {
        field: "network.base_url".to_string(),
        message: format!("not a valid URL: {}", e),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::ConfigValidation {
            field: "network.base_url".to_string(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(())
}

pub fn validate_concurrency(cap: usize) -> Result<()> {
    if cap == 0 {
        return Err(Error::ConfigValidation {
            field: "options.max_concurrent_downloads".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if cap > MAX_CONCURRENT_LIMIT {
        return Err(Error::ConfigValidation {
            field: "options.max_concurrent_downloads".to_string(),
            message: format!("must be at most {}", MAX_CONCURRENT_LIMIT),
        });
    }

    Ok(())
}

pub fn validate_statuses(statuses: &[u16]) -> Result<()> {
    for status in statuses {
        if !(100..=599).contains(status) {
            return Err(Error::ConfigValidation {
                field: "network.retryable_statuses".to_string(),
                message: format!("{} is not an HTTP status code", status),
            });
        }
    }

    Ok(())
}

pub fn validate_backoff(factor: f64) -> Result<()> {
    if !factor.is_finite() || factor < 0.0 {
        return Err(Error::ConfigValidation {
            field: "network.backoff_factor".to_string(),
            message: "must be a non-negative number".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        assert!(validate_base_url("not a url").is_err());
        assert!(validate_base_url("ftp://pinterest.com").is_err());
        assert!(validate_base_url("https://jp.pinterest.com").is_ok());
    }

    #[test]
    fn test_concurrency_bounds() {
        assert!(validate_concurrency(0).is_err());
        assert!(validate_concurrency(1).is_ok());
        assert!(validate_concurrency(50).is_ok());
        assert!(validate_concurrency(201).is_err());
    }

    #[test]
    fn test_status_codes_checked() {
        assert!(validate_statuses(&[500, 502]).is_ok());
        assert!(validate_statuses(&[99]).is_err());
        assert!(validate_statuses(&[600]).is_err());
    }

    #[test]
    fn test_backoff_must_be_non_negative() {
        assert!(validate_backoff(0.0).is_ok());
        assert!(validate_backoff(0.3).is_ok());
        assert!(validate_backoff(-1.0).is_err());
        assert!(validate_backoff(f64::NAN).is_err());
    }
}
