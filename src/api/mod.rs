//! Pinterest resource-API module.
//!
//! This module provides:
//! - HTTP client with retry/backoff for the resource endpoints
//! - Raw (loosely-typed) response payload types
//! - Operator input resolution (URL, short link, username)

pub mod client;
pub mod resolver;
pub mod types;

pub use client::ApiClient;
pub use resolver::{ResolvedTarget, UrlResolver};
pub use types::*;
