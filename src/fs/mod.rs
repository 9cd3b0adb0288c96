//! Filesystem module.
//!
//! Provides:
//! - Filename sanitization and atomic collision-free allocation
//! - Download tree layout

pub mod naming;
pub mod paths;

pub use naming::{allocate_unique, reserve_unique, sanitize, sanitize_with_limit};
pub use paths::ProfilePaths;
