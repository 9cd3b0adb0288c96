//! Normalized data model.
//!
//! This module provides:
//! - The stable on-disk record types (user, board, post, media ref)
//! - Conversion from raw API payloads with explicit default policies

pub mod convert;
pub mod graph;

pub use convert::{board_from_raw, post_from_raw, user_from_raw};
pub use graph::{Board, MediaKind, MediaRef, Post, ProfileGraph, User, CREATED_BOARD_ID};
