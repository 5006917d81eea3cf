//! Core types and shared functionality for offpage.
//!
//! This crate provides:
//! - URL canonicalization and content addressing
//! - File-backed content store
//! - SQLite-backed scroll-position store
//! - Unified error types
//! - Configuration structures

pub mod addressing;
pub mod config;
pub mod error;
pub mod position;
pub mod store;

pub use config::AppConfig;
pub use error::Error;
pub use position::{Point, PositionDb};
pub use store::ContentStore;
