//! Core types and shared functionality for go2web.
//!
//! This crate provides:
//! - Disk cache store keyed by URL digest
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheEntry, CacheStore, compute_cache_key};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
