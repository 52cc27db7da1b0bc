//! Disk cache for raw HTTP responses.
//!
//! This module provides an opportunistic, file-per-URL cache:
//!
//! - Keys are the hex SHA-256 of the normalized URL
//! - Entries hold the header block followed by the body, verbatim
//! - Freshness is decided by file modification time against a TTL
//! - Stale entries are bypassed on read and overwritten on the next store

pub mod hash;
pub mod store;

pub use crate::Error;

pub use hash::compute_cache_key;
pub use store::{CacheEntry, CacheStore};
