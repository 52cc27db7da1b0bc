//! Client code for go2web.
//!
//! This crate provides the raw-socket HTTP fetch pipeline, HTML-to-text
//! extraction, and search result scraping used by the CLI.

pub mod extract;
pub mod fetch;
pub mod search;

pub use extract::{clean, decode_entities, page_title};
pub use fetch::{FetchClient, FetchConfig, FetchResponse, NetTransport, RawResponse, Target, Transport};
pub use search::{SearchExtractor, SearchResult, SearchRule, search, search_url};
