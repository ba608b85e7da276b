//! URL handling module
//!
//! This module provides the two URL rules the crawl engine depends on:
//! fragment-stripping normalization (the identity key for every set) and the
//! validity filter deciding which discovered links are eligible for crawling.

mod domain;
mod filter;
mod normalize;

pub use domain::{base_domain_of, url_authority};
pub use filter::LinkFilter;
pub use normalize::normalize_url;
