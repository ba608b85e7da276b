//! State module for tracking crawl progress
//!
//! This module holds everything the crawl engine mutates while it walks the
//! site, and which is persisted as a whole to make a run resumable.
//!
//! # Components
//!
//! - `VisitedSet` / `CheckedSet`: URLs whose page was crawled / whose status was probed
//! - `Frontier`: FIFO of `CrawlTarget`s still to crawl
//! - `BrokenLinkRecord`: an unreachable link together with where it was found
//! - `CrawlState`: the aggregate snapshot of a traversal

mod broken;
mod crawl_state;
mod frontier;
mod tracker;

// Re-export main types
pub use broken::{BrokenLinkRecord, FAILED_TO_FETCH};
pub use crawl_state::CrawlState;
pub use frontier::{CrawlTarget, Frontier};
pub use tracker::{Checked, CheckedSet, UrlSet, Visited, VisitedSet};
