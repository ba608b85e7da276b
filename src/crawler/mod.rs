//! Crawler module for page fetching and link checking
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and HEAD/GET link probing
//! - HTML parsing and link extraction
//! - The per-page crawl step
//! - Liveness tasks (watchdog, periodic checkpoint) and signal handling
//! - Overall crawl coordination

mod coordinator;
mod engine;
mod fetcher;
mod interrupt;
mod parser;
mod scheduler;
mod traits;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome, RunStatus};
pub use engine::{lock_state, save_snapshot, CrawlEngine, PageOutcome, SharedState};
pub use fetcher::{build_http_client, HttpLinkExtractor, HttpStatusChecker};
pub use interrupt::{InterruptHandler, ShutdownTrigger};
pub use parser::extract_links;
pub use scheduler::{check_watchdog, Liveness, Progress, ProgressCounts, RecurringTask};
pub use traits::{LinkExtractor, LinkStatusChecker, PageFetch, ProbeOutcome};
