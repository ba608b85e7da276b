//! Storage module for persisting crawl snapshots
//!
//! This module handles all persistence for the crawler, including:
//! - Deterministic artifact names derived from the run configuration
//! - Atomic JSON snapshots of the full traversal state
//! - Loading a prior snapshot for resumption

mod json;
mod naming;
mod traits;

pub use json::JsonSnapshotStore;
pub use naming::RunKey;
pub use traits::{LoadOutcome, SnapshotStore, StorageError, StorageResult};

use crate::state::CrawlState;
use std::path::Path;

/// Opens the snapshot store for a run configuration
///
/// # Arguments
///
/// * `dir` - Directory holding snapshot files
/// * `key` - The run configuration
pub fn open_store(dir: &Path, key: RunKey) -> JsonSnapshotStore {
    JsonSnapshotStore::for_run(dir, key)
}

/// Loads the prior state for a run, or returns None to start fresh
///
/// Malformed snapshots are logged and ignored.
pub fn load_or_fresh(store: &dyn SnapshotStore) -> Option<CrawlState> {
    match store.load() {
        LoadOutcome::Loaded(state) => {
            tracing::info!(
                "Resuming from {} ({} visited, {} queued, {} broken)",
                store.location().display(),
                state.visited_urls.len(),
                state.urls_to_visit.len(),
                state.broken_links.len()
            );
            Some(*state)
        }
        LoadOutcome::Absent => {
            tracing::info!("No saved state at {}, starting fresh", store.location().display());
            None
        }
        LoadOutcome::Malformed(reason) => {
            tracing::warn!(
                "Ignoring unusable state at {}: {}; starting fresh",
                store.location().display(),
                reason
            );
            None
        }
    }
}
