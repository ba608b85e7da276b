//! Storage traits and error types
//!
//! This module defines the trait interface for snapshot backends and
//! associated error types.

use crate::state::CrawlState;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Outcome of reading a prior snapshot
#[derive(Debug)]
pub enum LoadOutcome {
    /// A well-formed snapshot was read
    Loaded(Box<CrawlState>),

    /// No snapshot exists for this run configuration
    Absent,

    /// A snapshot exists but cannot be used; the reason is human readable
    Malformed(String),
}

/// Trait for snapshot backends
///
/// A store persists the entire traversal state under a key derived from the
/// run configuration. Implementations must serialize concurrent `save` calls
/// so that the periodic checkpoint, the eager save after broken links, the
/// interrupt save and the final save can never interleave partial contents.
pub trait SnapshotStore: Send + Sync {
    /// Writes a full snapshot, replacing any previous one
    fn save(&self, state: &CrawlState) -> StorageResult<()>;

    /// Reads the snapshot for this store's key
    ///
    /// Read problems are never errors: an unreadable or invalid file is
    /// reported as [`LoadOutcome::Malformed`] so the caller can start fresh.
    fn load(&self) -> LoadOutcome;

    /// Location of the snapshot, for log messages
    fn location(&self) -> &Path;
}
