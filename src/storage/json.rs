//! JSON snapshot storage implementation
//!
//! This module provides a file-based implementation of the SnapshotStore trait.
//! Every save rewrites the whole file through a temporary sibling and a rename,
//! so a reader never observes a half-written snapshot.

use crate::state::CrawlState;
use crate::storage::naming::RunKey;
use crate::storage::traits::{LoadOutcome, SnapshotStore, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Snapshot layout as written: the state plus when it was saved
#[derive(Serialize)]
struct SnapshotRecord<'a> {
    #[serde(flatten)]
    state: &'a CrawlState,
    saved_at: DateTime<Utc>,
}

/// Snapshot layout as read; files without `saved_at` are accepted
#[derive(Deserialize)]
struct StoredSnapshot {
    #[serde(flatten)]
    state: CrawlState,
    #[serde(default)]
    #[allow(dead_code)]
    saved_at: Option<DateTime<Utc>>,
}

/// JSON file snapshot backend
pub struct JsonSnapshotStore {
    path: PathBuf,
    key: RunKey,
    write_lock: Mutex<()>,
}

impl JsonSnapshotStore {
    /// Creates a store for a run configuration inside `dir`
    ///
    /// The file name is derived from the run key, see
    /// [`RunKey::state_file_name`].
    pub fn for_run(dir: &Path, key: RunKey) -> Self {
        let path = dir.join(key.state_file_name());
        Self {
            path,
            key,
            write_lock: Mutex::new(()),
        }
    }

    /// Deletes the snapshot if it exists
    pub fn remove(&self) -> StorageResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn save(&self, state: &CrawlState) -> StorageResult<()> {
        let record = SnapshotRecord {
            state,
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&record)?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;

        tracing::debug!(
            "Saved snapshot to {} ({} visited, {} queued)",
            self.path.display(),
            state.visited_urls.len(),
            state.urls_to_visit.len()
        );
        Ok(())
    }

    fn load(&self) -> LoadOutcome {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return LoadOutcome::Absent,
            Err(e) => return LoadOutcome::Malformed(format!("cannot read snapshot: {}", e)),
        };

        let stored: StoredSnapshot = match serde_json::from_str(&contents) {
            Ok(stored) => stored,
            Err(e) => return LoadOutcome::Malformed(format!("invalid snapshot: {}", e)),
        };

        let state = stored.state;
        if !state.matches_run(
            &self.key.start_url,
            self.key.max_depth,
            self.key.same_domain_only,
        ) {
            return LoadOutcome::Malformed(format!(
                "snapshot belongs to a different run ({} depth {})",
                state.start_url, state.max_depth
            ));
        }

        LoadOutcome::Loaded(Box::new(state))
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
