//! Liveness scheduling: watchdog and periodic checkpoint
//!
//! This module handles:
//! - Activity stamping and progress counters shared with the main loop
//! - A recurring background task abstraction with explicit cancellation
//! - The watchdog that reports progress when the crawl looks idle
//! - The periodic checkpoint that snapshots the state on a fixed interval
//!
//! Both background tasks run on their own tokio tasks, so they keep firing
//! while the main loop is suspended on network I/O.

use crate::config::LivenessConfig;
use crate::crawler::engine::{save_snapshot, SharedState};
use crate::storage::SnapshotStore;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Progress counters and the last-activity stamp
///
/// Written by the main loop, read by the watchdog. Lock-free so that reading
/// it never contends with the crawl state.
#[derive(Debug)]
pub struct Progress {
    origin: Instant,
    last_activity_ms: AtomicU64,
    visited: AtomicUsize,
    broken: AtomicUsize,
    pending: AtomicUsize,
}

/// Point-in-time copy of the progress counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCounts {
    pub visited: usize,
    pub broken: usize,
    pub pending: usize,
}

impl Progress {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_activity_ms: AtomicU64::new(0),
            visited: AtomicUsize::new(0),
            broken: AtomicUsize::new(0),
            pending: AtomicUsize::new(0),
        }
    }

    /// Marks that a unit of work just happened
    pub fn touch(&self) {
        self.last_activity_ms
            .store(self.elapsed_ms(), Ordering::Relaxed);
    }

    /// Time since the last activity stamp
    pub fn idle_for(&self) -> Duration {
        let last = self.last_activity_ms.load(Ordering::Relaxed);
        Duration::from_millis(self.elapsed_ms().saturating_sub(last))
    }

    /// Updates the counters and stamps activity
    pub fn record(&self, visited: usize, broken: usize, pending: usize) {
        self.visited.store(visited, Ordering::Relaxed);
        self.broken.store(broken, Ordering::Relaxed);
        self.pending.store(pending, Ordering::Relaxed);
        self.touch();
    }

    pub fn counts(&self) -> ProgressCounts {
        ProgressCounts {
            visited: self.visited.load(Ordering::Relaxed),
            broken: self.broken.load(Ordering::Relaxed),
            pending: self.pending.load(Ordering::Relaxed),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// A background body that runs every `period` until cancelled
///
/// The body is awaited before the next period starts, so it never runs
/// concurrently with itself. Cancellation takes effect between runs: a body
/// that has started always finishes.
pub struct RecurringTask {
    name: &'static str,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RecurringTask {
    /// Spawns a recurring task whose lifetime is bounded by `parent`
    pub fn spawn<F, Fut>(
        name: &'static str,
        period: Duration,
        parent: &CancellationToken,
        mut body: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = parent.child_token();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = tokio::time::sleep(period) => body().await,
                }
            }
            tracing::debug!("{} stopped", name);
        });

        Self {
            name,
            token,
            handle,
        }
    }

    /// Token that cancels this task, for handing to other components
    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels the task and waits for it to wind down
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!("{} task ended abnormally: {}", self.name, e);
        }
    }
}

/// Spawns the watchdog
///
/// Every `check_every` it compares the time since the last activity stamp with
/// `timeout`. When exceeded it logs a progress report and resets the stamp. It
/// never aborts the crawl.
pub fn spawn_watchdog(
    progress: Arc<Progress>,
    timeout: Duration,
    check_every: Duration,
    parent: &CancellationToken,
) -> RecurringTask {
    RecurringTask::spawn("watchdog", check_every, parent, move || {
        let progress = Arc::clone(&progress);
        async move {
            check_watchdog(&progress, timeout);
        }
    })
}

/// One watchdog check; returns true if the timeout was exceeded
pub fn check_watchdog(progress: &Progress, timeout: Duration) -> bool {
    let idle = progress.idle_for();
    if idle <= timeout {
        return false;
    }

    let counts = progress.counts();
    tracing::warn!(
        "Watchdog: no activity for {}s. Progress: {} pages visited, {} broken links found, {} pages remaining",
        idle.as_secs(),
        counts.visited,
        counts.broken,
        counts.pending
    );
    progress.touch();
    true
}

/// Spawns the periodic checkpoint
///
/// Every `interval` the whole state is snapshotted. A failed write is logged
/// and the next checkpoint is still scheduled.
pub fn spawn_checkpoint(
    state: SharedState,
    store: Arc<dyn SnapshotStore>,
    interval: Duration,
    parent: &CancellationToken,
) -> RecurringTask {
    RecurringTask::spawn("checkpoint", interval, parent, move || {
        let state = state.clone();
        let store = Arc::clone(&store);
        async move {
            tracing::info!("Periodic checkpoint");
            save_snapshot(&state, store.as_ref());
        }
    })
}

/// The two liveness tasks of a run
pub struct Liveness {
    root: CancellationToken,
    watchdog: RecurringTask,
    checkpoint: RecurringTask,
}

impl Liveness {
    /// Starts the watchdog and the periodic checkpoint
    pub fn start(
        config: &LivenessConfig,
        progress: Arc<Progress>,
        state: SharedState,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        let root = CancellationToken::new();
        let watchdog = spawn_watchdog(
            progress,
            config.watchdog_timeout(),
            config.watchdog_check(),
            &root,
        );
        let checkpoint = spawn_checkpoint(state, store, config.checkpoint_interval(), &root);

        Self {
            root,
            watchdog,
            checkpoint,
        }
    }

    /// Token that stops only the periodic checkpoint
    pub fn checkpoint_token(&self) -> CancellationToken {
        self.checkpoint.cancel_token()
    }

    /// Cancels both tasks and waits for them
    pub async fn shutdown(self) {
        self.root.cancel();
        self.watchdog.stop().await;
        self.checkpoint.stop().await;
    }
}
