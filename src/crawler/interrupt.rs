//! Termination signal handling
//!
//! SIGINT (Ctrl-C) and, on unix, SIGTERM are turned into a cooperative
//! shutdown: the main loop finishes its current page and starts no new one,
//! the periodic checkpoint is stopped, and one snapshot is written right away.
//! Only the first signal does this; later ones are logged and ignored.

use crate::crawler::engine::{save_snapshot, SharedState};
use crate::storage::SnapshotStore;
use std::io;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What a termination request should stop and save
#[derive(Clone)]
pub struct ShutdownTrigger {
    shutdown: CancellationToken,
    checkpoint: CancellationToken,
    state: SharedState,
    store: Arc<dyn SnapshotStore>,
}

impl ShutdownTrigger {
    /// # Arguments
    ///
    /// * `shutdown` - Checked by the main loop before each page
    /// * `checkpoint` - Cancels the periodic checkpoint
    /// * `state` - State to snapshot
    /// * `store` - Where to write the snapshot
    pub fn new(
        shutdown: CancellationToken,
        checkpoint: CancellationToken,
        state: SharedState,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            shutdown,
            checkpoint,
            state,
            store,
        }
    }

    /// Handles one termination request
    ///
    /// Returns true if this request started the shutdown, false if a shutdown
    /// was already under way.
    pub fn fire(&self, signal: &str) -> bool {
        if self.shutdown.is_cancelled() {
            tracing::info!("Received {} while already shutting down, ignoring", signal);
            return false;
        }

        tracing::info!("Received {}. Saving state and stopping...", signal);
        self.shutdown.cancel();
        self.checkpoint.cancel();
        save_snapshot(&self.state, self.store.as_ref());
        true
    }
}

/// Background listener for termination signals
pub struct InterruptHandler {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl InterruptHandler {
    /// Installs the signal listeners and starts listening
    pub fn spawn(trigger: ShutdownTrigger) -> io::Result<Self> {
        let mut signals = TerminationSignals::new()?;
        let stop = CancellationToken::new();
        let listener_stop = stop.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = listener_stop.cancelled() => break,
                    received = signals.recv() => match received {
                        Ok(name) => {
                            trigger.fire(name);
                        }
                        Err(e) => {
                            tracing::warn!("Signal listener failed: {}", e);
                            break;
                        }
                    },
                }
            }
        });

        Ok(Self { stop, handle })
    }

    /// Stops listening
    pub async fn stop(self) {
        self.stop.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!("Signal listener ended abnormally: {}", e);
        }
    }
}

struct TerminationSignals {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl TerminationSignals {
    fn new() -> io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            terminate: tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> io::Result<&'static str> {
        #[cfg(unix)]
        {
            tokio::select! {
                result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
                _ = self.terminate.recv() => Ok("SIGTERM"),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await.map(|()| "Ctrl-C")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CrawlState;
    use crate::storage::{JsonSnapshotStore, LoadOutcome, RunKey};
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn trigger(dir: &TempDir) -> (ShutdownTrigger, Arc<JsonSnapshotStore>) {
        let store = Arc::new(JsonSnapshotStore::for_run(
            dir.path(),
            RunKey::new("https://example.com", 2, true),
        ));
        let mut state = CrawlState::new("https://example.com", 2, true).unwrap();
        state.visited_urls.insert("https://example.com");

        let trigger = ShutdownTrigger::new(
            CancellationToken::new(),
            CancellationToken::new(),
            Arc::new(Mutex::new(state)),
            store.clone(),
        );
        (trigger, store)
    }

    #[test]
    fn test_first_signal_shuts_down_and_saves() {
        let dir = TempDir::new().unwrap();
        let (trigger, store) = trigger(&dir);

        assert!(trigger.fire("SIGINT"));
        assert!(trigger.shutdown.is_cancelled());
        assert!(trigger.checkpoint.is_cancelled());

        match store.load() {
            LoadOutcome::Loaded(state) => assert_eq!(state.visited_urls.len(), 1),
            other => panic!("expected snapshot, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_signals_are_ignored() {
        let dir = TempDir::new().unwrap();
        let (trigger, store) = trigger(&dir);

        assert!(trigger.fire("SIGINT"));
        store.remove().unwrap();

        assert!(!trigger.fire("SIGINT"));
        assert!(!trigger.fire("SIGTERM"));
        // no second save happened
        assert!(matches!(store.load(), LoadOutcome::Absent));
    }

    #[tokio::test]
    async fn test_listener_stops_cleanly() {
        let dir = TempDir::new().unwrap();
        let (trigger, _store) = trigger(&dir);

        let handler = InterruptHandler::spawn(trigger.clone()).unwrap();
        handler.stop().await;
        assert!(!trigger.shutdown.is_cancelled());
    }
}
