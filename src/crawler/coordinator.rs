//! Crawler coordinator - main crawl orchestration logic
//!
//! This module owns the lifecycle of a run:
//! - Loading a prior snapshot or seeding a fresh state
//! - Starting and stopping the liveness tasks and the signal listener
//! - Driving the sequential page loop with a politeness delay
//! - Final snapshot, summary and report

use crate::config::{validate, Config};
use crate::crawler::engine::{lock_state, save_snapshot, CrawlEngine, PageOutcome};
use crate::crawler::fetcher::{build_http_client, HttpLinkExtractor, HttpStatusChecker};
use crate::crawler::interrupt::{InterruptHandler, ShutdownTrigger};
use crate::crawler::scheduler::{Liveness, Progress};
use crate::crawler::traits::{LinkExtractor, LinkStatusChecker};
use crate::output::{log_broken_links, log_summary, write_report, BrokenLinkLog, CrawlSummary};
use crate::state::CrawlState;
use crate::storage::{load_or_fresh, open_store, RunKey, SnapshotStore};
use crate::CrawlerError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The frontier was exhausted
    Completed,

    /// A termination request stopped the run; the snapshot allows resuming
    Interrupted,
}

/// Result of a finished run
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub status: RunStatus,
    pub summary: CrawlSummary,

    /// Written only for a completed traversal
    pub report_path: Option<PathBuf>,

    /// Final state, as last saved
    pub state: CrawlState,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    engine: CrawlEngine,
    store: Arc<dyn SnapshotStore>,
    shutdown: CancellationToken,
    install_signal_handlers: bool,
}

impl Coordinator {
    /// Creates a coordinator that crawls over HTTP
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fresh` - Ignore any saved state and start from the start URL
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlerError)` - Invalid configuration or HTTP client failure
    pub fn new(config: Config, fresh: bool) -> Result<Self, CrawlerError> {
        validate(&config)?;

        let client = build_http_client(&config.user_agent)?;
        let extractor = Arc::new(HttpLinkExtractor::new(
            client.clone(),
            config.crawler.page_timeout(),
        ));
        let checker = Arc::new(HttpStatusChecker::new(
            client,
            config.crawler.probe_timeout(),
        ));

        Self::with_collaborators(config, extractor, checker, fresh)
    }

    /// Creates a coordinator with the given page extractor and link checker
    pub fn with_collaborators(
        config: Config,
        extractor: Arc<dyn LinkExtractor>,
        checker: Arc<dyn LinkStatusChecker>,
        fresh: bool,
    ) -> Result<Self, CrawlerError> {
        validate(&config)?;

        let crawler = &config.crawler;
        let key = RunKey::new(
            crawler.start_url.clone(),
            crawler.max_depth,
            crawler.same_domain_only,
        );
        let store: Arc<dyn SnapshotStore> =
            Arc::new(open_store(&config.output.state_dir, key.clone()));

        let restored = if fresh {
            tracing::info!("Ignoring saved state, starting fresh");
            None
        } else {
            load_or_fresh(store.as_ref())
        };

        let state = match restored {
            Some(state) => state,
            None => {
                let mut state = CrawlState::new(
                    &crawler.start_url,
                    crawler.max_depth,
                    crawler.same_domain_only,
                )?;
                state.seed();
                state
            }
        };

        let broken_log = BrokenLinkLog::for_run(&config.output.state_dir, &key);
        let engine = CrawlEngine::new(
            Arc::new(Mutex::new(state)),
            extractor,
            checker,
            Arc::clone(&store),
            Arc::new(Progress::new()),
        )
        .with_broken_log(broken_log);

        Ok(Self {
            config: Arc::new(config),
            engine,
            store,
            shutdown: CancellationToken::new(),
            install_signal_handlers: true,
        })
    }

    /// Disables the process signal listener; the run can still be stopped
    /// through [`Coordinator::interrupt_token`]
    pub fn without_signal_handlers(mut self) -> Self {
        self.install_signal_handlers = false;
        self
    }

    /// Token that requests a cooperative shutdown when cancelled
    pub fn interrupt_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Location of the state snapshot
    pub fn snapshot_path(&self) -> &Path {
        self.store.location()
    }

    /// Copy of the current state
    pub fn state(&self) -> CrawlState {
        lock_state(self.engine.state()).clone()
    }

    /// Runs the crawl until the frontier is empty or a shutdown is requested
    ///
    /// A final snapshot is written however the run ends. An unexpected
    /// internal failure is returned after that snapshot.
    pub async fn run(self) -> Result<CrawlOutcome, CrawlerError> {
        let state = Arc::clone(self.engine.state());
        let crawler = &self.config.crawler;

        tracing::info!("Starting broken link checker for: {}", crawler.start_url);
        tracing::info!(
            "Max depth: {}, Same domain only: {}",
            crawler.max_depth,
            crawler.same_domain_only
        );
        tracing::info!("State file: {}", self.store.location().display());

        let liveness = Liveness::start(
            &self.config.liveness,
            Arc::clone(self.engine.progress()),
            Arc::clone(&state),
            Arc::clone(&self.store),
        );

        let interrupt = if self.install_signal_handlers {
            let trigger = ShutdownTrigger::new(
                self.shutdown.clone(),
                liveness.checkpoint_token(),
                Arc::clone(&state),
                Arc::clone(&self.store),
            );
            match InterruptHandler::spawn(trigger) {
                Ok(handler) => Some(handler),
                Err(e) => {
                    tracing::warn!("Could not install signal handlers: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let result = self.crawl_loop().await;

        if let Some(handler) = interrupt {
            handler.stop().await;
        }
        liveness.shutdown().await;
        save_snapshot(&state, self.store.as_ref());

        let status = match result {
            Ok(status) => status,
            Err(e) => {
                tracing::error!("Unexpected error: {}", e);
                return Err(e);
            }
        };

        let final_state = lock_state(&state).clone();
        let summary = CrawlSummary::from_state(&final_state);

        let report_path = match status {
            RunStatus::Completed => {
                match write_report(&self.config.output.report_dir, &summary, &final_state) {
                    Ok(path) => {
                        tracing::info!("Report generated: {}", path.display());
                        Some(path)
                    }
                    Err(e) => {
                        tracing::error!("Failed to generate report: {}", e);
                        None
                    }
                }
            }
            RunStatus::Interrupted => {
                tracing::info!(
                    "Crawl interrupted; run the same command again to resume from {}",
                    self.store.location().display()
                );
                None
            }
        };

        log_summary(&summary);
        if status == RunStatus::Completed {
            log_broken_links(&final_state.broken_links);
        }

        Ok(CrawlOutcome {
            status,
            summary,
            report_path,
            state: final_state,
        })
    }

    async fn crawl_loop(&self) -> Result<RunStatus, CrawlerError> {
        let delay = self.config.crawler.page_delay();

        loop {
            if self.shutdown.is_cancelled() {
                tracing::info!("Shutdown requested, not starting another page");
                return Ok(RunStatus::Interrupted);
            }

            let Some(target) = self.engine.next_target() else {
                tracing::info!("Frontier is empty, crawl complete");
                return Ok(RunStatus::Completed);
            };

            match self.engine.process_page(target).await? {
                PageOutcome::Crawled {
                    links_found,
                    probed,
                    broken,
                    enqueued,
                } => tracing::debug!(
                    "Page done: {} links, {} probed, {} broken, {} queued",
                    links_found,
                    probed,
                    broken,
                    enqueued
                ),
                PageOutcome::FetchFailed | PageOutcome::Skipped => {}
            }

            if !delay.is_zero() {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}

/// Runs a complete crawl over HTTP
pub async fn run_crawl(config: Config, fresh: bool) -> Result<CrawlOutcome, CrawlerError> {
    Coordinator::new(config, fresh)?.run().await
}
