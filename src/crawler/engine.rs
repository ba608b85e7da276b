//! Crawl step engine
//!
//! Processes one dequeued page at a time: marks it visited, fetches it,
//! probes every unprobed candidate link once, records broken links with their
//! provenance and enqueues children within the depth bound.
//!
//! The state lives behind a mutex shared with the background tasks. The lock
//! is only ever held for synchronous sections and never across an `.await`,
//! so a checkpoint can snapshot the state while a request is in flight.
//! Snapshot writes keep it held from serialization through the rename, which
//! orders them: a file on disk is never older than one written before it.

use crate::crawler::scheduler::Progress;
use crate::crawler::traits::{LinkExtractor, LinkStatusChecker};
use crate::output::BrokenLinkLog;
use crate::state::{BrokenLinkRecord, CrawlState, CrawlTarget};
use crate::storage::SnapshotStore;
use crate::url::{normalize_url, LinkFilter};
use crate::CrawlerError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Crawl state shared between the main loop and background tasks
pub type SharedState = Arc<Mutex<CrawlState>>;

/// Pages between routine progress reports and snapshots
const PROGRESS_EVERY_PAGES: usize = 5;

/// Locks the shared state
///
/// The state stays consistent even if a holder panicked (every mutation is a
/// single insert or push), so a poisoned lock is recovered.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, CrawlState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writes a full snapshot of the shared state
///
/// The state lock is held for the whole write, so concurrent writers land in
/// the order they captured the state. Failures are logged and never
/// propagated. Returns true if the snapshot was written.
pub fn save_snapshot(state: &SharedState, store: &dyn SnapshotStore) -> bool {
    let snapshot = lock_state(state);

    match store.save(&snapshot) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(
                "Failed to save state to {}: {}",
                store.location().display(),
                e
            );
            false
        }
    }
}

/// What happened to one dequeued page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Already visited or beyond the depth bound; nothing was done
    Skipped,

    /// The page itself could not be fetched
    FetchFailed,

    /// The page was fetched and its links processed
    Crawled {
        links_found: usize,
        probed: usize,
        broken: usize,
        enqueued: usize,
    },
}

/// Executes the per-page crawl step
pub struct CrawlEngine {
    state: SharedState,
    filter: LinkFilter,
    extractor: Arc<dyn LinkExtractor>,
    checker: Arc<dyn LinkStatusChecker>,
    store: Arc<dyn SnapshotStore>,
    broken_log: Option<BrokenLinkLog>,
    progress: Arc<Progress>,
}

impl CrawlEngine {
    pub fn new(
        state: SharedState,
        extractor: Arc<dyn LinkExtractor>,
        checker: Arc<dyn LinkStatusChecker>,
        store: Arc<dyn SnapshotStore>,
        progress: Arc<Progress>,
    ) -> Self {
        let filter = lock_state(&state).link_filter();
        Self {
            state,
            filter,
            extractor,
            checker,
            store,
            broken_log: None,
            progress,
        }
    }

    /// Appends every new broken-link record to a text log as well
    pub fn with_broken_log(mut self, log: BrokenLinkLog) -> Self {
        self.broken_log = Some(log);
        self
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn progress(&self) -> &Arc<Progress> {
        &self.progress
    }

    /// Pops the next target, recording its depth as the current depth
    pub fn next_target(&self) -> Option<CrawlTarget> {
        let mut state = lock_state(&self.state);
        let target = state.urls_to_visit.pop()?;
        state.current_depth = target.depth;
        drop(state);

        self.stamp();
        Some(target)
    }

    /// Processes one page
    ///
    /// # Returns
    ///
    /// * `Ok(PageOutcome)` - The page was handled; unreachable pages and links
    ///   are recorded, never returned as errors
    /// * `Err(CrawlerError)` - An unexpected internal failure
    pub async fn process_page(&self, target: CrawlTarget) -> Result<PageOutcome, CrawlerError> {
        let CrawlTarget { url, depth } = target;

        {
            let mut state = lock_state(&self.state);
            if state.visited_urls.contains(&url) || depth > state.max_depth {
                tracing::debug!("Skipping {} (depth {})", url, depth);
                return Ok(PageOutcome::Skipped);
            }
            state.visited_urls.insert(url.as_str());
        }

        tracing::info!("Crawling (depth {}): {}", depth, url);
        self.stamp();

        let page = self.extractor.fetch_and_extract(&url).await?;

        if page.is_failure() {
            tracing::error!("Failed to fetch page: {}", url);
            self.record_broken(BrokenLinkRecord::page_failure(&url, depth));
            save_snapshot(&self.state, self.store.as_ref());
            self.after_page();
            return Ok(PageOutcome::FetchFailed);
        }

        tracing::info!("Found {} links on {}", page.links.len(), url);

        let mut probed = 0;
        let mut broken = 0;
        let mut enqueued = 0;
        let mut skipped = 0;

        for candidate in &page.links {
            let link = normalize_url(candidate);
            if !self.filter.is_eligible(&link) {
                continue;
            }

            let already_checked = {
                let mut state = lock_state(&self.state);
                if state.checked_urls.contains(&link) {
                    if state.enqueue_child(&self.filter, &link, depth) {
                        enqueued += 1;
                    }
                    true
                } else {
                    state.checked_urls.insert(link.as_str());
                    false
                }
            };

            if already_checked {
                skipped += 1;
                tracing::debug!("Skipping already checked URL: {}", link);
                continue;
            }

            probed += 1;
            tracing::info!(
                "Checking link {}/{} (skipped {}): {}",
                probed,
                page.links.len(),
                skipped,
                link
            );

            let outcome = self.checker.probe(&link).await;
            self.stamp();

            if outcome.is_broken() {
                broken += 1;
                tracing::warn!("BROKEN LINK: {} ({})", link, outcome.status_text());
                self.record_broken(BrokenLinkRecord::link_failure(
                    &link,
                    outcome.status_text(),
                    &url,
                    depth + 1,
                ));
            } else {
                tracing::debug!("OK: {} ({})", link, outcome.status_text());
            }

            if lock_state(&self.state).enqueue_child(&self.filter, &link, depth) {
                enqueued += 1;
            }
        }

        tracing::info!("Completed page {} - Found {} broken links", url, broken);

        if broken > 0 {
            save_snapshot(&self.state, self.store.as_ref());
        }
        self.after_page();

        Ok(PageOutcome::Crawled {
            links_found: page.links.len(),
            probed,
            broken,
            enqueued,
        })
    }

    fn record_broken(&self, record: BrokenLinkRecord) {
        if let Some(log) = &self.broken_log {
            if let Err(e) = log.append(&record) {
                tracing::warn!("Failed to append to {}: {}", log.path().display(), e);
            }
        }
        lock_state(&self.state).broken_links.push(record);
    }

    /// Routine progress report and snapshot every few pages
    fn after_page(&self) {
        let visited = self.stamp();
        if visited % PROGRESS_EVERY_PAGES == 0 {
            let counts = self.progress.counts();
            tracing::info!(
                "Progress: {} pages visited, {} broken links found, {} pages remaining",
                counts.visited,
                counts.broken,
                counts.pending
            );
            save_snapshot(&self.state, self.store.as_ref());
        }
    }

    /// Refreshes the progress counters; returns the visited count
    fn stamp(&self) -> usize {
        let state = lock_state(&self.state);
        let visited = state.visited_urls.len();
        self.progress.record(
            visited,
            state.broken_links.len(),
            state.urls_to_visit.len(),
        );
        visited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::traits::{PageFetch, ProbeOutcome};
    use crate::storage::{LoadOutcome, StorageError, StorageResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves scripted pages; unknown pages fail to fetch
    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, Vec<String>>,
    }

    impl FakeSite {
        fn page(mut self, url: &str, links: &[&str]) -> Self {
            self.pages.insert(
                url.to_string(),
                links.iter().map(|l| l.to_string()).collect(),
            );
            self
        }
    }

    #[async_trait]
    impl LinkExtractor for FakeSite {
        async fn fetch_and_extract(&self, url: &str) -> Result<PageFetch, CrawlerError> {
            Ok(match self.pages.get(url) {
                Some(links) => PageFetch::fetched(200, links.clone()),
                None => PageFetch::failed(),
            })
        }
    }

    /// Answers 404 for listed URLs, 200 otherwise, and counts probes
    #[derive(Default)]
    struct FakeChecker {
        broken: Vec<String>,
        probes: Mutex<HashMap<String, usize>>,
    }

    impl FakeChecker {
        fn broken(urls: &[&str]) -> Self {
            Self {
                broken: urls.iter().map(|u| u.to_string()).collect(),
                probes: Mutex::new(HashMap::new()),
            }
        }

        fn probes_of(&self, url: &str) -> usize {
            self.probes.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl LinkStatusChecker for FakeChecker {
        async fn probe(&self, url: &str) -> ProbeOutcome {
            *self.probes.lock().unwrap().entry(url.to_string()).or_default() += 1;
            if self.broken.iter().any(|b| b == url) {
                ProbeOutcome::responded(404, "Not Found")
            } else {
                ProbeOutcome::responded(200, "OK")
            }
        }
    }

    /// Counts saves and keeps the last snapshot in memory
    #[derive(Default)]
    struct MemoryStore {
        saves: AtomicUsize,
        last: Mutex<Option<CrawlState>>,
        fail: bool,
    }

    impl SnapshotStore for MemoryStore {
        fn save(&self, state: &CrawlState) -> StorageResult<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            *self.last.lock().unwrap() = Some(state.clone());
            Ok(())
        }

        fn load(&self) -> LoadOutcome {
            match self.last.lock().unwrap().clone() {
                Some(state) => LoadOutcome::Loaded(Box::new(state)),
                None => LoadOutcome::Absent,
            }
        }

        fn location(&self) -> &Path {
            Path::new("memory")
        }
    }

    struct Harness {
        engine: CrawlEngine,
        checker: Arc<FakeChecker>,
        store: Arc<MemoryStore>,
    }

    fn harness(max_depth: u32, site: FakeSite, checker: FakeChecker, store: MemoryStore) -> Harness {
        let mut state = CrawlState::new("https://example.com", max_depth, true).unwrap();
        state.seed();
        let checker = Arc::new(checker);
        let store = Arc::new(store);
        let engine = CrawlEngine::new(
            Arc::new(Mutex::new(state)),
            Arc::new(site),
            checker.clone(),
            store.clone(),
            Arc::new(Progress::new()),
        );
        Harness {
            engine,
            checker,
            store,
        }
    }

    async fn drain(engine: &CrawlEngine) {
        while let Some(target) = engine.next_target() {
            engine.process_page(target).await.unwrap();
        }
    }

    fn example_site() -> FakeSite {
        FakeSite::default()
            .page(
                "https://example.com",
                &[
                    "https://example.com/page1",
                    "https://example.com/page2",
                    "https://example.com/broken",
                ],
            )
            .page("https://example.com/page1", &["https://example.com/page2"])
            .page("https://example.com/page2", &[])
    }

    #[tokio::test]
    async fn test_broken_link_recorded_with_provenance() {
        let h = harness(
            2,
            example_site(),
            FakeChecker::broken(&["https://example.com/broken"]),
            MemoryStore::default(),
        );

        let target = h.engine.next_target().unwrap();
        let outcome = h.engine.process_page(target).await.unwrap();
        assert_eq!(
            outcome,
            PageOutcome::Crawled {
                links_found: 3,
                probed: 3,
                broken: 1,
                enqueued: 3
            }
        );

        let state = lock_state(h.engine.state()).clone();
        assert_eq!(state.broken_links.len(), 1);
        let record = &state.broken_links[0];
        assert_eq!(record.url, "https://example.com/broken");
        assert_eq!(record.found_on, "https://example.com");
        assert_eq!(record.depth, 1);
        assert_eq!(record.status, "404 Not Found");

        // eager save after a broken link on this page
        assert!(h.store.saves.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_full_traversal_scenario() {
        let h = harness(
            2,
            example_site(),
            FakeChecker::broken(&["https://example.com/broken"]),
            MemoryStore::default(),
        );
        drain(&h.engine).await;

        let state = lock_state(h.engine.state()).clone();
        for url in [
            "https://example.com",
            "https://example.com/page1",
            "https://example.com/page2",
        ] {
            assert!(state.visited_urls.contains(url), "missing {}", url);
        }

        // the broken page is crawled too and fails on its own
        assert_eq!(state.broken_links.len(), 2);
        let page_failure = &state.broken_links[1];
        assert_eq!(page_failure.url, "https://example.com/broken");
        assert_eq!(page_failure.found_on, "https://example.com/broken");
        assert_eq!(page_failure.status, "Failed to fetch");
        assert_eq!(page_failure.depth, 1);
        assert!(state.urls_to_visit.is_empty());
    }

    #[tokio::test]
    async fn test_link_seen_twice_is_probed_once() {
        let site = FakeSite::default()
            .page(
                "https://example.com",
                &["https://example.com/a", "https://example.com/a#section"],
            )
            .page("https://example.com/a", &["https://example.com/a"]);
        let h = harness(3, site, FakeChecker::default(), MemoryStore::default());

        drain(&h.engine).await;

        assert_eq!(h.checker.probes_of("https://example.com/a"), 1);
        let state = lock_state(h.engine.state()).clone();
        assert!(state.checked_urls.contains("https://example.com/a"));
        assert_eq!(state.visited_urls.len(), 2);
    }

    #[tokio::test]
    async fn test_depth_bound_is_respected() {
        let site = FakeSite::default()
            .page("https://example.com", &["https://example.com/one"])
            .page("https://example.com/one", &["https://example.com/two"])
            .page("https://example.com/two", &["https://example.com/three"]);
        let h = harness(1, site, FakeChecker::default(), MemoryStore::default());

        drain(&h.engine).await;

        let state = lock_state(h.engine.state()).clone();
        assert!(state.visited_urls.contains("https://example.com/one"));
        assert!(!state.visited_urls.contains("https://example.com/two"));
        // links on the deepest page are still probed, just not crawled
        assert_eq!(h.checker.probes_of("https://example.com/two"), 1);
        assert_eq!(h.checker.probes_of("https://example.com/three"), 0);
    }

    #[tokio::test]
    async fn test_target_beyond_max_depth_is_skipped() {
        let h = harness(1, example_site(), FakeChecker::default(), MemoryStore::default());

        let outcome = h
            .engine
            .process_page(CrawlTarget::new("https://example.com/page1", 2))
            .await
            .unwrap();

        assert_eq!(outcome, PageOutcome::Skipped);
        assert!(lock_state(h.engine.state()).visited_urls.is_empty());
    }

    #[tokio::test]
    async fn test_visited_page_is_skipped() {
        let h = harness(2, example_site(), FakeChecker::default(), MemoryStore::default());
        let target = CrawlTarget::new("https://example.com/page2", 1);

        h.engine.process_page(target.clone()).await.unwrap();
        let outcome = h.engine.process_page(target).await.unwrap();
        assert_eq!(outcome, PageOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_out_of_scope_links_are_ignored() {
        let site = FakeSite::default().page(
            "https://example.com",
            &["https://other.com/x", "mailto:someone@example.com", "https://example.com/in"],
        );
        let h = harness(1, site, FakeChecker::default(), MemoryStore::default());

        let target = h.engine.next_target().unwrap();
        h.engine.process_page(target).await.unwrap();

        assert_eq!(h.checker.probes_of("https://other.com/x"), 0);
        assert_eq!(h.checker.probes_of("https://example.com/in"), 1);
    }

    #[tokio::test]
    async fn test_page_fetch_failure_recorded_at_page_depth() {
        let h = harness(2, FakeSite::default(), FakeChecker::default(), MemoryStore::default());

        let target = h.engine.next_target().unwrap();
        let outcome = h.engine.process_page(target).await.unwrap();
        assert_eq!(outcome, PageOutcome::FetchFailed);

        let state = lock_state(h.engine.state()).clone();
        assert_eq!(state.broken_links.len(), 1);
        assert_eq!(state.broken_links[0].depth, 0);
        assert_eq!(state.broken_links[0].found_on, "https://example.com");
        assert!(h.store.saves.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_failing_store_does_not_stop_the_crawl() {
        let store = MemoryStore {
            fail: true,
            ..MemoryStore::default()
        };
        let h = harness(
            2,
            example_site(),
            FakeChecker::broken(&["https://example.com/broken"]),
            store,
        );

        drain(&h.engine).await;

        assert!(h.store.saves.load(Ordering::SeqCst) >= 1);
        assert_eq!(lock_state(h.engine.state()).visited_urls.len(), 4);
    }

    #[tokio::test]
    async fn test_broken_links_are_appended_to_log() {
        let dir = tempfile::TempDir::new().unwrap();
        let key = crate::storage::RunKey::new("https://example.com", 2, true);
        let log = BrokenLinkLog::for_run(dir.path(), &key);
        let log_path: PathBuf = log.path().to_path_buf();

        let mut h = harness(
            2,
            example_site(),
            FakeChecker::broken(&["https://example.com/broken"]),
            MemoryStore::default(),
        );
        h.engine = h.engine.with_broken_log(log);

        drain(&h.engine).await;

        let contents = std::fs::read_to_string(log_path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    /// Stalls inside its first save until the test has moved on
    struct SlowFirstSave {
        inner: crate::storage::JsonSnapshotStore,
        entered: AtomicBool,
    }

    impl SnapshotStore for SlowFirstSave {
        fn save(&self, state: &CrawlState) -> StorageResult<()> {
            if !self.entered.swap(true, Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(300));
            }
            self.inner.save(state)
        }

        fn load(&self) -> LoadOutcome {
            self.inner.load()
        }

        fn location(&self) -> &Path {
            self.inner.location()
        }
    }

    #[test]
    fn test_overlapping_saves_keep_newest_snapshot() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = Arc::new(SlowFirstSave {
            inner: crate::storage::JsonSnapshotStore::for_run(
                dir.path(),
                crate::storage::RunKey::new("https://example.com", 2, true),
            ),
            entered: AtomicBool::new(false),
        });
        let state: SharedState = Arc::new(Mutex::new(
            CrawlState::new("https://example.com", 2, true).unwrap(),
        ));

        let first = {
            let state = Arc::clone(&state);
            let store = Arc::clone(&store);
            std::thread::spawn(move || save_snapshot(&state, store.as_ref()))
        };
        while !store.entered.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }

        lock_state(&state)
            .broken_links
            .push(BrokenLinkRecord::page_failure("https://example.com/gone", 1));
        assert!(save_snapshot(&state, store.as_ref()));
        assert!(first.join().unwrap());

        match store.load() {
            LoadOutcome::Loaded(saved) => assert_eq!(saved.broken_links.len(), 1),
            other => panic!("expected snapshot, got {:?}", other),
        }
    }
}
