//! Prefetching queue for the epigram display.
//!
//! Owns the currently displayed epigram and a FIFO backlog, and tops the
//! backlog up in the background so a display shell always has an item ready
//! without visible fetch latency. All mutations go through this service;
//! observers read point-in-time snapshots from a watch channel.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, info_span, warn, Instrument};

use eg_core::ports::{ClockPort, ContentSourceError, ContentSourcePort, DisplayEventPort};
use eg_core::{Epigram, EpigramDraft, EpigramId};

/// Tuning knobs for the prefetch queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Items requested per fetch.
    pub batch_size: usize,
    /// Backlog length at or below which a background refill is triggered.
    pub low_water_mark: usize,
    /// Minimum spacing between two refill fetches.
    pub refill_throttle_ms: i64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            low_water_mark: 2,
            refill_throttle_ms: 10_000,
        }
    }
}

/// Whether the pipeline has anything to show.
///
/// `Empty` is deliberately distinct from `NotLoaded`: the former means the
/// source answered with zero items, the latter that no load has completed
/// yet (or the only attempts failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentAvailability {
    NotLoaded,
    Available,
    Empty,
}

/// Point-in-time view of the queue published to observers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct QueueSnapshot {
    pub current: Option<Epigram>,
    pub backlog_len: usize,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub availability: ContentAvailability,
}

struct QueueState {
    current: Option<Epigram>,
    backlog: VecDeque<Epigram>,
    /// The user's own submissions, newest first.
    authored: Vec<Epigram>,
    is_loading: bool,
    last_error: Option<String>,
    last_refill_ms: Option<i64>,
    /// Set once any fetch has completed successfully, so an empty result can
    /// be told apart from "never loaded".
    loaded_once: bool,
}

struct QueueInner {
    source: Arc<dyn ContentSourcePort>,
    clock: Arc<dyn ClockPort>,
    display: Arc<dyn DisplayEventPort>,
    config: QueueConfig,
    state: Mutex<QueueState>,
    snapshot_tx: watch::Sender<QueueSnapshot>,
}

/// Handle to the queue service. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct EpigramQueue {
    inner: Arc<QueueInner>,
}

impl EpigramQueue {
    pub fn new(
        source: Arc<dyn ContentSourcePort>,
        clock: Arc<dyn ClockPort>,
        display: Arc<dyn DisplayEventPort>,
        config: QueueConfig,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(QueueSnapshot {
            current: None,
            backlog_len: 0,
            is_loading: false,
            last_error: None,
            availability: ContentAvailability::NotLoaded,
        });

        Self {
            inner: Arc::new(QueueInner {
                source,
                clock,
                display,
                config,
                state: Mutex::new(QueueState {
                    current: None,
                    backlog: VecDeque::new(),
                    authored: Vec::new(),
                    is_loading: false,
                    last_error: None,
                    last_refill_ms: None,
                    loaded_once: false,
                }),
                snapshot_tx,
            }),
        }
    }

    /// Observe queue snapshots. The receiver immediately sees the latest one.
    pub fn subscribe(&self) -> watch::Receiver<QueueSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> QueueSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    pub fn current(&self) -> Option<Epigram> {
        self.lock().current.clone()
    }

    /// The user's own submissions, newest first.
    pub fn authored(&self) -> Vec<Epigram> {
        self.lock().authored.clone()
    }

    /// Fetch the first batch and put an item on display.
    ///
    /// No-op while another load is already in flight. An empty batch clears
    /// the current item without raising an error; a failed fetch records the
    /// error, leaves prior state untouched and may simply be retried.
    pub async fn load_initial(&self) -> Result<(), ContentSourceError> {
        let span = info_span!("queue.load_initial");
        async {
            {
                let mut state = self.lock();
                if state.is_loading {
                    debug!("load already in progress; ignoring re-entry");
                    return Ok(());
                }
                state.is_loading = true;
                state.last_error = None;
                self.publish(&state);
            }

            let result = self
                .inner
                .source
                .fetch_random_batch(self.inner.config.batch_size, None)
                .await;

            match result {
                Ok(batch) => {
                    let displayed = {
                        let mut state = self.lock();
                        state.is_loading = false;
                        state.loaded_once = true;

                        let mut items = batch.into_iter();
                        let displayed = match items.next() {
                            Some(first) => {
                                let mut seen = HashSet::from([first.id]);
                                let mut backlog = VecDeque::new();
                                for item in items {
                                    if seen.insert(item.id) {
                                        backlog.push_back(item);
                                    }
                                }
                                state.current = Some(first);
                                state.backlog = backlog;
                                true
                            }
                            None => {
                                debug!("source returned an empty batch; nothing to display");
                                state.current = None;
                                false
                            }
                        };
                        self.publish(&state);
                        displayed
                    };

                    if displayed {
                        self.inner.display.item_displayed();
                    }
                    Ok(())
                }
                Err(err) => {
                    let mut state = self.lock();
                    state.is_loading = false;
                    state.last_error = Some(err.to_string());
                    self.publish(&state);
                    warn!(error = %err, "initial epigram load failed");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Move the next backlog item on display.
    ///
    /// With an empty backlog this delegates entirely to [`Self::load_initial`].
    /// When the remaining backlog drops to the low-water mark a background
    /// refill is kicked off without blocking the caller.
    pub async fn advance(&self) -> Result<(), ContentSourceError> {
        let needs_refill = {
            let mut state = self.lock();
            match state.backlog.pop_front() {
                Some(next) => {
                    state.current = Some(next);
                    let needs_refill =
                        state.backlog.len() <= self.inner.config.low_water_mark;
                    self.publish(&state);
                    Some(needs_refill)
                }
                None => None,
            }
        };

        let Some(needs_refill) = needs_refill else {
            return self.load_initial().await;
        };

        self.inner.display.item_displayed();

        if needs_refill {
            let queue = self.clone();
            tokio::spawn(async move { queue.refill().await });
        }
        Ok(())
    }

    /// Top the backlog up from the source.
    ///
    /// Background optimization: throttled, skipped while a foreground load is
    /// active, and failures are logged rather than surfaced. The dedup set is
    /// recomputed from live state at insertion time, since another operation
    /// may have changed the queue while the fetch was in flight.
    async fn refill(&self) {
        let span = info_span!("queue.refill");
        async {
            let exclude = {
                let mut state = self.lock();
                if state.is_loading {
                    debug!("skipping refill while a foreground load is active");
                    return;
                }
                let now = self.inner.clock.now_ms();
                if let Some(last) = state.last_refill_ms {
                    if now - last < self.inner.config.refill_throttle_ms {
                        debug!(elapsed_ms = now - last, "skipping refill inside throttle window");
                        return;
                    }
                }
                state.last_refill_ms = Some(now);
                state.current.as_ref().map(|e| e.id)
            };

            let batch = match self
                .inner
                .source
                .fetch_random_batch(self.inner.config.batch_size, exclude)
                .await
            {
                Ok(batch) => batch,
                Err(err) => {
                    // The next low-water trigger retries; nothing to surface.
                    warn!(error = %err, "background refill failed");
                    return;
                }
            };
            if batch.is_empty() {
                return;
            }

            let mut state = self.lock();
            if state.is_loading {
                debug!("discarding refill batch; a foreground load took over");
                return;
            }

            let mut seen: HashSet<EpigramId> =
                state.backlog.iter().map(|e| e.id).collect();
            if let Some(current) = &state.current {
                seen.insert(current.id);
            }

            let before = state.backlog.len();
            for item in batch {
                if seen.insert(item.id) {
                    state.backlog.push_back(item);
                }
            }
            debug!(appended = state.backlog.len() - before, "refill appended to backlog");
            self.publish(&state);
        }
        .instrument(span)
        .await
    }

    /// Create a new epigram. Never touches the displayed item or the backlog;
    /// a successful submission is prepended to the authored list.
    pub async fn submit(&self, draft: EpigramDraft) -> Result<Epigram, ContentSourceError> {
        let span = info_span!("queue.submit");
        async {
            {
                let mut state = self.lock();
                state.is_loading = true;
                state.last_error = None;
                self.publish(&state);
            }

            let result = self.inner.source.create(&draft).await;

            let mut state = self.lock();
            state.is_loading = false;
            match result {
                Ok(created) => {
                    state.authored.insert(0, created.clone());
                    self.publish(&state);
                    Ok(created)
                }
                Err(err) => {
                    state.last_error = Some(err.to_string());
                    self.publish(&state);
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Refresh the authored list. Failures are logged and swallowed; the
    /// stale list stays usable.
    pub async fn load_authored(&self) {
        match self.inner.source.list_mine().await {
            Ok(items) => {
                let mut state = self.lock();
                state.authored = items;
            }
            Err(err) => {
                warn!(error = %err, "failed to load authored epigrams");
            }
        }
    }

    /// Drop a backlog entry by id, keeping the rest in order.
    pub fn remove_from_backlog(&self, id: EpigramId) {
        let mut state = self.lock();
        state.backlog.retain(|e| e.id != id);
        self.publish(&state);
    }

    /// Replace every copy of an externally edited epigram, preserving its
    /// position. Does not count as a display change.
    pub fn update_in_place(&self, item: Epigram) {
        let mut state = self.lock();
        if state.current.as_ref().is_some_and(|c| c.id == item.id) {
            state.current = Some(item.clone());
        }
        for slot in state.backlog.iter_mut() {
            if slot.id == item.id {
                *slot = item.clone();
            }
        }
        for slot in state.authored.iter_mut() {
            if slot.id == item.id {
                *slot = item.clone();
            }
        }
        self.publish(&state);
    }

    /// React to an epigram deleted elsewhere. Advances first when the deleted
    /// item is on display, so the user never keeps looking at it, then prunes
    /// any remaining copies.
    pub async fn handle_external_deletion(
        &self,
        id: EpigramId,
    ) -> Result<(), ContentSourceError> {
        let was_current = self
            .lock()
            .current
            .as_ref()
            .is_some_and(|c| c.id == id);
        if was_current {
            self.advance().await?;
        }

        let mut state = self.lock();
        state.backlog.retain(|e| e.id != id);
        state.authored.retain(|e| e.id != id);
        self.publish(&state);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner.state.lock().expect("queue state lock poisoned")
    }

    fn publish(&self, state: &QueueState) {
        let availability = if state.current.is_some() {
            ContentAvailability::Available
        } else if state.loaded_once {
            ContentAvailability::Empty
        } else {
            ContentAvailability::NotLoaded
        };

        self.inner.snapshot_tx.send_replace(QueueSnapshot {
            current: state.current.clone(),
            backlog_len: state.backlog.len(),
            is_loading: state.is_loading,
            last_error: state.last_error.clone(),
            availability,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::Semaphore;

    use eg_core::{EpigramPatch, EpigramStatus};

    fn epigram(id: i64) -> Epigram {
        Epigram {
            id: EpigramId(id),
            text: format!("epigram {}", id),
            author: None,
            status: EpigramStatus::Approved,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    struct TestSource {
        batches: Mutex<VecDeque<Result<Vec<Epigram>, ContentSourceError>>>,
        create_result: Mutex<Option<Result<Epigram, ContentSourceError>>>,
        mine: Mutex<Result<Vec<Epigram>, ContentSourceError>>,
        fetch_calls: AtomicUsize,
        excludes: Mutex<Vec<Option<EpigramId>>>,
        gate: Option<Arc<Semaphore>>,
    }

    impl TestSource {
        fn new(batches: Vec<Result<Vec<Epigram>, ContentSourceError>>) -> Self {
            Self {
                batches: Mutex::new(batches.into_iter().collect()),
                create_result: Mutex::new(None),
                mine: Mutex::new(Ok(Vec::new())),
                fetch_calls: AtomicUsize::new(0),
                excludes: Mutex::new(Vec::new()),
                gate: None,
            }
        }

        fn gated(
            batches: Vec<Result<Vec<Epigram>, ContentSourceError>>,
            gate: Arc<Semaphore>,
        ) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(batches)
            }
        }

        fn fetch_calls(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst)
        }

        fn excludes(&self) -> Vec<Option<EpigramId>> {
            self.excludes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContentSourcePort for TestSource {
        async fn fetch_random_batch(
            &self,
            _count: usize,
            exclude: Option<EpigramId>,
        ) -> Result<Vec<Epigram>, ContentSourceError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.excludes.lock().unwrap().push(exclude);
            if let Some(gate) = &self.gate {
                let permit = gate.acquire().await.expect("gate closed");
                permit.forget();
            }
            self.batches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn create(&self, draft: &EpigramDraft) -> Result<Epigram, ContentSourceError> {
            self.create_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| {
                    let mut created = epigram(999);
                    created.text = draft.text.clone();
                    Ok(created)
                })
        }

        async fn update(
            &self,
            id: EpigramId,
            patch: &EpigramPatch,
        ) -> Result<Epigram, ContentSourceError> {
            let mut updated = epigram(id.0);
            if let Some(text) = &patch.text {
                updated.text = text.clone();
            }
            Ok(updated)
        }

        async fn delete(&self, _id: EpigramId) -> Result<(), ContentSourceError> {
            Ok(())
        }

        async fn list_mine(&self) -> Result<Vec<Epigram>, ContentSourceError> {
            self.mine.lock().unwrap().clone()
        }
    }

    struct TestClock {
        ms: AtomicI64,
    }

    impl TestClock {
        fn new() -> Self {
            Self {
                ms: AtomicI64::new(1_000),
            }
        }

        fn advance(&self, ms: i64) {
            self.ms.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl ClockPort for TestClock {
        fn now_ms(&self) -> i64 {
            self.ms.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct CountingDisplay {
        displayed: AtomicUsize,
    }

    impl CountingDisplay {
        fn count(&self) -> usize {
            self.displayed.load(Ordering::SeqCst)
        }
    }

    impl DisplayEventPort for CountingDisplay {
        fn item_displayed(&self) {
            self.displayed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn build_queue(
        source: TestSource,
    ) -> (EpigramQueue, Arc<TestSource>, Arc<TestClock>, Arc<CountingDisplay>) {
        let source = Arc::new(source);
        let clock = Arc::new(TestClock::new());
        let display = Arc::new(CountingDisplay::default());
        let queue = EpigramQueue::new(
            source.clone(),
            clock.clone(),
            display.clone(),
            QueueConfig::default(),
        );
        (queue, source, clock, display)
    }

    fn backlog_ids(queue: &EpigramQueue) -> Vec<i64> {
        queue.lock().backlog.iter().map(|e| e.id.0).collect()
    }

    #[tokio::test]
    async fn load_initial_displays_first_item_and_keeps_the_rest() {
        let batch: Vec<_> = (1..=5).map(epigram).collect();
        let (queue, _, _, display) = build_queue(TestSource::new(vec![Ok(batch)]));

        queue.load_initial().await.unwrap();

        assert_eq!(queue.current().unwrap().id, EpigramId(1));
        assert_eq!(backlog_ids(&queue), vec![2, 3, 4, 5]);
        assert_eq!(display.count(), 1);

        let snapshot = queue.snapshot();
        assert_eq!(snapshot.availability, ContentAvailability::Available);
        assert!(!snapshot.is_loading);
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn load_initial_empty_batch_clears_current_without_error() {
        let (queue, _, _, display) = build_queue(TestSource::new(vec![Ok(Vec::new())]));

        queue.load_initial().await.unwrap();

        assert!(queue.current().is_none());
        assert_eq!(display.count(), 0);
        assert_eq!(queue.snapshot().availability, ContentAvailability::Empty);
        assert!(queue.snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn load_initial_failure_records_error_and_keeps_state() {
        let (queue, _, _, _) = build_queue(TestSource::new(vec![
            Err(ContentSourceError::Unavailable("boom".into())),
        ]));

        let result = queue.load_initial().await;

        assert!(matches!(result, Err(ContentSourceError::Unavailable(_))));
        let snapshot = queue.snapshot();
        assert!(snapshot.last_error.is_some());
        assert!(!snapshot.is_loading);
        // The failed attempt does not count as "loaded".
        assert_eq!(snapshot.availability, ContentAvailability::NotLoaded);
    }

    #[tokio::test]
    async fn load_initial_reentry_is_a_noop_while_in_flight() {
        let gate = Arc::new(Semaphore::new(0));
        let batch: Vec<_> = (1..=3).map(epigram).collect();
        let (queue, source, _, _) =
            build_queue(TestSource::gated(vec![Ok(batch)], gate.clone()));

        let background = queue.clone();
        let first = tokio::spawn(async move { background.load_initial().await });
        tokio::task::yield_now().await;

        // Second call observes the in-flight load and backs off.
        queue.load_initial().await.unwrap();
        assert_eq!(source.fetch_calls(), 1);

        gate.add_permits(1);
        first.await.unwrap().unwrap();
        assert_eq!(queue.current().unwrap().id, EpigramId(1));
    }

    #[tokio::test]
    async fn advance_pops_fifo_and_triggers_exactly_one_refill_at_low_water() {
        let initial: Vec<_> = (1..=5).map(epigram).collect();
        let (queue, source, _, display) =
            build_queue(TestSource::new(vec![Ok(initial), Ok(Vec::new())]));

        queue.load_initial().await.unwrap();
        assert_eq!(source.fetch_calls(), 1);

        // backlog 4 -> 3: above the low-water mark, no refill.
        queue.advance().await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(queue.current().unwrap().id, EpigramId(2));
        assert_eq!(source.fetch_calls(), 1);

        // backlog 3 -> 2: hits the mark, one refill fires.
        queue.advance().await.unwrap();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(queue.current().unwrap().id, EpigramId(3));
        assert_eq!(source.fetch_calls(), 2);
        assert_eq!(source.excludes()[1], Some(EpigramId(3)));

        // backlog 2 -> 1: inside the throttle window, no second fetch.
        queue.advance().await.unwrap();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(source.fetch_calls(), 2);

        assert_eq!(display.count(), 4);
    }

    #[tokio::test]
    async fn advance_with_empty_backlog_delegates_to_load_initial() {
        let batch: Vec<_> = (10..=12).map(epigram).collect();
        let (queue, source, _, display) = build_queue(TestSource::new(vec![Ok(batch)]));

        queue.advance().await.unwrap();

        assert_eq!(queue.current().unwrap().id, EpigramId(10));
        assert_eq!(source.fetch_calls(), 1);
        assert_eq!(display.count(), 1);
    }

    #[tokio::test]
    async fn refill_appends_deduped_residue_in_received_order() {
        let initial: Vec<_> = vec![epigram(1), epigram(2), epigram(3)];
        // Refill returns the current item, a backlog duplicate and two new ids.
        let refill = vec![epigram(1), epigram(3), epigram(6), epigram(7)];
        let (queue, source, _, _) =
            build_queue(TestSource::new(vec![Ok(initial), Ok(refill)]));

        queue.load_initial().await.unwrap();
        queue.refill().await;

        assert_eq!(queue.current().unwrap().id, EpigramId(1));
        assert_eq!(backlog_ids(&queue), vec![2, 3, 6, 7]);
        assert_eq!(source.excludes()[1], Some(EpigramId(1)));
    }

    #[tokio::test]
    async fn refill_is_throttled_within_the_spacing_window() {
        let initial: Vec<_> = vec![epigram(1), epigram(2)];
        let (queue, source, clock, _) = build_queue(TestSource::new(vec![
            Ok(initial),
            Ok(vec![epigram(5)]),
            Ok(vec![epigram(6)]),
        ]));

        queue.load_initial().await.unwrap();

        queue.refill().await;
        assert_eq!(source.fetch_calls(), 2);

        // One second later: still inside the 10 s window.
        clock.advance(1_000);
        queue.refill().await;
        assert_eq!(source.fetch_calls(), 2);

        clock.advance(10_000);
        queue.refill().await;
        assert_eq!(source.fetch_calls(), 3);
        assert_eq!(backlog_ids(&queue), vec![2, 5, 6]);
    }

    #[tokio::test]
    async fn refill_discards_batch_when_a_foreground_load_took_over() {
        let gate = Arc::new(Semaphore::new(1));
        let initial: Vec<_> = vec![epigram(1), epigram(2)];
        let refill = vec![epigram(8), epigram(9)];
        let (queue, _, _, _) =
            build_queue(TestSource::gated(vec![Ok(initial), Ok(refill)], gate.clone()));

        queue.load_initial().await.unwrap();

        let background = queue.clone();
        let refilling = tokio::spawn(async move { background.refill().await });
        tokio::task::yield_now().await;

        // A foreground load starts while the refill fetch is parked.
        queue.lock().is_loading = true;
        gate.add_permits(1);
        refilling.await.unwrap();

        assert_eq!(backlog_ids(&queue), vec![2]);
    }

    #[tokio::test]
    async fn submit_success_prepends_authored_and_leaves_queue_alone() {
        let initial: Vec<_> = vec![epigram(1), epigram(2)];
        let (queue, _, _, _) = build_queue(TestSource::new(vec![Ok(initial)]));
        queue.load_initial().await.unwrap();

        let created = queue
            .submit(EpigramDraft {
                text: "fresh".into(),
                author: None,
            })
            .await
            .unwrap();

        assert_eq!(created.text, "fresh");
        assert_eq!(queue.current().unwrap().id, EpigramId(1));
        assert_eq!(backlog_ids(&queue), vec![2]);
        assert_eq!(queue.authored().first().unwrap().id, created.id);
    }

    #[tokio::test]
    async fn submit_conflict_reports_conflict_and_keeps_state() {
        let initial: Vec<_> = vec![epigram(1), epigram(2)];
        let source = TestSource::new(vec![Ok(initial)]);
        *source.create_result.lock().unwrap() = Some(Err(ContentSourceError::Conflict));
        let (queue, _, _, _) = build_queue(source);
        queue.load_initial().await.unwrap();

        let result = queue
            .submit(EpigramDraft {
                text: "dup".into(),
                author: None,
            })
            .await;

        assert!(matches!(result, Err(ContentSourceError::Conflict)));
        assert_eq!(queue.current().unwrap().id, EpigramId(1));
        assert_eq!(backlog_ids(&queue), vec![2]);
        assert!(queue.authored().is_empty());
        assert!(queue.snapshot().last_error.is_some());
    }

    #[tokio::test]
    async fn external_deletion_of_current_advances_before_pruning() {
        let initial: Vec<_> = vec![epigram(1), epigram(2), epigram(3)];
        let (queue, _, _, display) = build_queue(TestSource::new(vec![Ok(initial)]));
        queue.load_initial().await.unwrap();

        queue.handle_external_deletion(EpigramId(1)).await.unwrap();
        tokio::task::yield_now().await;

        assert_eq!(queue.current().unwrap().id, EpigramId(2));
        assert_eq!(backlog_ids(&queue), vec![3]);
        // Initial display plus the forced advance.
        assert_eq!(display.count(), 2);
    }

    #[tokio::test]
    async fn external_deletion_of_backlog_item_only_prunes() {
        let initial: Vec<_> = vec![epigram(1), epigram(2), epigram(3)];
        let (queue, _, _, display) = build_queue(TestSource::new(vec![Ok(initial)]));
        queue.load_initial().await.unwrap();

        queue.handle_external_deletion(EpigramId(3)).await.unwrap();

        assert_eq!(queue.current().unwrap().id, EpigramId(1));
        assert_eq!(backlog_ids(&queue), vec![2]);
        assert_eq!(display.count(), 1);
    }

    #[tokio::test]
    async fn update_in_place_replaces_copies_without_reordering() {
        let initial: Vec<_> = vec![epigram(1), epigram(2), epigram(3)];
        let (queue, _, _, display) = build_queue(TestSource::new(vec![Ok(initial)]));
        queue.load_initial().await.unwrap();

        let mut edited = epigram(2);
        edited.text = "edited".into();
        queue.update_in_place(edited);

        assert_eq!(backlog_ids(&queue), vec![2, 3]);
        assert_eq!(queue.lock().backlog[0].text, "edited");
        // Editing is not a display change.
        assert_eq!(display.count(), 1);
    }

    #[tokio::test]
    async fn remove_from_backlog_keeps_order_of_the_rest() {
        let initial: Vec<_> = vec![epigram(1), epigram(2), epigram(3), epigram(4)];
        let (queue, _, _, _) = build_queue(TestSource::new(vec![Ok(initial)]));
        queue.load_initial().await.unwrap();

        queue.remove_from_backlog(EpigramId(3));

        assert_eq!(backlog_ids(&queue), vec![2, 4]);
    }

    #[tokio::test]
    async fn load_authored_failure_keeps_previous_list() {
        let source = TestSource::new(vec![]);
        *source.mine.lock().unwrap() =
            Err(ContentSourceError::Unavailable("down".into()));
        let (queue, _, _, _) = build_queue(source);
        queue.lock().authored = vec![epigram(42)];

        queue.load_authored().await;

        assert_eq!(queue.authored().len(), 1);
    }
}
