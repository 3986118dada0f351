use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{ExploreError, ValidationError};
use crate::models::{ListingId, ResultPage, SortKey, ViewMode};
use crate::query::{normalize, RawQuery};
use crate::session::chips::{self, page_window, FilterChip, PageLink};
use crate::session::SearchBackend;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Debouncing,
    Querying,
    Settled,
    Failed,
}

impl SessionPhase {
    pub fn is_loading(self) -> bool {
        matches!(self, SessionPhase::Debouncing | SessionPhase::Querying)
    }
}

/// What went wrong with the latest query, in a form the UI can keep around
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchFailure {
    #[error(transparent)]
    Invalid(ValidationError),

    #[error("search unavailable: {message}")]
    Unavailable { retryable: bool, message: String },
}

impl From<&ExploreError> for SearchFailure {
    fn from(err: &ExploreError) -> Self {
        match err {
            ExploreError::Validation(v) => SearchFailure::Invalid(v.clone()),
            ExploreError::Store(e) => SearchFailure::Unavailable {
                retryable: e.is_retryable(),
                message: e.to_string(),
            },
        }
    }
}

/// "Nothing matched" and "never loaded" are different states; an error is
/// reported separately in [`SessionSnapshot::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultView {
    NotLoaded,
    NoMatches,
    Matches,
}

#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub draft: RawQuery,
    pub view_mode: ViewMode,
    pub liked: BTreeSet<ListingId>,
    /// Last accepted page. Kept across a failed query.
    pub results: Option<ResultPage>,
    pub error: Option<SearchFailure>,
    pub sequence: u64,
}

impl SessionSnapshot {
    pub fn is_loading(&self) -> bool {
        self.phase.is_loading()
    }

    pub fn result_view(&self) -> ResultView {
        match &self.results {
            None => ResultView::NotLoaded,
            Some(page) if page.pagination.total == 0 => ResultView::NoMatches,
            Some(_) => ResultView::Matches,
        }
    }

    pub fn is_liked(&self, listing_id: &str) -> bool {
        self.liked.contains(listing_id)
    }
}

struct State {
    phase: SessionPhase,
    draft: RawQuery,
    view_mode: ViewMode,
    liked: BTreeSet<ListingId>,
    results: Option<ResultPage>,
    error: Option<SearchFailure>,
    /// Sequence number of the most recent dispatch; only its response may commit
    latest: u64,
    closed: bool,
    phase_tx: watch::Sender<SessionPhase>,
}

impl State {
    fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
        self.phase_tx.send_replace(phase);
    }

    /// The draft changed: nothing already in flight may commit any more
    fn supersede(&mut self) {
        self.latest += 1;
        if self.phase == SessionPhase::Querying {
            self.set_phase(SessionPhase::Idle);
        }
    }

    /// Claim the next sequence number for a dispatch of the current draft
    fn begin(&mut self) -> Option<(u64, RawQuery)> {
        if self.closed {
            return None;
        }
        self.latest += 1;
        self.set_phase(SessionPhase::Querying);
        Some((self.latest, self.draft.clone()))
    }

    fn commit(&mut self, sequence: u64, outcome: Result<ResultPage, ExploreError>) {
        if self.closed {
            debug!("Session closed; dropping response #{}", sequence);
            return;
        }
        if sequence != self.latest {
            debug!(
                "Discarding stale response #{} (latest is #{})",
                sequence, self.latest
            );
            return;
        }
        match outcome {
            Ok(page) => {
                self.results = Some(page);
                self.error = None;
                self.set_phase(SessionPhase::Settled);
            }
            Err(err) => {
                warn!("Search #{} failed: {}", sequence, err);
                self.error = Some(SearchFailure::from(&err));
                self.set_phase(SessionPhase::Failed);
            }
        }
    }
}

type Shared = Arc<Mutex<State>>;

fn lock(state: &Shared) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Validate and run one dispatch, then commit if it is still the latest
async fn run_query<B: SearchBackend>(
    backend: Arc<B>,
    state: Shared,
    sequence: u64,
    draft: RawQuery,
) {
    let outcome = match normalize(&draft) {
        Ok(spec) => backend.search(spec).await,
        Err(invalid) => Err(invalid.into()),
    };
    lock(&state).commit(sequence, outcome);
}

/// Single-writer controller for one search screen.
///
/// Holds the draft filters and drives queries against a [`SearchBackend`].
/// Every dispatch rebuilds its [`crate::query::QuerySpec`] from the draft and
/// takes a fresh sequence number; a response is committed only when its
/// sequence is still the latest, so out-of-order completions are dropped.
///
/// Editing the draft invalidates any query already in flight, so a result
/// computed for an older draft never lands.
///
/// Free-text typing is debounced. Explicit actions (applying filters,
/// removing a chip, changing sort or page) dispatch immediately. Any change
/// to the filters or sort returns to page 1; paging keeps the filters.
pub struct SearchSession<B: SearchBackend> {
    backend: Arc<B>,
    state: Shared,
    phase_rx: watch::Receiver<SessionPhase>,
    debounce: Duration,
    pending: Option<JoinHandle<()>>,
}

impl<B: SearchBackend> SearchSession<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_debounce(backend, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(backend: Arc<B>, debounce: Duration) -> Self {
        let (phase_tx, phase_rx) = watch::channel(SessionPhase::Idle);
        let state = State {
            phase: SessionPhase::Idle,
            draft: RawQuery::default(),
            view_mode: ViewMode::default(),
            liked: BTreeSet::new(),
            results: None,
            error: None,
            latest: 0,
            closed: false,
            phase_tx,
        };
        Self {
            backend,
            state: Arc::new(Mutex::new(state)),
            phase_rx,
            debounce,
            pending: None,
        }
    }

    /// Start from an existing request, e.g. one restored from a URL
    pub fn with_draft(self, draft: RawQuery) -> Self {
        lock(&self.state).draft = draft;
        self
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = lock(&self.state);
        SessionSnapshot {
            phase: state.phase,
            draft: state.draft.clone(),
            view_mode: state.view_mode,
            liked: state.liked.clone(),
            results: state.results.clone(),
            error: state.error.clone(),
            sequence: state.latest,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase_rx.borrow()
    }

    /// Phase changes, for callers that render on every transition
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase_rx.clone()
    }

    /// Wait until the latest dispatch has committed or failed
    pub async fn settled(&self) -> SessionPhase {
        let mut rx = self.phase_rx.clone();
        let waited = rx
            .wait_for(|phase| matches!(phase, SessionPhase::Settled | SessionPhase::Failed))
            .await
            .map(|phase| *phase);
        waited.unwrap_or_else(|_| self.phase())
    }

    /// Live-typed search text; dispatches once typing pauses
    pub fn type_search_text(&mut self, text: &str) {
        self.mutate_filters(|draft| {
            set_or_clear(draft, "q", text);
        });
        self.schedule();
    }

    /// Stage a single filter without dispatching; the next dispatch picks it up
    pub fn stage_filter(&mut self, key: &str, value: &str) -> bool {
        let mut known = false;
        self.mutate_filters(|draft| known = set_or_clear(draft, key, value));
        known
    }

    /// Set a single filter and search now. Unknown keys are ignored.
    pub fn set_filter(&mut self, key: &str, value: &str) -> bool {
        let known = self.stage_filter(key, value);
        if known {
            self.dispatch();
        }
        known
    }

    /// Apply a batch of filter edits (a filter panel submission) and search now
    pub fn apply_filters(&mut self, edit: impl FnOnce(&mut RawQuery)) {
        self.mutate_filters(edit);
        self.dispatch();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.mutate_filters(|draft| draft.sort_by = Some(sort.as_str().to_string()));
        self.dispatch();
    }

    /// Change page, keeping every filter
    pub fn set_page(&mut self, page: u32) {
        lock(&self.state).draft.page = Some(page.max(1).to_string());
        self.dispatch();
    }

    /// Run the current draft now, flushing any pending debounce
    pub fn search_now(&mut self) {
        self.dispatch();
    }

    pub fn active_filters(&self) -> Vec<FilterChip> {
        chips::chips(&lock(&self.state).draft)
    }

    pub fn remove_filter(&mut self, chip: &FilterChip) {
        self.mutate_filters(|draft| chips::remove_chip(draft, chip));
        self.dispatch();
    }

    pub fn clear_filters(&mut self) {
        self.mutate_filters(RawQuery::clear_filters);
        self.dispatch();
    }

    /// Page links for the last accepted result page
    pub fn page_links(&self, spread: u32) -> Vec<PageLink> {
        let state = lock(&self.state);
        match &state.results {
            Some(page) => page_window(page.pagination.page, page.pagination.total_pages, spread),
            None => Vec::new(),
        }
    }

    /// Presentation only; never triggers a query
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        lock(&self.state).view_mode = mode;
    }

    /// Flip the session-local liked flag. Returns whether the listing is now liked.
    pub fn toggle_like(&mut self, listing_id: &str) -> bool {
        let mut state = lock(&self.state);
        if state.liked.remove(listing_id) {
            false
        } else {
            state.liked.insert(listing_id.to_string());
            true
        }
    }

    /// Stop the session. Responses still in flight are discarded on arrival.
    pub fn close(&mut self) {
        self.cancel_pending();
        let mut state = lock(&self.state);
        state.closed = true;
        if state.phase.is_loading() {
            state.set_phase(SessionPhase::Idle);
        }
    }

    fn mutate_filters(&mut self, edit: impl FnOnce(&mut RawQuery)) {
        let mut state = lock(&self.state);
        edit(&mut state.draft);
        state.draft.page = None;
        state.supersede();
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    fn dispatch(&mut self) {
        self.cancel_pending();
        let claimed = lock(&self.state).begin();
        let Some((sequence, draft)) = claimed else {
            return;
        };
        debug!("Dispatching search #{}", sequence);
        tokio::spawn(run_query(self.backend.clone(), self.state.clone(), sequence, draft));
    }

    /// Restart the debounce window; the draft is read when it expires
    fn schedule(&mut self) {
        self.cancel_pending();
        {
            let mut state = lock(&self.state);
            if state.closed {
                return;
            }
            state.set_phase(SessionPhase::Debouncing);
        }

        let backend = self.backend.clone();
        let state = self.state.clone();
        let delay = self.debounce;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let claimed = lock(&state).begin();
            let Some((sequence, draft)) = claimed else {
                return;
            };
            debug!("Debounce elapsed; dispatching search #{}", sequence);
            run_query(backend, state, sequence, draft).await;
        }));
    }
}

impl<B: SearchBackend> Drop for SearchSession<B> {
    fn drop(&mut self) {
        self.close();
    }
}

fn set_or_clear(draft: &mut RawQuery, key: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        draft.remove(key);
        crate::query::params::RECOGNIZED_KEYS.contains(&key) || key == "sub_region"
    } else {
        draft.set(key, value)
    }
}
