//! Per-buffer annotation lifecycle.
//!
//! An [`AnnotationSession`] owns everything needed to answer "what should the
//! row under the cursor show right now" for one open buffer: the current
//! [`AnnotationTable`], the dirty-line tracker, the repository association and
//! the subscriptions that keep them current.
//!
//! # Phases
//! `Uninitialized -> Syncing -> Ready`, back to `Syncing` on every trigger, and
//! `Destroyed` (terminal) once the buffer closes.
//!
//! # Scheduling
//! Triggers (edits settling, saves, path changes, repository status changes)
//! call [`AnnotationSession::schedule_resync`]. The scheduled task yields once
//! before it starts, and a newer schedule aborts an older pending task, so a
//! burst of triggers collapses into one resync.
//!
//! Every resync takes a generation number. Its result is applied only if no
//! newer resync has been issued in the meantime; older results are dropped.

use crate::core::annotation::{AnnotationTable, LineAnnotation};
use crate::core::buffer::TextBuffer;
use crate::core::commit_cache::CommitDetailCache;
use crate::core::date::DateRenderer;
use crate::core::dirty::{dirty_from_hunks, DirtyLines, DirtyRangeTracker};
use crate::core::display::{DisplaySink, DisplayState, Notice, RowDisplay};
use crate::core::error::{BlameError, Result};
use crate::core::events::{lock, Callback, CompositeDisposable};
use crate::core::link;
use crate::core::sources::{CommitDetail, HistorySource, RepoHandle, RepositoryLookup};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// The services a session draws on. Cloning shares them.
#[derive(Clone)]
pub struct Collaborators {
    pub history: Arc<dyn HistorySource>,
    pub repositories: Arc<dyn RepositoryLookup>,
    pub commits: Arc<CommitDetailCache>,
    pub dates: DateRenderer,
}

impl Collaborators {
    pub fn new(
        history: Arc<dyn HistorySource>,
        repositories: Arc<dyn RepositoryLookup>,
        commits: Arc<CommitDetailCache>,
    ) -> Self {
        Self {
            history,
            repositories,
            commits,
            dates: DateRenderer::default(),
        }
    }

    pub fn with_dates(mut self, dates: DateRenderer) -> Self {
        self.dates = dates;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Syncing,
    Ready,
    Destroyed,
}

/// Why a resync was scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResyncReason {
    Attached,
    StoppedChanging,
    Saved,
    PathChanged,
    RepositoryChanged,
}

struct SessionState {
    phase: SessionPhase,
    repository: Option<Arc<dyn RepoHandle>>,
    table: Option<Arc<AnnotationTable>>,
    dirty: DirtyRangeTracker,
    last_row: Option<usize>,
    buffer_subscriptions: CompositeDisposable,
    repository_subscriptions: CompositeDisposable,
    pending: Option<JoinHandle<()>>,
}

pub struct AnnotationSession {
    buffer: Arc<dyn TextBuffer>,
    collaborators: Collaborators,
    sink: Arc<dyn DisplaySink>,
    runtime: Handle,
    generation: AtomicU64,
    state: Mutex<SessionState>,
    weak_self: Weak<AnnotationSession>,
}

impl AnnotationSession {
    /// Start annotating `buffer`. Must be called from within a tokio runtime.
    pub fn attach(
        buffer: Arc<dyn TextBuffer>,
        collaborators: Collaborators,
        sink: Arc<dyn DisplaySink>,
    ) -> Result<Arc<Self>> {
        let runtime = Handle::try_current().map_err(|_| BlameError::NoRuntime)?;

        let session = Arc::new_cyclic(|weak_self| Self {
            buffer,
            collaborators,
            sink,
            runtime,
            generation: AtomicU64::new(0),
            state: Mutex::new(SessionState {
                phase: SessionPhase::Uninitialized,
                repository: None,
                table: None,
                dirty: DirtyRangeTracker::new(),
                last_row: None,
                buffer_subscriptions: CompositeDisposable::new(),
                repository_subscriptions: CompositeDisposable::new(),
                pending: None,
            }),
            weak_self: weak_self.clone(),
        });

        session.sink.render(DisplayState::Blank);
        session.subscribe_to_buffer();
        if let Some(path) = session.buffer.path() {
            session.associate_repository(&path);
        }
        session.schedule_resync(ResyncReason::Attached);

        log::debug!(
            "Attached annotation session to {}",
            session
                .buffer
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unsaved buffer>".to_string())
        );
        Ok(session)
    }

    pub fn phase(&self) -> SessionPhase {
        lock(&self.state).phase
    }

    pub fn is_destroyed(&self) -> bool {
        self.phase() == SessionPhase::Destroyed
    }

    /// The most recently applied table, if the file has history
    pub fn table(&self) -> Option<Arc<AnnotationTable>> {
        lock(&self.state).table.clone()
    }

    pub fn has_repository(&self) -> bool {
        lock(&self.state).repository.is_some()
    }

    pub fn is_dirty(&self, row: usize) -> bool {
        lock(&self.state).dirty.is_dirty(row)
    }

    /// What `row` should show right now
    pub fn lookup_row(&self, row: usize) -> RowDisplay {
        let state = lock(&self.state);
        if state.repository.is_none() {
            return RowDisplay::NoRepository;
        }
        let Some(table) = &state.table else {
            return RowDisplay::NoHistoryYet;
        };
        match table.get(row) {
            Some(annotation) => RowDisplay::Annotated {
                annotation: annotation.clone(),
                dirty: state.dirty.is_dirty(row),
            },
            None => RowDisplay::NoHistoryYet,
        }
    }

    /// Handle a cursor move. Moves within the same row are ignored.
    pub fn cursor_moved(&self, row: usize) {
        self.render_row(row, false);
    }

    /// Re-render the cursor row, e.g. when the buffer's pane regains focus
    pub fn focus(&self) {
        self.render_row(self.buffer.cursor_row(), true);
    }

    /// Schedule a resync on the next tick, replacing any pending one
    pub fn schedule_resync(&self, reason: ResyncReason) {
        let Some(session) = self.weak_self.upgrade() else {
            return;
        };

        let mut state = lock(&self.state);
        if state.phase == SessionPhase::Destroyed {
            return;
        }
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }

        log::debug!("Scheduling resync: {reason:?}");
        state.pending = Some(self.runtime.spawn(async move {
            tokio::task::yield_now().await;
            session.run_resync().await;
        }));
    }

    /// Recompute the annotation table now, superseding any scheduled resync.
    ///
    /// The result is applied only if no newer resync was issued while this one
    /// was running.
    pub async fn resync(&self) {
        let pending = lock(&self.state).pending.take();
        if let Some(pending) = pending {
            pending.abort();
        }
        self.run_resync().await;
    }

    async fn run_resync(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = lock(&self.state);
            if state.phase == SessionPhase::Destroyed {
                return;
            }
            state.phase = SessionPhase::Syncing;
            state.dirty.begin_resync();
        }

        let Some(path) = self.buffer.path() else {
            self.apply_without_repository(generation);
            return;
        };
        let Some(repository) = self.associate_repository(&path) else {
            self.apply_without_repository(generation);
            return;
        };

        let diffs = self
            .buffer
            .text()
            .and_then(|text| repository.line_diffs(&path, &text));
        let baseline = dirty_from_hunks(diffs.as_deref());

        let records = match self.collaborators.history.blame_file(&path).await {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Failed to blame {}: {e}", path.display());
                None
            }
        };
        if !self.is_current(generation) {
            log::debug!("Discarding superseded blame for {}", path.display());
            return;
        }

        let table = records.map(|records| Arc::new(AnnotationTable::build(&records)));
        if let Some(table) = &table {
            let dirty = lock(&self.state).dirty.preview(&baseline);
            self.warm_commit_details(&path, table, &dirty).await;
        }

        {
            let mut state = lock(&self.state);
            if state.phase == SessionPhase::Destroyed || !self.is_current(generation) {
                log::debug!("Discarding superseded resync for {}", path.display());
                return;
            }
            log::debug!(
                "Applied annotations for {} ({} lines)",
                path.display(),
                table.as_ref().map(|t| t.len()).unwrap_or(0)
            );
            state.table = table;
            state.dirty.commit(baseline);
            state.phase = SessionPhase::Ready;
        }

        self.render_row(self.buffer.cursor_row(), true);
    }

    /// Commit detail for the committed, clean row under the cursor.
    ///
    /// Dirty and uncommitted rows yield `None` without a notice.
    pub async fn commit_detail_at_cursor(&self) -> Option<CommitDetail> {
        let annotation = self.cursor_annotation()?;
        let path = self.buffer.path()?;
        self.collaborators
            .commits
            .resolve(&path, &annotation.revision_id)
            .await
    }

    /// Browsable URL of the commit under the cursor.
    ///
    /// When the row is committed but no URL can be derived, the sink receives
    /// an informational notice and `None` is returned.
    pub fn commit_link_at_cursor(&self) -> Option<String> {
        let annotation = self.cursor_annotation()?;
        let repository = lock(&self.state).repository.clone();
        let link = repository
            .and_then(|repository| repository.origin_url())
            .and_then(|remote| link::resolve(&remote, &annotation.revision_id));

        if link.is_none() {
            log::info!("No commit link for {}", annotation.short_hash());
            self.sink.notify(Notice::unknown_link());
        }
        link
    }

    /// Abbreviated hash of the commit under the cursor, announced to the sink.
    /// Dirty and uncommitted rows yield `None` without a notice.
    pub fn short_hash_at_cursor(&self) -> Option<String> {
        let hash = self.cursor_annotation()?.short_hash();
        self.sink.notify(Notice::copied_hash(&hash));
        Some(hash)
    }

    /// Tear the session down. Nothing touches its state afterwards.
    pub fn destroy(&self) {
        let (pending, mut buffer_subscriptions, mut repository_subscriptions) = {
            let mut state = lock(&self.state);
            if state.phase == SessionPhase::Destroyed {
                return;
            }
            state.phase = SessionPhase::Destroyed;
            state.table = None;
            state.repository = None;
            state.dirty.clear();
            (
                state.pending.take(),
                std::mem::take(&mut state.buffer_subscriptions),
                std::mem::take(&mut state.repository_subscriptions),
            )
        };

        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(pending) = pending {
            pending.abort();
        }
        buffer_subscriptions.dispose();
        repository_subscriptions.dispose();
        log::debug!("Destroyed annotation session");
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn cursor_annotation(&self) -> Option<LineAnnotation> {
        self.lookup_row(self.buffer.cursor_row())
            .committed_annotation()
            .cloned()
    }

    fn listener<T: 'static>(
        &self,
        handler: impl Fn(&AnnotationSession, T) + Send + Sync + 'static,
    ) -> Callback<T> {
        let weak = self.weak_self.clone();
        Arc::new(move |value| {
            if let Some(session) = weak.upgrade() {
                if !session.is_destroyed() {
                    handler(&session, value);
                }
            }
        })
    }

    fn subscribe_to_buffer(&self) {
        let mut subscriptions = CompositeDisposable::new();
        subscriptions.add(
            self.buffer
                .on_did_stop_changing(self.listener(|s, changes| s.stopped_changing(changes))),
        );
        subscriptions.add(
            self.buffer
                .on_did_save(self.listener(|s, ()| s.schedule_resync(ResyncReason::Saved))),
        );
        subscriptions.add(
            self.buffer
                .on_did_change_path(self.listener(|s, _path: Option<PathBuf>| s.path_changed())),
        );
        subscriptions.add(
            self.buffer
                .on_did_change_cursor_position(self.listener(|s, row| s.cursor_moved(row))),
        );
        subscriptions.add(
            self.buffer
                .on_did_destroy(self.listener(|s, ()| s.destroy())),
        );
        lock(&self.state).buffer_subscriptions = subscriptions;
    }

    /// Look up the repository for `path`, moving status subscriptions if it changed
    fn associate_repository(&self, path: &Path) -> Option<Arc<dyn RepoHandle>> {
        let found = self.collaborators.repositories.find_repo(path);

        let mut state = lock(&self.state);
        if state.phase == SessionPhase::Destroyed {
            return None;
        }
        let unchanged = match (&state.repository, &found) {
            (Some(current), Some(next)) => current.root() == next.root(),
            (None, None) => true,
            _ => false,
        };

        if !unchanged {
            state.repository_subscriptions.clear();
            if let Some(repository) = &found {
                log::debug!("Associated with repository {}", repository.root().display());
                state.repository_subscriptions.add(repository.on_did_change_statuses(
                    self.listener(|s, ()| s.schedule_resync(ResyncReason::RepositoryChanged)),
                ));
                state
                    .repository_subscriptions
                    .add(repository.on_did_change_status(self.listener(
                        |s, changed: PathBuf| {
                            if s.buffer.path().as_deref() == Some(changed.as_path()) {
                                s.schedule_resync(ResyncReason::RepositoryChanged);
                            }
                        },
                    )));
            }
        }
        state.repository = found.clone();
        found
    }

    fn apply_without_repository(&self, generation: u64) {
        {
            let mut state = lock(&self.state);
            if state.phase == SessionPhase::Destroyed || !self.is_current(generation) {
                return;
            }
            state.repository = None;
            state.repository_subscriptions.clear();
            state.table = None;
            state.dirty.clear();
            state.phase = SessionPhase::Ready;
        }
        self.render_row(self.buffer.cursor_row(), true);
    }

    /// Pre-populate commit detail for every committed row that is not dirty
    async fn warm_commit_details(&self, path: &Path, table: &AnnotationTable, dirty: &DirtyLines) {
        let revisions: Vec<&str> = table
            .committed_rows()
            .filter(|(row, _)| !dirty.contains(*row))
            .map(|(_, annotation)| annotation.revision_id.as_str())
            .collect();
        if revisions.is_empty() {
            return;
        }

        let resolved = self
            .collaborators
            .commits
            .resolve_many(path, revisions)
            .await;
        log::debug!("Warmed {resolved} commit(s) for {}", path.display());
    }

    fn stopped_changing(&self, changes: usize) {
        if changes == 0 {
            return;
        }
        let repository = lock(&self.state).repository.clone();
        let (Some(repository), Some(path)) = (repository, self.buffer.path()) else {
            return;
        };

        let diffs = self
            .buffer
            .text()
            .and_then(|text| repository.line_diffs(&path, &text));
        let dirty = dirty_from_hunks(diffs.as_deref());
        lock(&self.state).dirty.record(&dirty);

        self.render_row(self.buffer.cursor_row(), true);
        self.schedule_resync(ResyncReason::StoppedChanging);
    }

    fn path_changed(&self) {
        {
            let mut state = lock(&self.state);
            state.table = None;
            state.repository = None;
            state.repository_subscriptions.clear();
            state.dirty.clear();
            state.last_row = None;
        }
        // Results for the old path must never land.
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.schedule_resync(ResyncReason::PathChanged);
    }

    fn render_row(&self, row: usize, force: bool) {
        {
            let mut state = lock(&self.state);
            if state.phase == SessionPhase::Destroyed {
                return;
            }
            if !force && state.last_row == Some(row) {
                return;
            }
            state.last_row = Some(row);
        }

        let display = self.lookup_row(row);
        self.sink.render(DisplayState::from_row(
            &display,
            &self.collaborators.dates,
            Utc::now(),
        ));

        if let Some(annotation) = display.committed_annotation() {
            self.show_detail_for(annotation.revision_id.clone());
        }
    }

    fn show_detail_for(&self, revision: String) {
        let Some(path) = self.buffer.path() else {
            return;
        };
        if let Some(detail) = self.collaborators.commits.get(&path, &revision) {
            self.sink.show_detail(detail);
            return;
        }

        let weak = self.weak_self.clone();
        let commits = Arc::clone(&self.collaborators.commits);
        self.runtime.spawn(async move {
            let detail = commits.resolve(&path, &revision).await;
            let Some(session) = weak.upgrade() else {
                return;
            };
            let still_on_row = session
                .cursor_annotation()
                .is_some_and(|a| a.revision_id == revision);
            if let (Some(detail), true) = (detail, still_on_row && !session.is_destroyed()) {
                session.sink.show_detail(detail);
            }
        });
    }
}
