//! In-memory collaborators for driving an annotation session
//!
//! Provides scriptable history and commit sources, a repository handle whose
//! status events and diffs the test controls, and a sink that records what the
//! session displayed.

#![allow(dead_code)]

use async_trait::async_trait;
use git_line_blame::core::{
    error::{BlameError, Result},
    events::{Callback, Disposable, Emitter},
    AnnotationSession, Collaborators, CommitDetail, CommitDetailCache, CommitSource,
    DisplaySink, DisplayState, HistoryRecord, HistorySource, LineDiff, MemoryBuffer, Notice,
    RepoHandle, RepositoryLookup, TextBuffer,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const REPO_ROOT: &str = "/work/project";
pub const FILE_PATH: &str = "/work/project/src/file.txt";
pub const OLD_TIMESTAMP: &str = "2016-04-04 09:05:39 +0000";

/// Blame records for consecutive lines, one `(revision, author)` per line
pub fn records(lines: &[(&str, &str)]) -> Vec<HistoryRecord> {
    lines
        .iter()
        .enumerate()
        .map(|(i, (revision, author))| HistoryRecord {
            revision: revision.to_string(),
            author: author.to_string(),
            timestamp: OLD_TIMESTAMP.to_string(),
            line: i + 1,
        })
        .collect()
}

/// Let scheduled and background tasks run to completion
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

#[derive(Default)]
struct HistoryScript {
    records: Option<Vec<HistoryRecord>>,
    fail: bool,
    gate: Option<Arc<Notify>>,
}

/// History source returning whatever was scripted last
#[derive(Default)]
pub struct FakeHistory {
    script: Mutex<HistoryScript>,
    calls: AtomicUsize,
}

impl FakeHistory {
    pub fn set(&self, records: Option<Vec<HistoryRecord>>) {
        let mut script = self.script.lock().unwrap();
        script.records = records;
        script.fail = false;
    }

    pub fn fail(&self) {
        self.script.lock().unwrap().fail = true;
    }

    /// Make the next call wait until the returned gate is notified
    pub fn hold_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.script.lock().unwrap().gate = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistorySource for FakeHistory {
    async fn blame_file(&self, _path: &Path) -> Result<Option<Vec<HistoryRecord>>> {
        let (records, fail, gate) = {
            let mut script = self.script.lock().unwrap();
            (script.records.clone(), script.fail, script.gate.take())
        };
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = gate {
            gate.notified().await;
        }
        if fail {
            return Err(BlameError::NotInGitRepo);
        }
        Ok(records)
    }
}

/// Commit source answering every revision, counting calls per revision
#[derive(Default)]
pub struct FakeCommits {
    requested: Mutex<Vec<String>>,
}

impl FakeCommits {
    pub fn detail(revision: &str) -> CommitDetail {
        CommitDetail {
            email: "someone@wherever.com".to_string(),
            author: "Some One".to_string(),
            subject: format!("Commit {revision}"),
            message: "Line 1\nLine 2".to_string(),
        }
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    pub fn calls_for(&self, revision: &str) -> usize {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.as_str() == revision)
            .count()
    }
}

#[async_trait]
impl CommitSource for FakeCommits {
    async fn get_commit(&self, _path: &Path, revision: &str) -> Result<Option<CommitDetail>> {
        self.requested.lock().unwrap().push(revision.to_string());
        Ok(Some(Self::detail(revision)))
    }
}

/// Repository handle with scripted diffs and remote
pub struct FakeRepo {
    root: PathBuf,
    origin: Mutex<Option<String>>,
    diffs: Mutex<Option<Vec<LineDiff>>>,
    statuses_changed: Emitter<()>,
    status_changed: Emitter<PathBuf>,
}

impl FakeRepo {
    pub fn new(root: &str) -> Self {
        Self {
            root: PathBuf::from(root),
            origin: Mutex::new(None),
            diffs: Mutex::new(Some(Vec::new())),
            statuses_changed: Emitter::new(),
            status_changed: Emitter::new(),
        }
    }

    pub fn set_origin(&self, url: Option<&str>) {
        *self.origin.lock().unwrap() = url.map(str::to_string);
    }

    pub fn set_diffs(&self, diffs: Option<Vec<LineDiff>>) {
        *self.diffs.lock().unwrap() = diffs;
    }

    pub fn notify_statuses(&self) {
        self.statuses_changed.emit(());
    }

    pub fn notify_status(&self, path: &str) {
        self.status_changed.emit(PathBuf::from(path));
    }

    pub fn listener_count(&self) -> usize {
        self.statuses_changed.listener_count() + self.status_changed.listener_count()
    }
}

impl RepoHandle for FakeRepo {
    fn root(&self) -> &Path {
        &self.root
    }

    fn origin_url(&self) -> Option<String> {
        self.origin.lock().unwrap().clone()
    }

    fn line_diffs(&self, _path: &Path, _text: &str) -> Option<Vec<LineDiff>> {
        self.diffs.lock().unwrap().clone()
    }

    fn on_did_change_statuses(&self, callback: Callback<()>) -> Disposable {
        self.statuses_changed.subscribe(callback)
    }

    fn on_did_change_status(&self, callback: Callback<PathBuf>) -> Disposable {
        self.status_changed.subscribe(callback)
    }
}

/// Lookup answering with one repository, or none
pub struct FakeLookup {
    repo: Mutex<Option<Arc<FakeRepo>>>,
}

impl FakeLookup {
    pub fn new(repo: Option<Arc<FakeRepo>>) -> Self {
        Self {
            repo: Mutex::new(repo),
        }
    }

    pub fn set(&self, repo: Option<Arc<FakeRepo>>) {
        *self.repo.lock().unwrap() = repo;
    }
}

impl RepositoryLookup for FakeLookup {
    fn find_repo(&self, _path: &Path) -> Option<Arc<dyn RepoHandle>> {
        self.repo
            .lock()
            .unwrap()
            .clone()
            .map(|repo| repo as Arc<dyn RepoHandle>)
    }
}

/// Sink recording everything the session displayed
#[derive(Default)]
pub struct RecordingSink {
    renders: Mutex<Vec<DisplayState>>,
    details: Mutex<Vec<CommitDetail>>,
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    pub fn renders(&self) -> Vec<DisplayState> {
        self.renders.lock().unwrap().clone()
    }

    pub fn last_render(&self) -> Option<DisplayState> {
        self.renders.lock().unwrap().last().cloned()
    }

    pub fn details(&self) -> Vec<CommitDetail> {
        self.details.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    /// Total number of calls the sink received
    pub fn output_count(&self) -> usize {
        self.renders.lock().unwrap().len()
            + self.details.lock().unwrap().len()
            + self.notices.lock().unwrap().len()
    }
}

impl DisplaySink for RecordingSink {
    fn render(&self, state: DisplayState) {
        self.renders.lock().unwrap().push(state);
    }

    fn show_detail(&self, detail: CommitDetail) {
        self.details.lock().unwrap().push(detail);
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// A buffer, its collaborators and a sink, ready to attach a session to
pub struct Harness {
    pub buffer: Arc<MemoryBuffer>,
    pub history: Arc<FakeHistory>,
    pub commits: Arc<FakeCommits>,
    pub cache: Arc<CommitDetailCache>,
    pub repo: Arc<FakeRepo>,
    pub lookup: Arc<FakeLookup>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    /// A buffer at [`FILE_PATH`] inside a repository at [`REPO_ROOT`]
    pub fn new(text: &str, history: Option<Vec<HistoryRecord>>) -> Self {
        let repo = Arc::new(FakeRepo::new(REPO_ROOT));
        let commits = Arc::new(FakeCommits::default());
        let fake_history = Arc::new(FakeHistory::default());
        fake_history.set(history);

        Self {
            buffer: Arc::new(MemoryBuffer::new(Some(PathBuf::from(FILE_PATH)), text)),
            history: fake_history,
            cache: Arc::new(CommitDetailCache::new(commits.clone())),
            commits,
            lookup: Arc::new(FakeLookup::new(Some(Arc::clone(&repo)))),
            repo,
            sink: Arc::new(RecordingSink::default()),
        }
    }

    pub fn attach(&self) -> Result<Arc<AnnotationSession>> {
        let collaborators = Collaborators::new(
            self.history.clone(),
            self.lookup.clone(),
            Arc::clone(&self.cache),
        );
        AnnotationSession::attach(
            self.buffer.clone() as Arc<dyn TextBuffer>,
            collaborators,
            self.sink.clone(),
        )
    }
}
