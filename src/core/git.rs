//! `git2`-backed history, commit detail and repository association.
//!
//! This module provides the concrete collaborators the annotation engine
//! consumes when it runs against a real repository.
//!
//! # Public API
//! - [`GitRepo`]: One repository; implements [`RepoHandle`]
//! - [`GitBackend`]: Discovers and caches repositories; implements
//!   [`HistorySource`], [`CommitSource`] and [`RepositoryLookup`]
//!
//! # Key Features
//! - **Blame**: Per-line history of the on-disk file, with lines that differ
//!   from `HEAD` reported under the all-zero revision
//! - **Commit detail**: Committer email and name, subject and body
//! - **Line diffs**: Zero-context hunks between the `HEAD` blob and live text
//! - **Blocking isolation**: All `git2` work on the async paths runs on
//!   `tokio::task::spawn_blocking`

use crate::core::annotation::{is_committed, strip_marker};
use crate::core::display::NOT_COMMITTED_YET;
use crate::core::error::{BlameError, Result};
use crate::core::events::{lock, Callback, Disposable, Emitter};
use crate::core::sources::{
    CommitDetail, CommitSource, HistoryRecord, HistorySource, LineDiff, RepoHandle,
    RepositoryLookup,
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{BlameOptions, DiffOptions, ErrorCode, Oid, Patch, Repository, Tree};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

pub struct GitRepo {
    root: PathBuf,
    git_dir: PathBuf,
    statuses_changed: Emitter<()>,
    status_changed: Emitter<PathBuf>,
}

impl GitRepo {
    /// Open the repository containing `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path)?;
        let workdir = repo.workdir().ok_or(BlameError::BareRepository)?;
        let root = workdir
            .canonicalize()
            .unwrap_or_else(|_| workdir.to_path_buf());

        Ok(GitRepo {
            root,
            git_dir: repo.path().to_path_buf(),
            statuses_changed: Emitter::new(),
            status_changed: Emitter::new(),
        })
    }

    /// `git2::Repository` is not `Sync`, so each operation opens its own handle.
    fn repository(&self) -> Result<Repository> {
        Ok(Repository::open(&self.git_dir)?)
    }

    /// `path` relative to the working directory
    pub fn relative_path(&self, path: &Path) -> Result<PathBuf> {
        if path.is_relative() {
            return Ok(path.to_path_buf());
        }
        if let Ok(relative) = path.strip_prefix(&self.root) {
            return Ok(relative.to_path_buf());
        }

        let canonical = match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) => parent.canonicalize()?.join(name),
            _ => path.canonicalize()?,
        };
        canonical
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| BlameError::outside_workdir(path))
    }

    /// Per-line history of the file at `path` as it is on disk.
    ///
    /// Returns `Ok(None)` for files `HEAD` does not contain (untracked, new, or
    /// a repository without commits).
    pub fn blame(&self, path: &Path) -> Result<Option<Vec<HistoryRecord>>> {
        let repo = self.repository()?;
        let relative = self.relative_path(path)?;

        let Some(tree) = head_tree(&repo)? else {
            log::debug!("No commits yet in {}", self.root.display());
            return Ok(None);
        };
        if tree.get_path(&relative).is_err() || !path.is_file() {
            log::debug!("No history for {}", relative.display());
            return Ok(None);
        }

        let mut opts = BlameOptions::new();
        opts.ignore_whitespace(true);
        let committed = repo.blame_file(&relative, Some(&mut opts))?;
        let contents = std::fs::read(self.root.join(&relative))?;
        let blame = committed.blame_buffer(&contents)?;

        let uncommitted_at = format_timestamp(Utc::now().timestamp(), 0);
        let mut records = Vec::new();
        for hunk in blame.iter() {
            let commit_id = hunk.final_commit_id();
            let (revision, author, timestamp) = if commit_id.is_zero() {
                (
                    commit_id.to_string(),
                    NOT_COMMITTED_YET.to_string(),
                    uncommitted_at.clone(),
                )
            } else {
                let signature = hunk.final_signature();
                let when = signature.when();
                let marker = if hunk.is_boundary() { "^" } else { "" };
                (
                    format!("{marker}{commit_id}"),
                    signature.name().unwrap_or("").to_string(),
                    format_timestamp(when.seconds(), when.offset_minutes()),
                )
            };

            let start = hunk.final_start_line();
            for offset in 0..hunk.lines_in_hunk() {
                records.push(HistoryRecord {
                    revision: revision.clone(),
                    author: author.clone(),
                    timestamp: timestamp.clone(),
                    line: start + offset,
                });
            }
        }

        records.sort_by_key(|record| record.line);
        log::debug!(
            "Blamed {} ({} lines)",
            relative.display(),
            records.len()
        );
        Ok(Some(records))
    }

    /// Detail for `revision`. Unknown or uncommitted revisions yield `Ok(None)`.
    pub fn commit_detail(&self, revision: &str) -> Result<Option<CommitDetail>> {
        let revision = strip_marker(revision);
        if !is_committed(revision) {
            return Ok(None);
        }

        let repo = self.repository()?;
        let commit = match Oid::from_str(revision).and_then(|oid| repo.find_commit(oid)) {
            Ok(commit) => commit,
            Err(_) => match repo.revparse_single(revision) {
                Ok(object) => object.peel_to_commit()?,
                Err(e) if is_missing(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            },
        };

        let committer = commit.committer();
        Ok(Some(CommitDetail {
            email: committer.email().unwrap_or("").to_string(),
            author: committer.name().unwrap_or("").to_string(),
            subject: commit.summary().unwrap_or("").to_string(),
            message: commit.body().unwrap_or("").trim().to_string(),
        }))
    }

    /// Zero-context hunks where `text` differs from the `HEAD` version of `path`.
    ///
    /// `Ok(None)` when `HEAD` has no such file.
    pub fn diff_against_head(&self, path: &Path, text: &str) -> Result<Option<Vec<LineDiff>>> {
        let repo = self.repository()?;
        let relative = self.relative_path(path)?;

        let Some(tree) = head_tree(&repo)? else {
            return Ok(None);
        };
        let Ok(entry) = tree.get_path(&relative) else {
            return Ok(None);
        };
        let blob = repo.find_blob(entry.id())?;

        let mut opts = DiffOptions::new();
        opts.context_lines(0);
        let patch = Patch::from_blob_and_buffer(
            &blob,
            Some(&relative),
            text.as_bytes(),
            Some(&relative),
            Some(&mut opts),
        )?;

        let mut diffs = Vec::with_capacity(patch.num_hunks());
        for index in 0..patch.num_hunks() {
            let (hunk, _) = patch.hunk(index)?;
            diffs.push(LineDiff {
                new_start: hunk.new_start() as usize,
                new_lines: hunk.new_lines() as usize,
            });
        }
        Ok(Some(diffs))
    }

    pub fn remote_url(&self, name: &str) -> Option<String> {
        let repo = self.repository().ok()?;
        let remote = repo.find_remote(name).ok()?;
        remote.url().map(str::to_string)
    }

    /// Tell listeners that any file in the repository may have changed status
    pub fn notify_statuses_changed(&self) {
        self.statuses_changed.emit(());
    }

    /// Tell listeners that the status of `path` changed
    pub fn notify_status_changed(&self, path: impl Into<PathBuf>) {
        self.status_changed.emit(path.into());
    }
}

impl RepoHandle for GitRepo {
    fn root(&self) -> &Path {
        &self.root
    }

    fn origin_url(&self) -> Option<String> {
        self.remote_url("origin")
    }

    fn line_diffs(&self, path: &Path, text: &str) -> Option<Vec<LineDiff>> {
        match self.diff_against_head(path, text) {
            Ok(diffs) => diffs,
            Err(e) => {
                log::debug!("Failed to diff {}: {e}", path.display());
                None
            }
        }
    }

    fn on_did_change_statuses(&self, callback: Callback<()>) -> Disposable {
        self.statuses_changed.subscribe(callback)
    }

    fn on_did_change_status(&self, callback: Callback<PathBuf>) -> Disposable {
        self.status_changed.subscribe(callback)
    }
}

fn head_tree(repo: &Repository) -> Result<Option<Tree<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_tree()?)),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn is_missing(error: &git2::Error) -> bool {
    matches!(
        error.code(),
        ErrorCode::NotFound | ErrorCode::Ambiguous | ErrorCode::InvalidSpec
    )
}

fn format_timestamp(seconds: i64, offset_minutes: i32) -> String {
    let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(seconds, 0)
        .map(|utc| utc.with_timezone(&offset).format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// Discovers repositories and serves history and commit detail from them.
///
/// Repositories are cached by working directory, so every lookup for files of
/// one repository returns the same [`GitRepo`] and its status events.
#[derive(Default)]
pub struct GitBackend {
    repositories: Mutex<HashMap<PathBuf, Arc<GitRepo>>>,
}

impl GitBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The repository containing `path`
    pub fn open_repo(&self, path: &Path) -> Result<Arc<GitRepo>> {
        let start = if path.is_file() {
            path.parent().unwrap_or(path)
        } else {
            path
        };
        let repo = match GitRepo::open(start) {
            Ok(repo) => repo,
            Err(BlameError::GitRepo(e)) if e.code() == ErrorCode::NotFound => {
                return Err(BlameError::NotInGitRepo)
            }
            Err(e) => return Err(e),
        };

        let mut repositories = lock(&self.repositories);
        let repo = repositories
            .entry(repo.root.clone())
            .or_insert_with(|| Arc::new(repo));
        Ok(Arc::clone(repo))
    }

    fn lookup(&self, path: &Path) -> Option<Arc<GitRepo>> {
        match self.open_repo(path) {
            Ok(repo) => Some(repo),
            Err(e) => {
                log::debug!("No repository for {}: {e}", path.display());
                None
            }
        }
    }
}

#[async_trait]
impl HistorySource for GitBackend {
    async fn blame_file(&self, path: &Path) -> Result<Option<Vec<HistoryRecord>>> {
        let Some(repo) = self.lookup(path) else {
            return Ok(None);
        };
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || repo.blame(&path)).await?
    }
}

#[async_trait]
impl CommitSource for GitBackend {
    async fn get_commit(&self, path: &Path, revision: &str) -> Result<Option<CommitDetail>> {
        let Some(repo) = self.lookup(path) else {
            return Ok(None);
        };
        let revision = revision.to_string();
        tokio::task::spawn_blocking(move || repo.commit_detail(&revision)).await?
    }
}

impl RepositoryLookup for GitBackend {
    fn find_repo(&self, path: &Path) -> Option<Arc<dyn RepoHandle>> {
        self.lookup(path).map(|repo| repo as Arc<dyn RepoHandle>)
    }
}
