//! Contracts for the collaborators the annotation engine consumes.
//!
//! The engine never talks to git directly. History, commit detail and
//! repository association all arrive through the traits below; the
//! [`crate::core::git`] module provides the `git2`-backed implementation and
//! tests substitute their own.
//!
//! # Public API
//! - [`HistoryRecord`]: One line of blame output
//! - [`CommitDetail`]: Author/subject/message of a single commit
//! - [`LineDiff`]: One changed hunk between the repository and a buffer
//! - [`HistorySource`], [`CommitSource`]: Async data sources
//! - [`RepositoryLookup`], [`RepoHandle`]: Repository association and change events

use crate::core::error::Result;
use crate::core::events::{Callback, Disposable};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One line of blame output.
///
/// `line` is 1-based, as blame tools report it. `revision` is the raw field and
/// may carry a leading boundary marker (`^`) or trailing annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub revision: String,
    pub author: String,
    pub timestamp: String,
    pub line: usize,
}

/// Detail for a single commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub email: String,
    pub author: String,
    pub subject: String,
    pub message: String,
}

/// A changed hunk in git coordinates: `new_start` is 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDiff {
    pub new_start: usize,
    pub new_lines: usize,
}

/// Produces per-line history for a file.
///
/// `Ok(None)` means the file has no history (untracked, or outside any
/// repository). Errors are reserved for failures of the source itself.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn blame_file(&self, path: &Path) -> Result<Option<Vec<HistoryRecord>>>;
}

/// Reads commit detail. `Ok(None)` means the commit could not be read.
#[async_trait]
pub trait CommitSource: Send + Sync {
    async fn get_commit(&self, path: &Path, revision: &str) -> Result<Option<CommitDetail>>;
}

/// A repository a buffer belongs to
pub trait RepoHandle: Send + Sync {
    /// Working directory of the repository; identifies it across lookups
    fn root(&self) -> &Path;

    /// URL of the `origin` remote, if configured
    fn origin_url(&self) -> Option<String>;

    /// Hunks where `text` differs from the committed version of `path`.
    ///
    /// `None` when no diff can be computed.
    fn line_diffs(&self, path: &Path, text: &str) -> Option<Vec<LineDiff>>;

    /// Fires when the status of any file in the repository may have changed
    fn on_did_change_statuses(&self, callback: Callback<()>) -> Disposable;

    /// Fires when the status of a single file changed
    fn on_did_change_status(&self, callback: Callback<PathBuf>) -> Disposable;
}

/// Resolves which repository, if any, a path belongs to
pub trait RepositoryLookup: Send + Sync {
    fn find_repo(&self, path: &Path) -> Option<Arc<dyn RepoHandle>>;
}
