//! Core functionality for the git-line-blame tool.
//!
//! This module provides the annotation engine (tables, dirty tracking, commit
//! detail caching and the per-buffer session), its git2-backed collaborators,
//! and the configuration and output pieces the CLI is built from.

pub mod annotation;
pub mod buffer;
pub mod command_init;
pub mod commit_cache;
pub mod config;
pub mod date;
pub mod dirs;
pub mod dirty;
pub mod display;
pub mod error;
pub mod events;
pub mod git;
pub mod link;
pub mod output;
pub mod session;
pub mod sources;

// === Error handling ===
// Core error types and result type used throughout the application
pub use error::{BlameError, Result};

// === Annotation model ===
// Immutable per-line history and the edits that invalidate it
pub use annotation::{AnnotationTable, LineAnnotation};
pub use dirty::{compute_dirty, DirtyLines, DirtyRangeTracker, LineRange};

// === Session ===
// Per-buffer orchestration and its collaborators
pub use commit_cache::{CommitDetailCache, CommitKey};
pub use session::{AnnotationSession, Collaborators, ResyncReason, SessionPhase};
pub use sources::{
    CommitDetail, CommitSource, HistoryRecord, HistorySource, LineDiff, RepoHandle,
    RepositoryLookup,
};

// === Host surfaces ===
// Buffers, display sinks and event plumbing
pub use buffer::{MemoryBuffer, TextBuffer};
pub use display::{DisplaySink, DisplayState, Notice, RowDisplay};
pub use events::{Callback, CompositeDisposable, Disposable, Emitter};

// === Git backend ===
pub use git::{GitBackend, GitRepo};

// === Presentation ===
pub use config::BlameConfig;
pub use date::DateRenderer;
pub use link::resolve as resolve_commit_link;

// === Output formatting ===
// Unified output formatting for consistent CLI presentation
pub use output::{print_error, print_info, print_notice};
