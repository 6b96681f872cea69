//! git-line-blame - per-line git authorship kept in sync with a live buffer.
//!
//! This library provides the annotation engine behind the `git-line-blame`
//! CLI: it turns blame output into an immutable per-line table, suppresses
//! annotations for lines edited since, coalesces resync requests, and caches
//! commit detail with single-flight lookups.
//!
//! # Public API
//! The main public interface is re-exported from the [`core`] module, which provides:
//! - The [`AnnotationSession`] orchestrator and its collaborator traits
//! - Annotation tables and dirty-line tracking
//! - The commit detail cache, link resolution and date rendering
//! - A `git2`-backed implementation of the collaborators
//! - Error handling and result types

pub mod commands;
pub mod core;

// Re-export the core public API for external users
pub use core::{
    // Session
    AnnotationSession,
    // Annotation model
    AnnotationTable,
    // Error handling
    BlameError,
    Collaborators,
    CommitDetail,
    CommitDetailCache,
    DateRenderer,
    DirtyRangeTracker,
    DisplaySink,
    DisplayState,
    // Git backend
    GitBackend,
    GitRepo,
    LineAnnotation,
    // Host surfaces
    MemoryBuffer,
    Notice,
    Result,
    RowDisplay,
    TextBuffer,
};
