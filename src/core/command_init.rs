//! Centralized initialization for file-based commands.
//!
//! This module provides [`BlameCommandInit`] which handles the setup every
//! command shares: resolving the file, finding its repository, loading the
//! configuration and bringing an [`AnnotationSession`] over the file to its
//! first completed resync.
//!
//! # Public API
//! - [`BlameCommandInit`]: Main initializer
//! - [`BlameCommandContext`]: Initialized context containing the session and its buffer
//! - [`ConsoleSink`]: Display sink that prints notices to the terminal
//!
//! # Initialization Steps
//! 1. **File resolution**: The file must exist; its path is made absolute
//! 2. **Git repository validation**: The file must live in a git working tree
//! 3. **Configuration**: `--date-format` overrides the config file
//! 4. **Session**: Attach to an in-memory buffer of the file and resync once

use crate::core::buffer::{MemoryBuffer, TextBuffer};
use crate::core::commit_cache::CommitDetailCache;
use crate::core::config::BlameConfig;
use crate::core::date::DateRenderer;
use crate::core::display::{DisplaySink, DisplayState, Notice};
use crate::core::error::{BlameError, Result};
use crate::core::git::GitBackend;
use crate::core::output::print_notice;
use crate::core::session::{AnnotationSession, Collaborators};
use crate::core::sources::CommitDetail;
use std::path::Path;
use std::sync::Arc;

/// Prints notices; status-bar renders and tooltips have no terminal counterpart
pub struct ConsoleSink;

impl DisplaySink for ConsoleSink {
    fn render(&self, state: DisplayState) {
        log::debug!("Status: {}", state.text());
    }

    fn show_detail(&self, detail: CommitDetail) {
        log::debug!("Detail: {}", detail.subject);
    }

    fn notify(&self, notice: Notice) {
        print_notice(&notice);
    }
}

/// Initialized context for a command working on one file
pub struct BlameCommandContext {
    pub buffer: Arc<MemoryBuffer>,
    pub session: Arc<AnnotationSession>,
    pub dates: DateRenderer,
}

impl BlameCommandContext {
    /// Put the cursor on 1-based `line`
    pub fn select_line(&self, line: usize) -> Result<()> {
        let max = self.buffer.line_count();
        if line == 0 {
            return Err(BlameError::ZeroLine);
        }
        if line > max {
            return Err(BlameError::line_out_of_range(line, max));
        }
        self.buffer.place_cursor(line - 1);
        Ok(())
    }

    pub fn line_count(&self) -> usize {
        self.buffer.line_count()
    }
}

pub struct BlameCommandInit;

impl BlameCommandInit {
    /// Initialize everything needed to query annotations of `file`
    pub async fn initialize(file: &Path, date_format: Option<&str>) -> Result<BlameCommandContext> {
        // Step 1: Resolve the file
        if !file.is_file() {
            return Err(BlameError::file_not_found(file));
        }
        let path = file.canonicalize()?;

        // Step 2: Check that it lives in a git repository
        let backend = Arc::new(GitBackend::new());
        let repo = backend.open_repo(&path).map_err(|e| {
            log::debug!("Repository lookup failed: {e}");
            BlameError::NotInGitRepo
        })?;
        // Fail early on files outside the working tree
        repo.relative_path(&path)?;

        // Step 3: Configuration
        let dates = match date_format {
            Some(format) => DateRenderer::new(format),
            None => BlameConfig::load()?.date_renderer(),
        };

        // Step 4: Session over an in-memory copy of the file
        let buffer = Arc::new(MemoryBuffer::open(&path)?);
        let collaborators = Collaborators::new(
            backend.clone(),
            backend.clone(),
            Arc::new(CommitDetailCache::new(backend)),
        )
        .with_dates(dates.clone());
        let session = AnnotationSession::attach(
            buffer.clone() as Arc<dyn TextBuffer>,
            collaborators,
            Arc::new(ConsoleSink),
        )?;
        session.resync().await;

        log::debug!(
            "Initialized session for {} ({} lines)",
            path.display(),
            buffer.line_count()
        );

        Ok(BlameCommandContext {
            buffer,
            session,
            dates,
        })
    }
}
