//! What the annotation engine tells the UI.
//!
//! A row lookup yields a [`RowDisplay`]; rendering turns it into a
//! [`DisplayState`] for the [`DisplaySink`]. Tooltip detail and transient
//! notices travel through the same sink.

use crate::core::annotation::LineAnnotation;
use crate::core::date::DateRenderer;
use crate::core::sources::CommitDetail;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Text shown for lines that have no commit behind them
pub const NOT_COMMITTED_YET: &str = "Not Committed Yet";

/// Result of looking up one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowDisplay {
    /// The buffer is not in a repository
    NoRepository,
    /// The file, or this row, has no history yet
    NoHistoryYet,
    /// History exists; `dirty` rows must not show it as current
    Annotated {
        annotation: LineAnnotation,
        dirty: bool,
    },
}

impl RowDisplay {
    /// The annotation of a committed, clean row
    pub fn committed_annotation(&self) -> Option<&LineAnnotation> {
        match self {
            RowDisplay::Annotated {
                annotation,
                dirty: false,
            } if annotation.is_committed() => Some(annotation),
            _ => None,
        }
    }
}

/// What the status surface should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    Blank,
    NotCommittedYet,
    Annotated {
        author: String,
        date_text: String,
        is_dirty: bool,
    },
}

impl DisplayState {
    pub fn from_row(row: &RowDisplay, dates: &DateRenderer, now: DateTime<Utc>) -> Self {
        match row {
            RowDisplay::NoRepository => DisplayState::Blank,
            RowDisplay::NoHistoryYet => DisplayState::NotCommittedYet,
            RowDisplay::Annotated { annotation, .. } if !annotation.is_committed() => {
                DisplayState::NotCommittedYet
            }
            RowDisplay::Annotated { annotation, dirty } => DisplayState::Annotated {
                author: annotation.author.clone(),
                date_text: dates.render(&annotation.timestamp_raw, now),
                is_dirty: *dirty,
            },
        }
    }

    /// Plain-text rendering. Dirty rows hide their stale author and date.
    pub fn text(&self) -> String {
        match self {
            DisplayState::Blank => String::new(),
            DisplayState::NotCommittedYet => NOT_COMMITTED_YET.to_string(),
            DisplayState::Annotated { is_dirty: true, .. } => NOT_COMMITTED_YET.to_string(),
            DisplayState::Annotated {
                author, date_text, ..
            } => format!("{author} · {date_text}"),
        }
    }
}

/// A transient, auto-dismissing informational message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub timeout: Duration,
}

impl Notice {
    pub fn new(message: impl Into<String>, timeout: Duration) -> Self {
        Self {
            message: message.into(),
            timeout,
        }
    }

    pub fn unknown_link() -> Self {
        Self::new(
            "Unknown url. Shift-click to copy hash.",
            Duration::from_millis(2000),
        )
    }

    pub fn copied_hash(hash: &str) -> Self {
        Self::new(
            format!("Copied commit hash: {hash}"),
            Duration::from_millis(1500),
        )
    }
}

/// Receives display updates from a session
pub trait DisplaySink: Send + Sync {
    fn render(&self, state: DisplayState);

    /// Commit detail for the row under the cursor, for tooltips
    fn show_detail(&self, detail: CommitDetail);

    fn notify(&self, notice: Notice);
}
