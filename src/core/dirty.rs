//! Tracking of lines edited since the last annotation snapshot.
//!
//! A line is *dirty* when the buffer content at that line may no longer match
//! what the current [`crate::core::annotation::AnnotationTable`] describes.
//! Dirty lines must not show their (stale) annotation.
//!
//! # Lifecycle
//! - [`DirtyRangeTracker::record`] accumulates marks as edits settle.
//! - [`DirtyRangeTracker::begin_resync`] opens a window for marks that arrive
//!   while a resync is in flight.
//! - [`DirtyRangeTracker::commit`] installs the dirty set of a freshly applied
//!   table. Marks recorded before the resync began are dropped; marks recorded
//!   during it survive, since the fetched table cannot reflect them.

use crate::core::sources::LineDiff;
use std::collections::BTreeSet;

/// A zero-based, half-open range of lines: `[start_line, start_line + line_count)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start_line: usize,
    pub line_count: usize,
}

impl LineRange {
    pub fn new(start_line: usize, line_count: usize) -> Self {
        Self {
            start_line,
            line_count,
        }
    }

    /// Convert a git hunk (`new_start` 1-based) to a zero-based range.
    ///
    /// Pure deletions report `new_lines == 0` and mark nothing. Git reports
    /// `new_start == 0` for a deletion at the top of a file.
    pub fn from_hunk(diff: &LineDiff) -> Self {
        Self {
            start_line: diff.new_start.saturating_sub(1),
            line_count: diff.new_lines,
        }
    }
}

/// A set of dirty lines, or every line when no diff could be computed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirtyLines {
    Lines(BTreeSet<usize>),
    Everything,
}

impl Default for DirtyLines {
    fn default() -> Self {
        DirtyLines::Lines(BTreeSet::new())
    }
}

impl DirtyLines {
    pub fn contains(&self, row: usize) -> bool {
        match self {
            DirtyLines::Lines(lines) => lines.contains(&row),
            DirtyLines::Everything => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, DirtyLines::Lines(lines) if lines.is_empty())
    }

    /// Union `other` into `self`
    pub fn extend(&mut self, other: &DirtyLines) {
        match other {
            DirtyLines::Everything => *self = DirtyLines::Everything,
            DirtyLines::Lines(theirs) => {
                if let DirtyLines::Lines(mine) = self {
                    mine.extend(theirs.iter().copied());
                }
            }
        }
    }
}

/// Compute the dirty set for a list of ranges.
///
/// `None` means no diff was available; every line is then treated as dirty.
pub fn compute_dirty(ranges: Option<&[LineRange]>) -> DirtyLines {
    let Some(ranges) = ranges else {
        return DirtyLines::Everything;
    };

    let lines = ranges
        .iter()
        .flat_map(|range| range.start_line..range.start_line + range.line_count)
        .collect();
    DirtyLines::Lines(lines)
}

/// Dirty set for the hunks a repository reports
pub fn dirty_from_hunks(diffs: Option<&[LineDiff]>) -> DirtyLines {
    let ranges: Option<Vec<LineRange>> =
        diffs.map(|diffs| diffs.iter().map(LineRange::from_hunk).collect());
    compute_dirty(ranges.as_deref())
}

/// Per-session dirty state
#[derive(Debug, Default)]
pub struct DirtyRangeTracker {
    current: DirtyLines,
    since_resync: DirtyLines,
}

impl DirtyRangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add marks for an observed edit
    pub fn record(&mut self, dirty: &DirtyLines) {
        self.current.extend(dirty);
        self.since_resync.extend(dirty);
    }

    /// Start collecting the marks that a resync starting now cannot see
    pub fn begin_resync(&mut self) {
        self.since_resync = DirtyLines::default();
    }

    /// The set [`DirtyRangeTracker::commit`] would install for `baseline` right now
    pub fn preview(&self, baseline: &DirtyLines) -> DirtyLines {
        let mut next = baseline.clone();
        next.extend(&self.since_resync);
        next
    }

    /// Install the dirty set belonging to a freshly applied table
    pub fn commit(&mut self, baseline: DirtyLines) {
        self.current = self.preview(&baseline);
        self.since_resync = DirtyLines::default();
    }

    pub fn clear(&mut self) {
        self.current = DirtyLines::default();
        self.since_resync = DirtyLines::default();
    }

    pub fn is_dirty(&self, row: usize) -> bool {
        self.current.contains(row)
    }

    pub fn current(&self) -> &DirtyLines {
        &self.current
    }
}
