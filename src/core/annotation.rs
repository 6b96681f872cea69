//! Per-line annotation table built from blame output.
//!
//! An [`AnnotationTable`] is built in one pass from a [`HistoryRecord`]
//! sequence and is never mutated afterwards; a resync replaces it wholesale.
//!
//! # Revision identity
//! The identity of a line's revision is the leading non-whitespace token of the
//! raw revision field. Blame tools prefix boundary commits with a marker (`^`),
//! so a leading non-hex character is split off into
//! [`LineAnnotation::boundary_marker`] before the identity is compared against
//! the all-zero "not committed yet" sentinel or used as a lookup key.

use crate::core::sources::HistoryRecord;
use serde::Serialize;

/// Length of the abbreviated hash shown to users
pub const SHORT_HASH_LEN: usize = 8;

/// Split a raw revision field into `(marker, identity)`.
///
/// ```
/// use git_line_blame::core::annotation::parse_revision;
///
/// assert_eq!(parse_revision("^1a2b3c4 (boundary)"), (Some('^'), "1a2b3c4"));
/// assert_eq!(parse_revision("deadbeef"), (None, "deadbeef"));
/// ```
pub fn parse_revision(raw: &str) -> (Option<char>, &str) {
    let token = raw.split_whitespace().next().unwrap_or("");
    match token.chars().next() {
        Some(first) if !first.is_ascii_hexdigit() => (Some(first), &token[first.len_utf8()..]),
        _ => (None, token),
    }
}

/// Revision identity with any boundary marker removed
pub fn strip_marker(raw: &str) -> &str {
    parse_revision(raw).1
}

/// True for the all-zero revision git uses for working-tree lines
pub fn is_uncommitted_sentinel(revision: &str) -> bool {
    let id = strip_marker(revision);
    !id.is_empty() && id.chars().all(|c| c == '0')
}

/// True when `revision` names a real commit
pub fn is_committed(revision: &str) -> bool {
    let id = strip_marker(revision);
    !id.is_empty() && !is_uncommitted_sentinel(id)
}

/// Abbreviated form of a revision, marker stripped
pub fn short_revision(revision: &str) -> String {
    strip_marker(revision).chars().take(SHORT_HASH_LEN).collect()
}

/// Authorship of one line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineAnnotation {
    pub revision_id: String,
    pub boundary_marker: Option<char>,
    pub author: String,
    pub timestamp_raw: String,
}

impl LineAnnotation {
    pub fn from_record(record: &HistoryRecord) -> Self {
        let (boundary_marker, revision_id) = parse_revision(&record.revision);
        Self {
            revision_id: revision_id.to_string(),
            boundary_marker,
            author: record.author.trim().to_string(),
            timestamp_raw: record.timestamp.clone(),
        }
    }

    pub fn is_committed(&self) -> bool {
        is_committed(&self.revision_id)
    }

    pub fn short_hash(&self) -> String {
        short_revision(&self.revision_id)
    }
}

/// Annotations for one buffer snapshot, indexed by zero-based line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationTable {
    lines: Vec<LineAnnotation>,
}

impl AnnotationTable {
    /// Build a table from blame records.
    ///
    /// Records are placed by their 1-based `line` field. Records are expected
    /// to arrive in line order; any out-of-range line number falls back to the
    /// record's position in the sequence, so the table always has exactly one
    /// entry per record.
    pub fn build(records: &[HistoryRecord]) -> Self {
        let mut lines: Vec<Option<LineAnnotation>> = vec![None; records.len()];

        for (position, record) in records.iter().enumerate() {
            let index = match record.line.checked_sub(1) {
                Some(i) if i < records.len() && lines[i].is_none() => i,
                _ => position,
            };
            lines[index] = Some(LineAnnotation::from_record(record));
        }

        let lines = lines
            .into_iter()
            .zip(records)
            .map(|(slot, record)| slot.unwrap_or_else(|| LineAnnotation::from_record(record)))
            .collect();

        Self { lines }
    }

    pub fn get(&self, row: usize) -> Option<&LineAnnotation> {
        self.lines.get(row)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineAnnotation> {
        self.lines.iter()
    }

    /// Rows whose annotation names a real commit
    pub fn committed_rows(&self) -> impl Iterator<Item = (usize, &LineAnnotation)> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, annotation)| annotation.is_committed())
    }
}
