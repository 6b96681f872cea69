//! The editor buffer surface a session observes.
//!
//! [`TextBuffer`] is what a host editor implements for its buffers.
//! [`MemoryBuffer`] is a self-contained implementation: the CLI uses it to
//! drive a session over a file on disk, and tests use it to script edits,
//! saves, renames and cursor movement.

use crate::core::error::{BlameError, Result};
use crate::core::events::{lock, Callback, Disposable, Emitter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// An open editor buffer
pub trait TextBuffer: Send + Sync {
    fn path(&self) -> Option<PathBuf>;

    /// Current content; `None` when it cannot be read
    fn text(&self) -> Option<String>;

    /// Zero-based row of the primary cursor
    fn cursor_row(&self) -> usize;

    /// Fires once an edit burst settles, with the number of changes in it
    fn on_did_stop_changing(&self, callback: Callback<usize>) -> Disposable;

    fn on_did_save(&self, callback: Callback<()>) -> Disposable;

    fn on_did_change_path(&self, callback: Callback<Option<PathBuf>>) -> Disposable;

    /// Fires with the new zero-based cursor row
    fn on_did_change_cursor_position(&self, callback: Callback<usize>) -> Disposable;

    fn on_did_destroy(&self, callback: Callback<()>) -> Disposable;
}

struct BufferState {
    path: Option<PathBuf>,
    text: Option<String>,
    /// Line count of content that could not be decoded as text
    raw_lines: usize,
    cursor_row: usize,
    pending_changes: usize,
    persist: bool,
}

/// An in-memory buffer with scriptable events
pub struct MemoryBuffer {
    state: Mutex<BufferState>,
    stop_changing: Emitter<usize>,
    saved: Emitter<()>,
    path_changed: Emitter<Option<PathBuf>>,
    cursor_moved: Emitter<usize>,
    destroyed: Emitter<()>,
}

impl MemoryBuffer {
    /// A buffer that never touches the filesystem; `save` only emits the event
    pub fn new(path: Option<PathBuf>, text: impl Into<String>) -> Self {
        Self::with_state(BufferState {
            path,
            text: Some(text.into()),
            raw_lines: 0,
            cursor_row: 0,
            pending_changes: 0,
            persist: false,
        })
    }

    /// A buffer loaded from `path`; `save` writes back to it.
    ///
    /// Content that is not valid UTF-8 opens as unreadable text.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(BlameError::file_not_found(path));
        }
        let bytes = std::fs::read(&path)?;
        let raw_lines = count_lines(&bytes);
        let text = String::from_utf8(bytes).ok();
        if text.is_none() {
            log::debug!("{} is not valid UTF-8", path.display());
        }
        Ok(Self::with_state(BufferState {
            path: Some(path),
            text,
            raw_lines,
            cursor_row: 0,
            pending_changes: 0,
            persist: true,
        }))
    }

    fn with_state(state: BufferState) -> Self {
        Self {
            state: Mutex::new(state),
            stop_changing: Emitter::new(),
            saved: Emitter::new(),
            path_changed: Emitter::new(),
            cursor_moved: Emitter::new(),
            destroyed: Emitter::new(),
        }
    }

    /// Replace the whole content. Listeners hear about it on [`MemoryBuffer::settle`].
    pub fn set_text(&self, text: impl Into<String>) {
        let mut state = lock(&self.state);
        state.text = Some(text.into());
        state.pending_changes += 1;
    }

    /// Replace one zero-based line, appending empty lines as needed
    pub fn edit_line(&self, row: usize, content: &str) {
        let mut state = lock(&self.state);
        let mut lines: Vec<String> = state
            .text
            .as_deref()
            .unwrap_or("")
            .lines()
            .map(str::to_string)
            .collect();
        if lines.len() <= row {
            lines.resize(row + 1, String::new());
        }
        lines[row] = content.to_string();
        let mut text = lines.join("\n");
        text.push('\n');
        state.text = Some(text);
        state.pending_changes += 1;
    }

    /// Make the content unreadable, as if the backing store failed
    pub fn make_unreadable(&self) {
        let mut state = lock(&self.state);
        state.text = None;
        state.pending_changes += 1;
    }

    /// End the current edit burst
    pub fn settle(&self) {
        let changes = std::mem::take(&mut lock(&self.state).pending_changes);
        self.stop_changing.emit(changes);
    }

    pub fn save(&self) -> Result<()> {
        let (persist, path, text) = {
            let state = lock(&self.state);
            (state.persist, state.path.clone(), state.text.clone())
        };
        if persist {
            if let (Some(path), Some(text)) = (path, text) {
                std::fs::write(&path, text)?;
                log::debug!("Saved buffer to {}", path.display());
            }
        }
        self.saved.emit(());
        Ok(())
    }

    pub fn set_path(&self, path: Option<PathBuf>) {
        lock(&self.state).path = path.clone();
        self.path_changed.emit(path);
    }

    pub fn move_cursor(&self, row: usize) {
        lock(&self.state).cursor_row = row;
        self.cursor_moved.emit(row);
    }

    /// Move the cursor without emitting, as a host does while a pane is hidden
    pub fn place_cursor(&self, row: usize) {
        lock(&self.state).cursor_row = row;
    }

    pub fn destroy(&self) {
        self.destroyed.emit(());
    }

    pub fn line_count(&self) -> usize {
        let state = lock(&self.state);
        state
            .text
            .as_deref()
            .map_or(state.raw_lines, |t| t.lines().count())
    }

    pub fn has_path(&self, path: &Path) -> bool {
        lock(&self.state).path.as_deref() == Some(path)
    }

    /// Total listeners across all events
    pub fn listener_count(&self) -> usize {
        self.stop_changing.listener_count()
            + self.saved.listener_count()
            + self.path_changed.listener_count()
            + self.cursor_moved.listener_count()
            + self.destroyed.listener_count()
    }
}

fn count_lines(bytes: &[u8]) -> usize {
    if bytes.is_empty() {
        return 0;
    }
    bytes.split(|&b| b == b'\n').count() - usize::from(bytes.ends_with(b"\n"))
}

impl TextBuffer for MemoryBuffer {
    fn path(&self) -> Option<PathBuf> {
        lock(&self.state).path.clone()
    }

    fn text(&self) -> Option<String> {
        lock(&self.state).text.clone()
    }

    fn cursor_row(&self) -> usize {
        lock(&self.state).cursor_row
    }

    fn on_did_stop_changing(&self, callback: Callback<usize>) -> Disposable {
        self.stop_changing.subscribe(callback)
    }

    fn on_did_save(&self, callback: Callback<()>) -> Disposable {
        self.saved.subscribe(callback)
    }

    fn on_did_change_path(&self, callback: Callback<Option<PathBuf>>) -> Disposable {
        self.path_changed.subscribe(callback)
    }

    fn on_did_change_cursor_position(&self, callback: Callback<usize>) -> Disposable {
        self.cursor_moved.subscribe(callback)
    }

    fn on_did_destroy(&self, callback: Callback<()>) -> Disposable {
        self.destroyed.subscribe(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_settle_reports_change_count() {
        let buffer = MemoryBuffer::new(None, "a\nb\n");
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        let _token = buffer.on_did_stop_changing(Arc::new(move |n| {
            seen_clone.store(n, Ordering::SeqCst);
        }));

        buffer.edit_line(0, "x");
        buffer.edit_line(1, "y");
        buffer.settle();

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(buffer.text().unwrap(), "x\ny\n");
    }

    #[test]
    fn test_edit_line_extends_buffer() {
        let buffer = MemoryBuffer::new(None, "a\n");
        buffer.edit_line(2, "c");
        assert_eq!(buffer.text().unwrap(), "a\n\nc\n");
        assert_eq!(buffer.line_count(), 3);
    }

    #[test]
    fn test_cursor_events() {
        let buffer = MemoryBuffer::new(None, "a\nb\n");
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        let mut token = buffer.on_did_change_cursor_position(Arc::new(move |row| {
            seen_clone.store(row, Ordering::SeqCst);
        }));

        buffer.move_cursor(1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(buffer.cursor_row(), 1);

        token.dispose();
        buffer.move_cursor(0);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(buffer.listener_count(), 0);
    }

    #[test]
    fn test_open_and_save_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("file.txt");
        std::fs::write(&path, "one\ntwo\n")?;

        let buffer = MemoryBuffer::open(&path)?;
        assert!(buffer.has_path(&path));
        buffer.edit_line(1, "three");
        buffer.save()?;

        assert_eq!(std::fs::read_to_string(&path)?, "one\nthree\n");
        Ok(())
    }

    #[test]
    fn test_open_missing_file() {
        let result = MemoryBuffer::open("/definitely/not/here.txt");
        assert!(matches!(result, Err(BlameError::FileNotFound { .. })));
    }

    #[test]
    fn test_open_non_utf8_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("latin1.txt");
        std::fs::write(&path, b"caf\xe9\nplain\n")?;

        let buffer = MemoryBuffer::open(&path)?;
        assert!(buffer.text().is_none());
        assert_eq!(buffer.line_count(), 2);
        assert!(buffer.has_path(&path));
        Ok(())
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(b""), 0);
        assert_eq!(count_lines(b"one"), 1);
        assert_eq!(count_lines(b"one\ntwo\n"), 2);
        assert_eq!(count_lines(b"one\n\nthree"), 3);
    }

    #[test]
    fn test_unreadable_text() {
        let buffer = MemoryBuffer::new(None, "a\n");
        buffer.make_unreadable();
        assert!(buffer.text().is_none());
        assert_eq!(buffer.line_count(), 0);
    }
}
