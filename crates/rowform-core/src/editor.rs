//! Host editor abstractions
//!
//! The engine never owns the text buffer; it talks to the host through the
//! [`Document`] and [`Editor`] traits. [`BufferEditor`] is the in-memory
//! implementation used by the CLI replay harness and by tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced by a host document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Line index past the end of the buffer
    #[error("Line {line} is out of range (document has {line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },
}

/// Zero-based cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Editor selection; `active` is the cursor end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
    pub active: Position,
}

impl Selection {
    /// Collapsed selection at a single position
    pub fn cursor(position: Position) -> Self {
        Self {
            start: position,
            end: position,
            active: position,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Number of lines the selection spans
    pub fn line_span(&self) -> usize {
        self.end.line.abs_diff(self.start.line) + 1
    }
}

/// Line-oriented view of the host text buffer
///
/// Line count and line text must be read fresh on every access; callers
/// never cache them across an await. `replace_line` resolves to `Ok(false)`
/// when the host declines the edit (e.g. a read-only buffer).
#[async_trait]
pub trait Document: Send + Sync {
    fn line_count(&self) -> usize;

    /// Text of the given zero-based line, `None` when out of range
    fn line(&self, index: usize) -> Option<String>;

    /// Replace one whole line; `Ok(false)` means the host rejected the edit
    async fn replace_line(&self, index: usize, text: &str) -> Result<bool, DocumentError>;

    /// Append a new line at the end of the buffer
    async fn append_line(&self, text: &str) -> Result<bool, DocumentError>;

    /// Full buffer text
    fn text(&self) -> String;
}

/// Host editor surface: a document plus cursor and scroll control
pub trait Editor: Send + Sync {
    fn document(&self) -> &dyn Document;
    fn selection(&self) -> Selection;
    fn set_selection(&self, selection: Selection);

    /// Scroll the given position into view
    fn reveal(&self, position: Position);
}

/// Move the cursor to the start of a 1-based line and reveal it
///
/// Out-of-range lines are logged and ignored; the selection is left
/// untouched.
pub fn goto_line(editor: &dyn Editor, line_number: usize) {
    let line_count = editor.document().line_count();
    if line_number < 1 || line_number > line_count {
        warn!(
            line_number,
            line_count, "goto_line target out of range, leaving cursor in place"
        );
        return;
    }
    let position = Position::new(line_number - 1, 0);
    editor.set_selection(Selection::cursor(position));
    editor.reveal(position);
    debug!(line_number, "cursor moved");
}

/// In-memory `Document` + `Editor` over a vector of lines
///
/// Carries a read-only switch so the edit-rejection path can be exercised
/// without a real host.
pub struct BufferEditor {
    lines: RwLock<Vec<String>>,
    selection: RwLock<Selection>,
    read_only: AtomicBool,
}

impl BufferEditor {
    pub fn new(text: &str) -> Arc<Self> {
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            text.lines().map(str::to_string).collect()
        };
        Arc::new(Self {
            lines: RwLock::new(lines),
            selection: RwLock::new(Selection::default()),
            read_only: AtomicBool::new(false),
        })
    }

    /// Toggle rejection of all edits
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }
}

#[async_trait]
impl Document for BufferEditor {
    fn line_count(&self) -> usize {
        self.lines.read().unwrap().len()
    }

    fn line(&self, index: usize) -> Option<String> {
        self.lines.read().unwrap().get(index).cloned()
    }

    async fn replace_line(&self, index: usize, text: &str) -> Result<bool, DocumentError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let mut lines = self.lines.write().unwrap();
        let line_count = lines.len();
        let slot = lines
            .get_mut(index)
            .ok_or(DocumentError::LineOutOfRange { line: index, line_count })?;
        *slot = text.to_string();
        Ok(true)
    }

    async fn append_line(&self, text: &str) -> Result<bool, DocumentError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.lines.write().unwrap().push(text.to_string());
        Ok(true)
    }

    fn text(&self) -> String {
        self.lines.read().unwrap().join("\n")
    }
}

impl Editor for BufferEditor {
    fn document(&self) -> &dyn Document {
        self
    }

    fn selection(&self) -> Selection {
        *self.selection.read().unwrap()
    }

    fn set_selection(&self, selection: Selection) {
        *self.selection.write().unwrap() = selection;
    }

    fn reveal(&self, _position: Position) {
        // Nothing to scroll in memory
    }
}
