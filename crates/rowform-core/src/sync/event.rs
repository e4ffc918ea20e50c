//! Sync event model
//!
//! Events are built by the orchestrator, pushed onto the coordinator's
//! queue, consumed exactly once and discarded. Ordering is FIFO only; no
//! event carries an identity beyond its queue position.

use chrono::{DateTime, Utc};

/// Which surface produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    Editor,
    Form,
    System,
}

/// The six event kinds
///
/// `editing_form` and `from_sync` are snapshots of the loop-guard flags
/// taken when the event was built; handlers consult them to skip
/// sync-derived work.
#[derive(Debug, Clone)]
pub enum SyncEventKind {
    /// The header row (index or content) changed
    HeaderChange {
        headers: Vec<String>,
        header_row: usize,
    },
    /// Buffer text changed or the cursor landed on a new line
    EditorChange {
        headers: Vec<String>,
        header_row: usize,
        active_row: usize,
        editing_form: bool,
        from_sync: bool,
    },
    /// A form field was edited
    FormChange {
        headers: Vec<String>,
        header_row: usize,
        active_row: usize,
        /// Row index relative to the header row
        row_index: i64,
        column: String,
        /// Position of the edited field; authoritative when labels repeat
        column_index: usize,
        value: String,
        editing_form: bool,
        from_sync: bool,
    },
    /// The cursor moved to a different line
    CursorRowChange {
        active_row: usize,
        editing_form: bool,
    },
    /// The current-row numeric field changed
    CurrentRowFieldChange {
        header_row: usize,
        value: usize,
        from_sync: bool,
    },
    /// Request to move the cursor to the current-row field's value
    CurrentRowFieldToCursor { value: usize, from_sync: bool },
}

impl SyncEventKind {
    /// Stable name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            SyncEventKind::HeaderChange { .. } => "headerChange",
            SyncEventKind::EditorChange { .. } => "editorChange",
            SyncEventKind::FormChange { .. } => "formChange",
            SyncEventKind::CursorRowChange { .. } => "cursorRowChange",
            SyncEventKind::CurrentRowFieldChange { .. } => "currentRowFieldChange",
            SyncEventKind::CurrentRowFieldToCursor { .. } => "currentRowFieldToCursor",
        }
    }
}

/// A queued synchronization event
#[derive(Debug, Clone)]
pub struct SyncEvent {
    pub origin: EventOrigin,
    pub at: DateTime<Utc>,
    pub kind: SyncEventKind,
}

impl SyncEvent {
    pub fn new(origin: EventOrigin, kind: SyncEventKind) -> Self {
        Self {
            origin,
            at: Utc::now(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let event = SyncEvent::new(
            EventOrigin::System,
            SyncEventKind::HeaderChange {
                headers: vec![],
                header_row: 1,
            },
        );
        assert_eq!(event.kind.name(), "headerChange");
        assert_eq!(event.origin, EventOrigin::System);
    }
}
