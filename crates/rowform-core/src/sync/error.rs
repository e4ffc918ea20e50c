//! Sync error handling
//!
//! Nothing here is fatal: the coordinator catches every handler error, logs
//! it, and moves on. The worst observable outcome of any fault is a stale
//! or unfilled form field.

use thiserror::Error;

use crate::editor::DocumentError;

/// Errors a handler can surface to the coordinator
#[derive(Error, Debug)]
pub enum SyncError {
    /// Target line index outside the current buffer
    #[error("Line {line} is out of range (buffer has {line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },

    /// Column label not present in the current headers
    #[error("Column '{column}' not found in headers")]
    ColumnNotFound { column: String },

    /// The host declined an edit (e.g. read-only buffer)
    #[error("Host rejected edit of line {line}")]
    EditRejected { line: usize },

    /// Underlying document error
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}
