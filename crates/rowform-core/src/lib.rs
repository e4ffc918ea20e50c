//! Rowform Core Library
//!
//! This crate provides the core functionality for Rowform, a real-time
//! synchronization engine between a delimiter-separated text buffer and a
//! structured row form.
//!
//! # Architecture
//!
//! Observations of either surface become typed [`sync::SyncEvent`]s, queued
//! on a [`sync::SyncCoordinator`] and dispatched to directional handlers in
//! descending priority order. Loop guards on the shared
//! [`sync::SyncContext`] keep a write to one surface from echoing back from
//! the other.
//!
//! # Quick Start
//!
//! ```text
//! let editor = BufferEditor::new("Name\tAge\nalice\t30");
//! let form = Arc::new(RecordingFormView::new());
//! let orchestrator = Orchestrator::new(editor, form, &SyncConfig::load()?);
//!
//! orchestrator.reload().await;
//! orchestrator.handle_form_message(message).await;
//! ```
//!
//! # Modules
//!
//! - `orchestrator`: Event source/sink bridge (main entry point)
//! - `sync`: Coordinator, handlers, guards, and debouncing
//! - `table`: Delimiter detection and table snapshot parsing
//! - `editor`: Host editor traits and the in-memory buffer
//! - `form`: Form view trait and inbound message types
//! - `config`: Engine configuration

pub mod config;
pub mod editor;
pub mod form;
pub mod orchestrator;
pub mod sync;
pub mod table;

pub use config::SyncConfig;
pub use editor::{BufferEditor, Document, DocumentError, Editor, Position, Selection};
pub use form::{FormCall, FormMessage, FormRow, FormView, RecordingFormView};
pub use orchestrator::Orchestrator;
pub use sync::{SyncCoordinator, SyncError, SyncEvent, SyncEventKind, SyncHandler};
pub use table::{Delimiter, RowRegime, TableSnapshot};
