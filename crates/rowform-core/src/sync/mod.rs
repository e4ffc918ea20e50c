//! Synchronization engine
//!
//! Event-driven reconciliation between the text buffer and the form view.
//!
//! ## Flow
//!
//! 1. The orchestrator observes a surface (editor, form, or a system
//!    control such as the header-row field) and builds a typed
//!    [`SyncEvent`].
//! 2. [`SyncCoordinator::emit`] enqueues it; a single-flight drain loop
//!    pops events FIFO.
//! 3. Every enabled handler whose `can_handle` accepts the event runs in
//!    descending priority order.
//! 4. Handlers that write across views set the [`SyncContext`] loop guards
//!    around the write so the resulting change notification is not
//!    re-emitted as a new user edit.

pub mod context;
pub mod coordinator;
pub mod debounce;
pub mod error;
pub mod event;
pub mod handler;
pub mod handlers;

pub use context::SyncContext;
pub use coordinator::{SyncCoordinator, DEFAULT_POLL_INTERVAL};
pub use debounce::DebounceGate;
pub use error::SyncError;
pub use event::{EventOrigin, SyncEvent, SyncEventKind};
pub use handler::{HandlerConfig, HandlerState, SyncHandler, SyncSurfaces};
pub use handlers::{
    CursorToRowFieldHandler, EditorToFormHandler, FormToEditorHandler, FormToHeaderHandler,
    HeaderToFormHandler, RowFieldToCursorHandler,
};
