//! The six directional handlers
//!
//! One file per synchronization direction. Each consults the freshly
//! computed [`RowRegime`](crate::table::RowRegime) where the direction is
//! regime-sensitive; no regime is ever stored between events.

mod cursor_to_row_field;
mod editor_to_form;
mod form_to_editor;
mod form_to_header;
mod header_to_form;
mod row_field_to_cursor;

pub use cursor_to_row_field::CursorToRowFieldHandler;
pub use editor_to_form::EditorToFormHandler;
pub use form_to_editor::FormToEditorHandler;
pub use form_to_header::FormToHeaderHandler;
pub use header_to_form::HeaderToFormHandler;
pub use row_field_to_cursor::RowFieldToCursorHandler;
