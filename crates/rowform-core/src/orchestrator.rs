//! Event source/sink bridge
//!
//! The orchestrator observes the host editor and the form view's inbound
//! messages, translates observations into typed [`SyncEvent`]s, and
//! forwards them to the coordinator. It owns the derived [`TableSnapshot`]
//! and the header-row index; handlers only ever read them through event
//! payloads or the document itself.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::editor::{goto_line, Editor};
use crate::form::{FormMessage, FormView};
use crate::sync::{
    CursorToRowFieldHandler, DebounceGate, EditorToFormHandler, EventOrigin, FormToEditorHandler,
    FormToHeaderHandler, HandlerConfig, HeaderToFormHandler, RowFieldToCursorHandler, SyncContext,
    SyncCoordinator, SyncEvent, SyncEventKind, SyncHandler, SyncSurfaces,
};
use crate::table::{clamp_row, parse_document, TableSnapshot};

/// Bridges the host editor and form view to the sync engine
pub struct Orchestrator {
    coordinator: Arc<SyncCoordinator>,
    surfaces: SyncSurfaces,
    debouncer: Arc<DebounceGate>,
    snapshot: RwLock<TableSnapshot>,
    header_row: AtomicUsize,
    field_debounce: Duration,
}

impl Orchestrator {
    /// Build the engine over the given surfaces and register the six
    /// handlers with their configured enable switches
    pub fn new(editor: Arc<dyn Editor>, form: Arc<dyn FormView>, config: &SyncConfig) -> Self {
        let context = SyncContext::new(Duration::from_millis(config.guard_hold_ms));
        let surfaces = SyncSurfaces {
            editor,
            form,
            context,
        };

        let coordinator = SyncCoordinator::new(Duration::from_millis(config.queue_poll_ms));
        let handler_config = |name: &str, priority: i32| HandlerConfig {
            enabled: config.handler_enabled(name),
            priority,
            debounce_ms: config.debounce_ms,
        };

        coordinator.register_handler(HeaderToFormHandler::new(
            surfaces.clone(),
            handler_config(HeaderToFormHandler::NAME, 10),
        ));
        coordinator.register_handler(EditorToFormHandler::new(
            surfaces.clone(),
            handler_config(EditorToFormHandler::NAME, 10),
        ));
        coordinator.register_handler(FormToEditorHandler::new(
            surfaces.clone(),
            handler_config(FormToEditorHandler::NAME, FormToEditorHandler::PRIORITY),
        ));
        coordinator.register_handler(FormToHeaderHandler::new(
            surfaces.clone(),
            handler_config(FormToHeaderHandler::NAME, 10),
        ));
        coordinator.register_handler(CursorToRowFieldHandler::new(
            surfaces.clone(),
            handler_config(CursorToRowFieldHandler::NAME, 10),
        ));
        coordinator.register_handler(RowFieldToCursorHandler::new(
            surfaces.clone(),
            handler_config(RowFieldToCursorHandler::NAME, 10),
        ));

        let initial = parse_document(&surfaces.editor.document().text(), 1);
        Self {
            coordinator,
            surfaces,
            debouncer: DebounceGate::new(),
            snapshot: RwLock::new(initial),
            header_row: AtomicUsize::new(1),
            field_debounce: Duration::from_millis(config.field_debounce_ms),
        }
    }

    /// Current derived snapshot
    pub fn snapshot(&self) -> TableSnapshot {
        self.snapshot.read().unwrap().clone()
    }

    /// Current 1-based header row index
    pub fn header_row(&self) -> usize {
        self.header_row.load(Ordering::SeqCst)
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    /// Toggle handler enablement from a fresh config
    pub fn refresh_config(&self, config: &SyncConfig) {
        for handler in self.coordinator.handlers() {
            handler.set_enabled(config.handler_enabled(handler.name()));
        }
    }

    /// Re-derive the snapshot from the live document, clamping the header
    /// row to the current line count
    fn refresh_snapshot(&self) -> TableSnapshot {
        let document = self.surfaces.editor.document();
        let line_count = document.line_count();
        let header_row = clamp_row(self.header_row.load(Ordering::SeqCst), line_count);
        self.header_row.store(header_row, Ordering::SeqCst);

        let snapshot = parse_document(&document.text(), header_row);
        *self.snapshot.write().unwrap() = snapshot.clone();
        snapshot
    }

    fn cursor_row(&self) -> usize {
        self.surfaces.editor.selection().active.line + 1
    }

    /// Full (re)load of the active document: clamp indices, push headers,
    /// stats, and the current row
    pub async fn reload(&self) {
        let snapshot = self.refresh_snapshot();
        self.surfaces.form.set_headers(&snapshot.headers);

        // Pull the cursor back inside the buffer after a shrink
        if self.cursor_row() > snapshot.line_count && snapshot.line_count > 0 {
            goto_line(self.surfaces.editor.as_ref(), snapshot.line_count);
        }

        let cursor_row = self.cursor_row();
        self.surfaces
            .form
            .update_line_stats(snapshot.line_count, cursor_row);

        self.emit_editor_change(&snapshot, cursor_row).await;
    }

    /// The host reports a cursor/selection change
    pub async fn cursor_moved(&self) {
        let context = &self.surfaces.context;
        let selection = self.surfaces.editor.selection();
        let cursor_row = selection.active.line + 1;
        let snapshot = self.snapshot();

        if !selection.is_empty() && selection.line_span() > 1 {
            // A multi-line selection has no single current row to show
            self.surfaces.form.clear_form();
        } else if !context.editing_form() && !context.from_sync() {
            self.surfaces
                .form
                .update_line_stats(snapshot.line_count, cursor_row);
            self.emit_editor_change(&snapshot, cursor_row).await;
        }

        self.coordinator
            .emit(SyncEvent::new(
                EventOrigin::Editor,
                SyncEventKind::CursorRowChange {
                    active_row: cursor_row,
                    editing_form: context.editing_form(),
                },
            ))
            .await;
    }

    /// The host reports a buffer text change
    pub async fn text_changed(&self) {
        let context = &self.surfaces.context;
        let old_columns = self.snapshot.read().unwrap().column_count;

        if context.editing_form() || context.from_sync() {
            // The change is our own write: suppress the derived event, but
            // keep the snapshot tracking the buffer so later form edits
            // resolve against the headers actually on the header line.
            self.refresh_snapshot();
            debug!("ignoring text change raised by our own write");
            return;
        }

        let snapshot = self.refresh_snapshot();
        if snapshot.column_count != old_columns {
            debug!(
                old_columns,
                new_columns = snapshot.column_count,
                "column count changed, relabeling form"
            );
            self.surfaces.form.set_headers(&snapshot.headers);
        }

        let cursor_row = self.cursor_row();
        self.surfaces
            .form
            .update_line_stats(snapshot.line_count, cursor_row);
        self.emit_editor_change(&snapshot, cursor_row).await;
    }

    async fn emit_editor_change(&self, snapshot: &TableSnapshot, cursor_row: usize) {
        let context = &self.surfaces.context;
        self.coordinator
            .emit(SyncEvent::new(
                EventOrigin::Editor,
                SyncEventKind::EditorChange {
                    headers: snapshot.headers.clone(),
                    header_row: self.header_row.load(Ordering::SeqCst),
                    active_row: cursor_row,
                    editing_form: context.editing_form(),
                    from_sync: context.from_sync(),
                },
            ))
            .await;
    }

    /// Dispatch a message coming in from the form panel
    pub async fn handle_form_message(&self, message: FormMessage) {
        match message {
            FormMessage::UpdateCell {
                line_number,
                column,
                value,
                column_index,
            } => {
                self.update_cell(line_number, column, value, column_index)
                    .await
            }
            FormMessage::AddRow {
                values,
                copy_current_row,
            } => self.add_row(values, copy_current_row).await,
            FormMessage::HeaderRowChanged { row } => self.header_row_changed(row).await,
            FormMessage::CurrentRowChanged { row } => self.current_row_changed(row).await,
        }
    }

    /// A form field edit; coalesced per field key
    async fn update_cell(
        &self,
        line_number: usize,
        column: String,
        value: String,
        column_index: usize,
    ) {
        let snapshot = self.snapshot();
        let header_row = self.header_row.load(Ordering::SeqCst);
        let context = &self.surfaces.context;

        // The guard goes up at receipt and stays up for the whole typing
        // window: an editor-originated event mid-burst must not re-render
        // the form over the user's in-progress input. Release is scheduled
        // once the coalesced emit has gone through.
        context.begin_form_edit();

        // This event IS the user's edit; its guard fields describe other
        // writers, so both stay false.
        let event = SyncEvent::new(
            EventOrigin::Form,
            SyncEventKind::FormChange {
                headers: snapshot.headers.clone(),
                header_row,
                active_row: line_number,
                row_index: line_number as i64 - header_row as i64,
                column: column.clone(),
                column_index,
                value,
                editing_form: false,
                from_sync: false,
            },
        );

        if self.field_debounce.is_zero() {
            self.coordinator.emit(event).await;
            context.schedule_release();
            return;
        }

        let coordinator = Arc::clone(&self.coordinator);
        let context = Arc::clone(context);
        let key = format!("cell:{}", column);
        self.debouncer.debounce(&key, self.field_debounce, move || {
            tokio::spawn(async move {
                coordinator.emit(event).await;
                context.schedule_release();
            });
        });
    }

    /// Append a row built from header order, or a copy of the cursor line
    async fn add_row(
        &self,
        values: Option<std::collections::BTreeMap<String, String>>,
        copy_current_row: bool,
    ) {
        let document = self.surfaces.editor.document();
        let new_line = if copy_current_row {
            let cursor_index = self.surfaces.editor.selection().active.line;
            match document.line(cursor_index) {
                Some(line) => line,
                None => {
                    warn!(cursor_index, "cannot copy current row: line missing");
                    return;
                }
            }
        } else {
            let snapshot = self.snapshot();
            let values = values.unwrap_or_default();
            snapshot
                .headers
                .iter()
                .map(|header| values.get(header).cloned().unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\t")
        };

        match document.append_line(&new_line).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("host rejected the appended row");
                return;
            }
            Err(e) => {
                warn!(error = %e, "appending row failed");
                return;
            }
        }

        let snapshot = self.refresh_snapshot();
        goto_line(self.surfaces.editor.as_ref(), snapshot.line_count);
        self.surfaces
            .form
            .update_line_stats(snapshot.line_count, snapshot.line_count);
        debug!(line = snapshot.line_count, "row appended");
    }

    /// The header-row numeric field changed
    async fn header_row_changed(&self, row: usize) {
        let line_count = self.surfaces.editor.document().line_count();
        let header_row = clamp_row(row, line_count);
        self.header_row.store(header_row, Ordering::SeqCst);

        let snapshot = self.refresh_snapshot();
        // Deliberately no current-row push here: relabeling is enough and a
        // full re-render makes the form flicker.
        self.coordinator
            .emit(SyncEvent::new(
                EventOrigin::System,
                SyncEventKind::HeaderChange {
                    headers: snapshot.headers,
                    header_row,
                },
            ))
            .await;
    }

    /// The current-row numeric field changed
    async fn current_row_changed(&self, row: usize) {
        let context = &self.surfaces.context;
        let header_row = self.header_row.load(Ordering::SeqCst);

        self.coordinator
            .emit(SyncEvent::new(
                EventOrigin::Form,
                SyncEventKind::CurrentRowFieldChange {
                    header_row,
                    value: row,
                    from_sync: context.from_sync(),
                },
            ))
            .await;
        self.coordinator
            .emit(SyncEvent::new(
                EventOrigin::Form,
                SyncEventKind::CurrentRowFieldToCursor {
                    value: row,
                    from_sync: context.from_sync(),
                },
            ))
            .await;
    }

    /// Cancel pending timers and tear the engine down
    pub fn dispose(&self) {
        self.debouncer.clear_all();
        self.coordinator.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{BufferEditor, Document, Position, Selection};
    use crate::form::{FormCall, RecordingFormView};

    fn setup(text: &str) -> (Arc<BufferEditor>, Arc<RecordingFormView>, Orchestrator) {
        setup_with_config(text, SyncConfig::immediate())
    }

    fn setup_with_config(
        text: &str,
        config: SyncConfig,
    ) -> (Arc<BufferEditor>, Arc<RecordingFormView>, Orchestrator) {
        let editor = BufferEditor::new(text);
        let form = Arc::new(RecordingFormView::new());
        let orchestrator = Orchestrator::new(
            Arc::clone(&editor) as Arc<dyn Editor>,
            Arc::clone(&form) as Arc<dyn FormView>,
            &config,
        );
        (editor, form, orchestrator)
    }

    fn set_headers_calls(calls: &[FormCall]) -> Vec<&FormCall> {
        calls
            .iter()
            .filter(|c| matches!(c, FormCall::SetHeaders { .. }))
            .collect()
    }

    #[tokio::test]
    async fn test_reload_pushes_headers_and_stats() {
        let (_, form, orchestrator) = setup("Name\tAge\nalice\t30");
        orchestrator.reload().await;

        let calls = form.take_calls();
        assert!(calls.contains(&FormCall::SetHeaders {
            headers: vec!["Name".to_string(), "Age".to_string()],
        }));
        assert!(calls.contains(&FormCall::UpdateLineStats {
            total_lines: 2,
            current_line: 1,
        }));
    }

    #[tokio::test]
    async fn test_update_cell_writes_through_to_editor() {
        let (editor, _, orchestrator) = setup("Name\tAge\nalice\t30\nbob\t25");
        orchestrator.reload().await;

        orchestrator
            .handle_form_message(FormMessage::UpdateCell {
                line_number: 3,
                column: "Name".to_string(),
                value: "carol".to_string(),
                column_index: 0,
            })
            .await;

        assert_eq!(editor.line(2).unwrap(), "carol\t25");
    }

    #[tokio::test]
    async fn test_equal_regime_round_trip() {
        // Header row and active row coincide: the edit rewrites the header
        // line and relabels the form exactly once.
        let (editor, form, orchestrator) = setup("junk\nA\tB\nx\ty");
        orchestrator
            .handle_form_message(FormMessage::HeaderRowChanged { row: 2 })
            .await;
        assert_eq!(orchestrator.header_row(), 2);
        form.take_calls();

        orchestrator
            .handle_form_message(FormMessage::UpdateCell {
                line_number: 2,
                column: "A".to_string(),
                value: "Z".to_string(),
                column_index: 0,
            })
            .await;

        assert_eq!(editor.line(1).unwrap(), "Z\tB");
        let calls = form.take_calls();
        let relabels = set_headers_calls(&calls);
        assert_eq!(relabels.len(), 1);
        assert_eq!(
            relabels[0],
            &FormCall::SetHeaders {
                headers: vec!["Z".to_string(), "B".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_update_cell_after_header_relabel() {
        // An EQUAL-regime edit renames a column; the rename must land in the
        // stored snapshot (via the guard-suppressed change notification) so
        // a follow-up edit addressed to the new label still resolves.
        let mut config = SyncConfig::immediate();
        config.guard_hold_ms = 40;
        let (editor, form, orchestrator) = setup_with_config("junk\nA\tB\nx\ty", config);
        orchestrator
            .handle_form_message(FormMessage::HeaderRowChanged { row: 2 })
            .await;
        form.take_calls();

        orchestrator
            .handle_form_message(FormMessage::UpdateCell {
                line_number: 2,
                column: "A".to_string(),
                value: "Z".to_string(),
                column_index: 0,
            })
            .await;
        assert_eq!(editor.line(1).unwrap(), "Z\tB");

        // Host notification for our own write: no event, but the snapshot
        // must pick up the renamed header
        orchestrator.text_changed().await;
        assert_eq!(
            orchestrator.snapshot().headers,
            vec!["Z".to_string(), "B".to_string()]
        );

        tokio::time::sleep(Duration::from_millis(80)).await;
        orchestrator
            .handle_form_message(FormMessage::UpdateCell {
                line_number: 3,
                column: "Z".to_string(),
                value: "42".to_string(),
                column_index: 0,
            })
            .await;
        assert_eq!(editor.line(2).unwrap(), "42\ty");
    }

    #[tokio::test]
    async fn test_duplicate_labels_route_by_position() {
        let (editor, _, orchestrator) = setup("Amount\tAmount\n10\t20");
        orchestrator.reload().await;

        orchestrator
            .handle_form_message(FormMessage::UpdateCell {
                line_number: 2,
                column: "Amount".to_string(),
                value: "99".to_string(),
                column_index: 1,
            })
            .await;

        assert_eq!(editor.line(1).unwrap(), "10\t99");
    }

    #[tokio::test]
    async fn test_guard_covers_the_typing_window() {
        // The form-edit guard must be up from message receipt, not only
        // when the debounce fires: editor events inside the typing window
        // would otherwise re-render the form over in-progress input.
        let mut config = SyncConfig::immediate();
        config.field_debounce_ms = 40;
        let (editor, form, orchestrator) = setup_with_config("Name\nalice", config);
        orchestrator.reload().await;
        form.take_calls();

        orchestrator
            .handle_form_message(FormMessage::UpdateCell {
                line_number: 2,
                column: "Name".to_string(),
                value: "a".to_string(),
                column_index: 0,
            })
            .await;

        // Mid-window editor activity must not push a row into the form
        orchestrator.text_changed().await;
        orchestrator.cursor_moved().await;
        assert!(!form
            .calls()
            .iter()
            .any(|c| matches!(c, FormCall::SelectRow { .. })));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(editor.line(1).unwrap(), "a");
    }

    #[tokio::test]
    async fn test_no_feedback_loop() {
        let mut config = SyncConfig::immediate();
        config.guard_hold_ms = 40;
        let (editor, form, orchestrator) =
            setup_with_config("Name\tAge\nalice\t30\nbob\t25", config);
        orchestrator.reload().await;
        form.take_calls();

        orchestrator
            .handle_form_message(FormMessage::UpdateCell {
                line_number: 3,
                column: "Name".to_string(),
                value: "X".to_string(),
                column_index: 0,
            })
            .await;
        assert_eq!(editor.line(2).unwrap(), "X\t25");

        // The host's change notification for our own write arrives while
        // the guard is still up and must not re-enter the pipeline.
        orchestrator.text_changed().await;
        assert!(set_headers_calls(&form.calls()).is_empty());
        assert!(!form
            .calls()
            .iter()
            .any(|c| matches!(c, FormCall::SelectRow { .. })));

        // An independent cursor move after the guard clears propagates.
        tokio::time::sleep(Duration::from_millis(80)).await;
        editor.set_selection(Selection::cursor(Position::new(1, 0)));
        orchestrator.cursor_moved().await;
        assert!(form
            .take_calls()
            .iter()
            .any(|c| matches!(c, FormCall::SelectRow { line_number: 2, .. })));
    }

    #[tokio::test]
    async fn test_cursor_moved_pushes_row_and_field() {
        let (editor, form, orchestrator) = setup("Name\tAge\nalice\t30");
        orchestrator.reload().await;
        form.take_calls();

        editor.set_selection(Selection::cursor(Position::new(1, 0)));
        orchestrator.cursor_moved().await;

        let calls = form.take_calls();
        assert!(calls.iter().any(|c| matches!(
            c,
            FormCall::SelectRow { row_index: 1, line_number: 2, .. }
        )));
        assert!(calls.contains(&FormCall::UpdateCurrentRowField { line_number: 2 }));
    }

    #[tokio::test]
    async fn test_multi_line_selection_blanks_the_row() {
        let (editor, form, orchestrator) = setup("Name\nalice\nbob");
        orchestrator.reload().await;
        form.take_calls();

        editor.set_selection(Selection {
            start: Position::new(0, 0),
            end: Position::new(2, 0),
            active: Position::new(2, 0),
        });
        orchestrator.cursor_moved().await;

        let calls = form.take_calls();
        assert!(calls.contains(&FormCall::ClearForm));
        assert!(!calls.iter().any(|c| matches!(c, FormCall::SelectRow { .. })));
    }

    #[tokio::test]
    async fn test_header_row_changed_clamps() {
        let (_, form, orchestrator) = setup("A\nB\nC");
        orchestrator
            .handle_form_message(FormMessage::HeaderRowChanged { row: 99 })
            .await;

        assert_eq!(orchestrator.header_row(), 3);
        assert!(form.take_calls().contains(&FormCall::SetHeaders {
            headers: vec!["C".to_string()],
        }));
    }

    #[tokio::test]
    async fn test_current_row_changed_moves_cursor() {
        let (editor, _, orchestrator) = setup("a\nb\nc\nd");
        orchestrator
            .handle_form_message(FormMessage::CurrentRowChanged { row: 3 })
            .await;

        assert_eq!(editor.selection().active, Position::new(2, 0));
    }

    #[tokio::test]
    async fn test_current_row_changed_out_of_range_is_noop() {
        let (editor, _, orchestrator) = setup("a\nb");
        let before = editor.selection();
        orchestrator
            .handle_form_message(FormMessage::CurrentRowChanged { row: 9_999 })
            .await;

        assert_eq!(editor.selection(), before);
        assert_eq!(editor.text(), "a\nb");
    }

    #[tokio::test]
    async fn test_add_row_from_values() {
        let (editor, _, orchestrator) = setup("Name\tAge\nalice\t30");
        orchestrator.reload().await;

        let mut values = std::collections::BTreeMap::new();
        values.insert("Age".to_string(), "41".to_string());
        values.insert("Name".to_string(), "dan".to_string());
        orchestrator
            .handle_form_message(FormMessage::AddRow {
                values: Some(values),
                copy_current_row: false,
            })
            .await;

        assert_eq!(editor.line(2).unwrap(), "dan\t41");
        // Cursor followed the new row
        assert_eq!(editor.selection().active, Position::new(2, 0));
    }

    #[tokio::test]
    async fn test_add_row_copies_current_line() {
        let (editor, _, orchestrator) = setup("Name\nalice\nbob");
        orchestrator.reload().await;
        editor.set_selection(Selection::cursor(Position::new(1, 0)));

        orchestrator
            .handle_form_message(FormMessage::AddRow {
                values: None,
                copy_current_row: true,
            })
            .await;

        assert_eq!(editor.line(3).unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_debounced_update_cell_coalesces() {
        let mut config = SyncConfig::immediate();
        config.field_debounce_ms = 30;
        let (editor, _, orchestrator) = setup_with_config("Name\nalice", config);
        orchestrator.reload().await;

        for value in ["a", "ab", "abc"] {
            orchestrator
                .handle_form_message(FormMessage::UpdateCell {
                    line_number: 2,
                    column: "Name".to_string(),
                    value: value.to_string(),
                    column_index: 0,
                })
                .await;
        }

        // Nothing written until the window elapses, then only the last value
        assert_eq!(editor.line(1).unwrap(), "alice");
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(editor.line(1).unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_refresh_config_toggles_handlers() {
        let (_, form, orchestrator) = setup("Name\nalice");
        orchestrator.reload().await;
        form.take_calls();

        let mut config = SyncConfig::immediate();
        config.handlers.editor_to_form = false;
        orchestrator.refresh_config(&config);

        orchestrator.cursor_moved().await;
        let calls = form.take_calls();
        // EditorToForm is off; CursorToRowField still runs
        assert!(!calls.iter().any(|c| matches!(c, FormCall::SelectRow { .. })));
        assert!(calls
            .iter()
            .any(|c| matches!(c, FormCall::UpdateCurrentRowField { .. })));
    }

    #[tokio::test]
    async fn test_text_changed_relabels_on_new_column() {
        let (editor, form, orchestrator) = setup("Name\nalice");
        orchestrator.reload().await;
        form.take_calls();

        editor.replace_line(0, "Name\tAge").await.unwrap();
        editor.replace_line(1, "alice\t30").await.unwrap();
        orchestrator.text_changed().await;

        assert!(form.take_calls().contains(&FormCall::SetHeaders {
            headers: vec!["Name".to_string(), "Age".to_string()],
        }));
    }
}
