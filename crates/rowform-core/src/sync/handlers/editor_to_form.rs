//! Editor changes → form fields
//!
//! One handler covers all three row regimes, consulting the comparator per
//! event instead of splitting into per-regime implementations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::form::FormRow;
use crate::sync::error::SyncError;
use crate::sync::event::{SyncEvent, SyncEventKind};
use crate::sync::handler::{HandlerConfig, HandlerState, SyncHandler, SyncSurfaces};
use crate::table::{placeholder_label, split_line, RowRegime};

/// Fills the form from the active buffer line on every editor change
pub struct EditorToFormHandler {
    surfaces: SyncSurfaces,
    state: HandlerState,
}

impl EditorToFormHandler {
    pub const NAME: &'static str = "EditorToForm";

    pub fn new(surfaces: SyncSurfaces, config: HandlerConfig) -> Arc<Self> {
        Arc::new(Self {
            surfaces,
            state: HandlerState::new(config),
        })
    }
}

#[async_trait]
impl SyncHandler for EditorToFormHandler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enabled(&self) -> bool {
        self.state.enabled()
    }

    fn set_enabled(&self, enabled: bool) {
        self.state.set_enabled(enabled);
    }

    fn priority(&self) -> i32 {
        self.state.priority()
    }

    fn can_handle(&self, event: &SyncEvent) -> bool {
        matches!(event.kind, SyncEventKind::EditorChange { .. })
    }

    async fn handle(&self, event: &SyncEvent) -> Result<(), SyncError> {
        if !self.state.throttle_allows() {
            return Ok(());
        }
        let SyncEventKind::EditorChange {
            headers,
            header_row,
            active_row,
            editing_form,
            from_sync,
        } = &event.kind
        else {
            return Ok(());
        };

        // A form edit in progress or our own write must not be pushed back
        // into the form as if the user had typed it in the editor.
        if *editing_form || self.surfaces.context.editing_form() {
            debug!("skipping editor change: form edit in progress");
            return Ok(());
        }
        if *from_sync || self.surfaces.context.from_sync() {
            debug!("skipping editor change: originated from sync");
            return Ok(());
        }

        let document = self.surfaces.editor.document();
        let line_index = active_row.saturating_sub(1);
        let line_count = document.line_count();
        let Some(line) = document.line(line_index) else {
            warn!(active_row, line_count, "active row out of range, skipping");
            return Ok(());
        };

        let (cells, _) = split_line(&line);
        let mut row: FormRow = Vec::with_capacity(headers.len().max(cells.len()));
        for index in 0..headers.len().max(cells.len()) {
            let label = headers
                .get(index)
                .cloned()
                .unwrap_or_else(|| placeholder_label(index));
            let value = cells.get(index).map(|c| c.trim().to_string()).unwrap_or_default();
            row.push((label, value));
        }

        let regime = RowRegime::compare(*header_row, *active_row);
        let row_index = *active_row as i64 - *header_row as i64;
        self.surfaces.form.select_row(row, row_index, *active_row);
        debug!(active_row, header_row, ?regime, "form filled from editor line");
        Ok(())
    }
}
