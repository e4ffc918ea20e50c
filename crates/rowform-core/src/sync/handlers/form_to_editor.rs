//! Form field edits → buffer lines
//!
//! Writes the one changed cell back into the target line. In the
//! `HeaderEqualsRow` regime the target is the header line itself; relabeling
//! the form afterwards is [`FormToHeaderHandler`]'s job, which runs later in
//! the same event because this handler carries the higher priority.
//!
//! [`FormToHeaderHandler`]: super::FormToHeaderHandler

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::sync::error::SyncError;
use crate::sync::event::{SyncEvent, SyncEventKind};
use crate::sync::handler::{HandlerConfig, HandlerState, SyncHandler, SyncSurfaces};
use crate::table::{set_cell, RowRegime};

/// Applies a single-cell replace edit to the document for a form change
pub struct FormToEditorHandler {
    surfaces: SyncSurfaces,
    state: HandlerState,
}

impl FormToEditorHandler {
    pub const NAME: &'static str = "FormToEditor";

    /// Runs before [`FormToHeaderHandler`](super::FormToHeaderHandler) so
    /// the relabel observes the applied edit
    pub const PRIORITY: i32 = 20;

    pub fn new(surfaces: SyncSurfaces, config: HandlerConfig) -> Arc<Self> {
        Arc::new(Self {
            surfaces,
            state: HandlerState::new(config),
        })
    }
}

#[async_trait]
impl SyncHandler for FormToEditorHandler {
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
        matches!(event.kind, SyncEventKind::FormChange { .. })
    }

    // No throttle and no guard check here: the orchestrator's per-field
    // debounce already coalesces bursts, and a FormChange is by definition
    // the user's own edit.
    async fn handle(&self, event: &SyncEvent) -> Result<(), SyncError> {
        let SyncEventKind::FormChange {
            headers,
            header_row,
            active_row,
            column,
            column_index,
            value,
            ..
        } = &event.kind
        else {
            return Ok(());
        };

        let regime = RowRegime::compare(*header_row, *active_row);
        let line_index = match regime {
            RowRegime::HeaderEqualsRow => header_row.saturating_sub(1),
            _ => active_row.saturating_sub(1),
        };

        let document = self.surfaces.editor.document();
        let line_count = document.line_count();
        let Some(line) = document.line(line_index) else {
            warn!(
                line = line_index + 1,
                line_count, "form change targets a line out of range, skipping"
            );
            return Ok(());
        };

        // The field position is authoritative when it agrees with the label;
        // repeated labels make a name lookup land on the first match.
        let column_index = if headers.get(*column_index).is_some_and(|h| h == column) {
            *column_index
        } else {
            match headers.iter().position(|h| h == column) {
                Some(found) => found,
                None => {
                    warn!(column, "form change names an unknown column, skipping");
                    return Ok(());
                }
            }
        };

        let new_line = set_cell(&line, column_index, value);

        // Guard the write so the host's change notification is not
        // re-emitted as a fresh editor event.
        self.surfaces.context.begin_sync_write();
        let applied = document.replace_line(line_index, &new_line).await;
        self.surfaces.context.schedule_release();

        match applied? {
            true => {
                debug!(
                    line = line_index + 1,
                    column, ?regime, "cell written to editor"
                );
            }
            false => {
                warn!(line = line_index + 1, "host rejected the cell edit");
            }
        }
        Ok(())
    }
}
