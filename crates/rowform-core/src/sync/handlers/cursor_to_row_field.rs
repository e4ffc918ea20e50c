//! Cursor line changes → current-row numeric field
//!
//! Updates only the numeric field. The row contents were already pushed by
//! [`EditorToFormHandler`](super::EditorToFormHandler) for the same
//! movement, so a full re-render here would make the form flicker.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::sync::error::SyncError;
use crate::sync::event::{SyncEvent, SyncEventKind};
use crate::sync::handler::{HandlerConfig, HandlerState, SyncHandler, SyncSurfaces};

/// Keeps the current-row field in step with the cursor
pub struct CursorToRowFieldHandler {
    surfaces: SyncSurfaces,
    state: HandlerState,
}

impl CursorToRowFieldHandler {
    pub const NAME: &'static str = "CursorToRowField";

    pub fn new(surfaces: SyncSurfaces, config: HandlerConfig) -> Arc<Self> {
        Arc::new(Self {
            surfaces,
            state: HandlerState::new(config),
        })
    }
}

#[async_trait]
impl SyncHandler for CursorToRowFieldHandler {
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
        matches!(event.kind, SyncEventKind::CursorRowChange { .. })
    }

    async fn handle(&self, event: &SyncEvent) -> Result<(), SyncError> {
        if !self.state.throttle_allows() {
            return Ok(());
        }
        let SyncEventKind::CursorRowChange { active_row, .. } = &event.kind else {
            return Ok(());
        };

        self.surfaces.form.update_current_row_field(*active_row);
        debug!(active_row, "current-row field updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::BufferEditor;
    use crate::form::{FormCall, RecordingFormView};
    use crate::sync::context::SyncContext;
    use crate::sync::event::EventOrigin;
    use std::time::Duration;

    #[tokio::test]
    async fn test_updates_only_the_numeric_field() {
        let form = Arc::new(RecordingFormView::new());
        let surfaces = SyncSurfaces {
            editor: BufferEditor::new("a\nb\nc"),
            form: Arc::clone(&form) as Arc<dyn crate::form::FormView>,
            context: SyncContext::new(Duration::from_millis(10)),
        };
        let handler = CursorToRowFieldHandler::new(
            surfaces,
            HandlerConfig {
                debounce_ms: 0,
                ..HandlerConfig::default()
            },
        );

        let event = SyncEvent::new(
            EventOrigin::Editor,
            SyncEventKind::CursorRowChange {
                active_row: 3,
                editing_form: false,
            },
        );
        assert!(handler.can_handle(&event));
        handler.handle(&event).await.unwrap();

        // No SelectRow, no SetHeaders; just the field
        assert_eq!(
            form.take_calls(),
            vec![FormCall::UpdateCurrentRowField { line_number: 3 }]
        );
    }
}
