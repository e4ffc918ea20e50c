//! Current-row numeric field → editor cursor

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::editor::goto_line;
use crate::sync::error::SyncError;
use crate::sync::event::{SyncEvent, SyncEventKind};
use crate::sync::handler::{HandlerConfig, HandlerState, SyncHandler, SyncSurfaces};

/// Moves the cursor when the user types into the current-row field
pub struct RowFieldToCursorHandler {
    surfaces: SyncSurfaces,
    state: HandlerState,
}

impl RowFieldToCursorHandler {
    pub const NAME: &'static str = "RowFieldToCursor";

    pub fn new(surfaces: SyncSurfaces, config: HandlerConfig) -> Arc<Self> {
        Arc::new(Self {
            surfaces,
            state: HandlerState::new(config),
        })
    }
}

#[async_trait]
impl SyncHandler for RowFieldToCursorHandler {
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
        matches!(
            event.kind,
            SyncEventKind::CurrentRowFieldChange { .. }
                | SyncEventKind::CurrentRowFieldToCursor { .. }
        )
    }

    async fn handle(&self, event: &SyncEvent) -> Result<(), SyncError> {
        if !self.state.throttle_allows() {
            return Ok(());
        }
        let (value, from_sync) = match &event.kind {
            SyncEventKind::CurrentRowFieldChange { value, from_sync, .. } => (*value, *from_sync),
            SyncEventKind::CurrentRowFieldToCursor { value, from_sync } => (*value, *from_sync),
            _ => return Ok(()),
        };

        if from_sync {
            debug!("skipping cursor move: field updated by sync");
            return Ok(());
        }

        // Out-of-range values are logged inside and leave the selection
        // untouched.
        goto_line(self.surfaces.editor.as_ref(), value);
        Ok(())
    }
}
