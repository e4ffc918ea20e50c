//! Header row changes → form column labels

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::sync::error::SyncError;
use crate::sync::event::{SyncEvent, SyncEventKind};
use crate::sync::handler::{HandlerConfig, HandlerState, SyncHandler, SyncSurfaces};

/// Pushes new column labels to the form whenever the header row changes
pub struct HeaderToFormHandler {
    surfaces: SyncSurfaces,
    state: HandlerState,
}

impl HeaderToFormHandler {
    pub const NAME: &'static str = "HeaderToForm";

    pub fn new(surfaces: SyncSurfaces, config: HandlerConfig) -> Arc<Self> {
        Arc::new(Self {
            surfaces,
            state: HandlerState::new(config),
        })
    }
}

#[async_trait]
impl SyncHandler for HeaderToFormHandler {
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
        matches!(event.kind, SyncEventKind::HeaderChange { .. })
    }

    async fn handle(&self, event: &SyncEvent) -> Result<(), SyncError> {
        if !self.state.throttle_allows() {
            return Ok(());
        }
        let SyncEventKind::HeaderChange { headers, header_row } = &event.kind else {
            return Ok(());
        };

        self.surfaces.form.set_headers(headers);
        debug!(header_row, columns = headers.len(), "form headers updated");
        Ok(())
    }
}
