//! Form edits on the header line → form column labels
//!
//! Only eligible in the `HeaderEqualsRow` regime: editing a form field while
//! positioned on the header row changes a column label, so the form must be
//! relabeled on top of the buffer write performed by
//! [`FormToEditorHandler`](super::FormToEditorHandler).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::sync::error::SyncError;
use crate::sync::event::{SyncEvent, SyncEventKind};
use crate::sync::handler::{HandlerConfig, HandlerState, SyncHandler, SyncSurfaces};
use crate::table::RowRegime;

/// Relabels the form after a header-line cell edit
pub struct FormToHeaderHandler {
    surfaces: SyncSurfaces,
    state: HandlerState,
}

impl FormToHeaderHandler {
    pub const NAME: &'static str = "FormToHeader";

    pub fn new(surfaces: SyncSurfaces, config: HandlerConfig) -> Arc<Self> {
        Arc::new(Self {
            surfaces,
            state: HandlerState::new(config),
        })
    }
}

#[async_trait]
impl SyncHandler for FormToHeaderHandler {
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
        match &event.kind {
            SyncEventKind::FormChange {
                header_row,
                active_row,
                ..
            } => RowRegime::compare(*header_row, *active_row) == RowRegime::HeaderEqualsRow,
            _ => false,
        }
    }

    async fn handle(&self, event: &SyncEvent) -> Result<(), SyncError> {
        if !self.state.throttle_allows() {
            return Ok(());
        }
        let SyncEventKind::FormChange {
            headers,
            column,
            column_index,
            value,
            editing_form,
            from_sync,
            ..
        } = &event.kind
        else {
            return Ok(());
        };

        if *editing_form || *from_sync {
            debug!("skipping header relabel: sync-derived form change");
            return Ok(());
        }

        // Field position is authoritative when it agrees with the label
        let column_index = if headers.get(*column_index).is_some_and(|h| h == column) {
            *column_index
        } else {
            match headers.iter().position(|h| h == column) {
                Some(found) => found,
                None => {
                    warn!(column, "header relabel names an unknown column, skipping");
                    return Ok(());
                }
            }
        };

        let mut updated = headers.clone();
        updated[column_index] = value.clone();
        self.surfaces.form.set_headers(&updated);
        debug!(column, value, "form relabeled after header-line edit");
        Ok(())
    }
}
