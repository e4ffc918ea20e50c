//! Sync handler contract
//!
//! A handler is a named, independently toggleable unit that declares the
//! events it accepts and performs one direction of reconciliation. Handlers
//! share the editor, the form view, and the loop-guard context through
//! [`SyncSurfaces`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::context::SyncContext;
use super::error::SyncError;
use super::event::SyncEvent;
use crate::editor::Editor;
use crate::form::FormView;

/// Per-handler configuration
#[derive(Debug, Clone, Copy)]
pub struct HandlerConfig {
    pub enabled: bool,
    /// Handlers run in descending priority for each event
    pub priority: i32,
    /// Throttle window; 0 disables throttling
    pub debounce_ms: u64,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 10,
            debounce_ms: 50,
        }
    }
}

/// The two views and the guard flags every handler works against
#[derive(Clone)]
pub struct SyncSurfaces {
    pub editor: Arc<dyn Editor>,
    pub form: Arc<dyn FormView>,
    pub context: Arc<SyncContext>,
}

/// One direction of synchronization
#[async_trait]
pub trait SyncHandler: Send + Sync {
    /// Identity for registration and configuration
    fn name(&self) -> &'static str;

    fn enabled(&self) -> bool;
    fn set_enabled(&self, enabled: bool);
    fn priority(&self) -> i32;

    /// Whether this handler accepts the event at all
    fn can_handle(&self, event: &SyncEvent) -> bool;

    /// Perform the reconciliation
    async fn handle(&self, event: &SyncEvent) -> Result<(), SyncError>;

    /// Release timers or other resources on unregistration
    fn dispose(&self) {}
}

/// Mutable state shared by all handler implementations
pub struct HandlerState {
    enabled: AtomicBool,
    priority: i32,
    throttle_window: Duration,
    last_event: Mutex<Option<Instant>>,
}

impl HandlerState {
    pub fn new(config: HandlerConfig) -> Self {
        Self {
            enabled: AtomicBool::new(config.enabled),
            priority: config.priority,
            throttle_window: Duration::from_millis(config.debounce_ms),
            last_event: Mutex::new(None),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Leading-edge throttle: true when enough quiet time has passed since
    /// the last accepted event (always true for a zero window)
    pub fn throttle_allows(&self) -> bool {
        if self.throttle_window.is_zero() {
            return true;
        }
        let mut last = self.last_event.lock().unwrap();
        let now = Instant::now();
        if let Some(previous) = *last {
            if now.duration_since(previous) < self.throttle_window {
                return false;
            }
        }
        *last = Some(now);
        true
    }
}
