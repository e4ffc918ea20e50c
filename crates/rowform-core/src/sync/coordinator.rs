//! Event queue and handler dispatch
//!
//! The coordinator owns the handler registry and an ordered event queue.
//! Events are processed strictly FIFO by a single-flight drain loop; for
//! each event, every enabled handler that accepts it runs in descending
//! priority order. A handler failure is logged and skipped without
//! aborting its siblings or the queue.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::event::SyncEvent;
use super::handler::SyncHandler;

/// Default interval of the stranded-event poll timer
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Serializes event processing across all handlers
pub struct SyncCoordinator {
    handlers: Mutex<Vec<Arc<dyn SyncHandler>>>,
    queue: Mutex<VecDeque<SyncEvent>>,
    is_processing: AtomicBool,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncCoordinator {
    /// Create a coordinator and start its poll timer
    ///
    /// The timer is a safety net only: it re-pokes the drain loop in case
    /// an emit raced with a still-draining loop and left items stranded.
    /// Correctness never depends on its granularity. It holds a weak
    /// reference, so dropping the coordinator stops it.
    pub fn new(poll_interval: Duration) -> Arc<Self> {
        let coordinator = Arc::new(Self {
            handlers: Mutex::new(Vec::new()),
            queue: Mutex::new(VecDeque::new()),
            is_processing: AtomicBool::new(false),
            poll_task: Mutex::new(None),
        });

        let weak: Weak<SyncCoordinator> = Arc::downgrade(&coordinator);
        let poll = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(coordinator) = weak.upgrade() else {
                    break;
                };
                if !coordinator.queue.lock().unwrap().is_empty() {
                    coordinator.drain().await;
                }
            }
        });
        *coordinator.poll_task.lock().unwrap() = Some(poll);

        coordinator
    }

    /// Register a handler; a same-named handler is replaced in place
    pub fn register_handler(&self, handler: Arc<dyn SyncHandler>) {
        let mut handlers = self.handlers.lock().unwrap();
        if let Some(existing) = handlers.iter_mut().find(|h| h.name() == handler.name()) {
            warn!(name = handler.name(), "handler already registered, replacing");
            existing.dispose();
            *existing = handler;
            return;
        }
        debug!(name = handler.name(), "handler registered");
        handlers.push(handler);
    }

    /// Unregister and dispose a handler by name
    pub fn unregister_handler(&self, name: &str) {
        let mut handlers = self.handlers.lock().unwrap();
        if let Some(index) = handlers.iter().position(|h| h.name() == name) {
            let handler = handlers.remove(index);
            handler.dispose();
            debug!(name, "handler unregistered");
        }
    }

    /// Look up a handler by name
    pub fn handler(&self, name: &str) -> Option<Arc<dyn SyncHandler>> {
        self.handlers
            .lock()
            .unwrap()
            .iter()
            .find(|h| h.name() == name)
            .cloned()
    }

    /// All registered handlers in registration order
    pub fn handlers(&self) -> Vec<Arc<dyn SyncHandler>> {
        self.handlers.lock().unwrap().clone()
    }

    /// Enqueue an event and drain the queue unless a drain is running
    pub async fn emit(&self, event: SyncEvent) {
        debug!(event = event.kind.name(), "event received");
        self.queue.lock().unwrap().push_back(event);
        self.drain().await;
    }

    /// Number of events waiting in the queue
    pub fn queued(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Single-flight drain loop
    ///
    /// Only one drain runs at a time; a second caller returns immediately
    /// and its event is picked up by the running loop or by the poll timer.
    async fn drain(&self) {
        loop {
            if self
                .is_processing
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return;
            }

            loop {
                let event = self.queue.lock().unwrap().pop_front();
                let Some(event) = event else {
                    break;
                };
                self.process(&event).await;
            }

            self.is_processing.store(false, Ordering::SeqCst);

            // An emit may have landed between the final pop and the store;
            // re-enter instead of waiting for the poll timer.
            if self.queue.lock().unwrap().is_empty() {
                return;
            }
        }
    }

    /// Run every eligible handler for one event, priority-ordered
    async fn process(&self, event: &SyncEvent) {
        let mut eligible: Vec<Arc<dyn SyncHandler>> = {
            let handlers = self.handlers.lock().unwrap();
            handlers
                .iter()
                .filter(|h| h.enabled() && h.can_handle(event))
                .cloned()
                .collect()
        };
        // Stable sort keeps registration order within a priority tier
        eligible.sort_by_key(|h| std::cmp::Reverse(h.priority()));

        debug!(
            event = event.kind.name(),
            handlers = eligible.len(),
            "dispatching event"
        );

        for handler in eligible {
            if let Err(e) = handler.handle(event).await {
                error!(
                    handler = handler.name(),
                    event = event.kind.name(),
                    error = %e,
                    "handler failed, continuing with remaining handlers"
                );
            }
        }
    }

    /// Dispose every handler, stop the poll timer, and clear the queue
    pub fn dispose(&self) {
        if let Some(poll) = self.poll_task.lock().unwrap().take() {
            poll.abort();
        }
        let mut handlers = self.handlers.lock().unwrap();
        for handler in handlers.iter() {
            handler.dispose();
        }
        handlers.clear();
        self.queue.lock().unwrap().clear();
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        if let Some(poll) = self.poll_task.lock().unwrap().take() {
            poll.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::error::SyncError;
    use crate::sync::event::{EventOrigin, SyncEventKind};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct RecordingHandler {
        name: &'static str,
        priority: i32,
        enabled: AtomicBool,
        fail: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
        calls: AtomicUsize,
    }

    impl RecordingHandler {
        fn new(name: &'static str, priority: i32, log: Arc<Mutex<Vec<&'static str>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                priority,
                enabled: AtomicBool::new(true),
                fail: false,
                log,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(
            name: &'static str,
            priority: i32,
            log: Arc<Mutex<Vec<&'static str>>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                name,
                priority,
                enabled: AtomicBool::new(true),
                fail: true,
                log,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SyncHandler for RecordingHandler {
        fn name(&self) -> &'static str {
            self.name
        }
        fn enabled(&self) -> bool {
            self.enabled.load(Ordering::SeqCst)
        }
        fn set_enabled(&self, enabled: bool) {
            self.enabled.store(enabled, Ordering::SeqCst);
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn can_handle(&self, event: &SyncEvent) -> bool {
            matches!(event.kind, SyncEventKind::HeaderChange { .. })
        }
        async fn handle(&self, _event: &SyncEvent) -> Result<(), SyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.log.lock().unwrap().push(self.name);
            if self.fail {
                return Err(SyncError::ColumnNotFound {
                    column: "missing".to_string(),
                });
            }
            Ok(())
        }
    }

    fn header_event() -> SyncEvent {
        SyncEvent::new(
            EventOrigin::System,
            SyncEventKind::HeaderChange {
                headers: vec!["A".to_string()],
                header_row: 1,
            },
        )
    }

    #[tokio::test]
    async fn test_priority_order_descending() {
        let coordinator = SyncCoordinator::new(DEFAULT_POLL_INTERVAL);
        let log = Arc::new(Mutex::new(Vec::new()));

        coordinator.register_handler(RecordingHandler::new("low", 1, Arc::clone(&log)));
        coordinator.register_handler(RecordingHandler::new("high", 20, Arc::clone(&log)));
        coordinator.register_handler(RecordingHandler::new("mid", 10, Arc::clone(&log)));

        coordinator.emit(header_event()).await;

        assert_eq!(*log.lock().unwrap(), vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn test_tie_broken_by_registration_order() {
        let coordinator = SyncCoordinator::new(DEFAULT_POLL_INTERVAL);
        let log = Arc::new(Mutex::new(Vec::new()));

        coordinator.register_handler(RecordingHandler::new("first", 10, Arc::clone(&log)));
        coordinator.register_handler(RecordingHandler::new("second", 10, Arc::clone(&log)));

        coordinator.emit(header_event()).await;

        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_handler_failure_does_not_abort_siblings() {
        let coordinator = SyncCoordinator::new(DEFAULT_POLL_INTERVAL);
        let log = Arc::new(Mutex::new(Vec::new()));

        coordinator.register_handler(RecordingHandler::failing("bad", 20, Arc::clone(&log)));
        coordinator.register_handler(RecordingHandler::new("good", 10, Arc::clone(&log)));

        coordinator.emit(header_event()).await;
        coordinator.emit(header_event()).await;

        // Both events processed in full despite the failure
        assert_eq!(*log.lock().unwrap(), vec!["bad", "good", "bad", "good"]);
    }

    #[tokio::test]
    async fn test_disabled_handler_skipped() {
        let coordinator = SyncCoordinator::new(DEFAULT_POLL_INTERVAL);
        let log = Arc::new(Mutex::new(Vec::new()));

        let handler = RecordingHandler::new("toggled", 10, Arc::clone(&log));
        coordinator.register_handler(Arc::clone(&handler) as Arc<dyn SyncHandler>);

        handler.set_enabled(false);
        coordinator.emit(header_event()).await;
        assert!(log.lock().unwrap().is_empty());

        handler.set_enabled(true);
        coordinator.emit(header_event()).await;
        assert_eq!(*log.lock().unwrap(), vec!["toggled"]);
    }

    #[tokio::test]
    async fn test_same_name_replaces_in_place() {
        let coordinator = SyncCoordinator::new(DEFAULT_POLL_INTERVAL);
        let log = Arc::new(Mutex::new(Vec::new()));

        coordinator.register_handler(RecordingHandler::new("dup", 10, Arc::clone(&log)));
        coordinator.register_handler(RecordingHandler::new("other", 10, Arc::clone(&log)));
        let replacement = RecordingHandler::new("dup", 10, Arc::clone(&log));
        coordinator.register_handler(Arc::clone(&replacement) as Arc<dyn SyncHandler>);

        assert_eq!(coordinator.handlers().len(), 2);

        coordinator.emit(header_event()).await;
        // Replacement keeps the original registration slot
        assert_eq!(*log.lock().unwrap(), vec!["dup", "other"]);
        assert_eq!(replacement.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispose_clears_queue_and_registry() {
        let coordinator = SyncCoordinator::new(DEFAULT_POLL_INTERVAL);
        let log = Arc::new(Mutex::new(Vec::new()));
        coordinator.register_handler(RecordingHandler::new("h", 10, log));

        coordinator.queue.lock().unwrap().push_back(header_event());
        coordinator.dispose();

        assert_eq!(coordinator.queued(), 0);
        assert!(coordinator.handlers().is_empty());
    }

    #[tokio::test]
    async fn test_unregister_removes_handler() {
        let coordinator = SyncCoordinator::new(DEFAULT_POLL_INTERVAL);
        let log = Arc::new(Mutex::new(Vec::new()));
        coordinator.register_handler(RecordingHandler::new("h", 10, Arc::clone(&log)));

        coordinator.unregister_handler("h");
        assert!(coordinator.handler("h").is_none());

        coordinator.emit(header_event()).await;
        assert!(log.lock().unwrap().is_empty());
    }
}
