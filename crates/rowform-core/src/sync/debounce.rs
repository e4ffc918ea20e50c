//! Keyed debounce timers
//!
//! Coalesces bursts of calls under the same key into a single trailing
//! invocation. Each form field and each handler uses its own key, so
//! unrelated work never blocks another key's window.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Per-key trailing-edge debouncer
///
/// A superseded timer is aborted and additionally carries a generation tag,
/// so a timer that was already past its sleep when superseded still cannot
/// fire or remove its successor's entry.
#[derive(Default)]
pub struct DebounceGate {
    timers: Mutex<HashMap<String, PendingTimer>>,
    next_generation: AtomicU64,
}

impl DebounceGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Schedule `action` to run after `delay`, superseding any pending
    /// timer for `key`
    pub fn debounce<F>(self: &Arc<Self>, key: &str, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let gate = Arc::clone(self);
        let task_key = key.to_string();

        // The entry must be in place before the timer can wake, so the lock
        // is held across spawn + insert.
        let mut timers = self.timers.lock().unwrap();
        if let Some(old) = timers.remove(key) {
            trace!(key, "debounce timer superseded");
            old.handle.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut timers = gate.timers.lock().unwrap();
                match timers.get(&task_key) {
                    Some(pending) if pending.generation == generation => {
                        timers.remove(&task_key);
                    }
                    // Superseded while sleeping
                    _ => return,
                }
            }
            action();
        });

        timers.insert(key.to_string(), PendingTimer { generation, handle });
    }

    /// Cancel the pending timer for `key` without firing it
    pub fn clear(&self, key: &str) {
        if let Some(pending) = self.timers.lock().unwrap().remove(key) {
            pending.handle.abort();
        }
    }

    /// Cancel every pending timer
    pub fn clear_all(&self) {
        let mut timers = self.timers.lock().unwrap();
        for (_, pending) in timers.drain() {
            pending.handle.abort();
        }
    }

    /// Number of timers currently pending
    pub fn pending(&self) -> usize {
        self.timers.lock().unwrap().len()
    }
}
