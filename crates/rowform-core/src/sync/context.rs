//! Loop-guard flags
//!
//! Shared state preventing a synchronized write from being reinterpreted as
//! a new user edit. Only the writer that causes the cross-view effect sets
//! its flag; release happens on a trailing timer so the guard outlasts the
//! host's own change-notification latency.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

/// Shared loop-guard state
///
/// `editing_form` is true while a form field is mid-edit; editor-originated
/// reconciliation skips while it is set so in-progress typing is not
/// clobbered. `from_sync` is true for the short window during which the
/// engine itself is applying a write, so the change observer does not
/// re-emit a derivative event.
pub struct SyncContext {
    editing_form: AtomicBool,
    from_sync: AtomicBool,
    /// Invalidates stale scheduled releases
    epoch: AtomicU64,
    hold: Duration,
}

impl SyncContext {
    /// `hold` is the trailing delay before a release clears the flags
    pub fn new(hold: Duration) -> Arc<Self> {
        Arc::new(Self {
            editing_form: AtomicBool::new(false),
            from_sync: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            hold,
        })
    }

    pub fn editing_form(&self) -> bool {
        self.editing_form.load(Ordering::SeqCst)
    }

    pub fn from_sync(&self) -> bool {
        self.from_sync.load(Ordering::SeqCst)
    }

    /// Mark a form edit in progress
    pub fn begin_form_edit(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.editing_form.store(true, Ordering::SeqCst);
    }

    /// Mark an engine-originated write in progress
    pub fn begin_sync_write(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.from_sync.store(true, Ordering::SeqCst);
    }

    /// Clear both flags immediately
    pub fn release_now(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.editing_form.store(false, Ordering::SeqCst);
        self.from_sync.store(false, Ordering::SeqCst);
    }

    /// Schedule a trailing release of both flags
    ///
    /// A release scheduled before a newer `begin_*` call is a no-op: each
    /// set bumps the epoch and the release only fires for its own epoch, so
    /// overlapping writes keep the guard up until the last one's hold
    /// expires.
    pub fn schedule_release(self: &Arc<Self>) {
        let scheduled_epoch = self.epoch.load(Ordering::SeqCst);
        let ctx = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(ctx.hold).await;
            if ctx.epoch.load(Ordering::SeqCst) != scheduled_epoch {
                trace!("guard release superseded, skipping");
                return;
            }
            ctx.editing_form.store(false, Ordering::SeqCst);
            ctx.from_sync.store(false, Ordering::SeqCst);
            trace!("loop guards released");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_guards_release_after_hold() {
        let ctx = SyncContext::new(Duration::from_millis(20));
        ctx.begin_sync_write();
        ctx.begin_form_edit();
        ctx.schedule_release();

        assert!(ctx.from_sync());
        assert!(ctx.editing_form());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!ctx.from_sync());
        assert!(!ctx.editing_form());
    }

    #[tokio::test]
    async fn test_newer_write_outlives_stale_release() {
        let ctx = SyncContext::new(Duration::from_millis(30));
        ctx.begin_sync_write();
        ctx.schedule_release();

        // A second write lands inside the first hold window
        tokio::time::sleep(Duration::from_millis(10)).await;
        ctx.begin_sync_write();

        // The first release fires but must not clear the newer guard
        tokio::time::sleep(Duration::from_millis(35)).await;
        assert!(ctx.from_sync());

        ctx.schedule_release();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!ctx.from_sync());
    }

    #[tokio::test]
    async fn test_release_now() {
        let ctx = SyncContext::new(Duration::from_millis(500));
        ctx.begin_form_edit();
        ctx.release_now();
        assert!(!ctx.editing_form());
    }
}
