//! Run-wide cancellation token

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Shared, monotonic cancellation flag.
///
/// Clones observe the same flag. Once signaled it stays signaled; there is no
/// way to reset it, so a fresh token is created for every run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    signaled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag and wake every waiter.
    ///
    /// Returns `true` for the call that actually set it.
    pub fn signal(&self) -> bool {
        let first = !self.inner.signaled.swap(true, Ordering::SeqCst);
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    pub fn is_signaled(&self) -> bool {
        self.inner.signaled.load(Ordering::SeqCst)
    }

    /// Resolve once the token is signaled
    pub async fn signaled(&self) {
        loop {
            // register before checking so a signal in between is not lost
            let notified = self.inner.notify.notified();
            if self.is_signaled() {
                return;
            }
            notified.await;
        }
    }
}
