//! Completion signal and consumer acknowledgment counter

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// One-shot "stream finished" signal
///
/// Cloning shares the signal. Only the first [`fire`](Self::fire) has an effect, so
/// teardown paths that race each other cannot double-close it.
#[derive(Clone, Debug, Default)]
pub struct DoneSignal {
    inner: Arc<DoneInner>,
}

#[derive(Debug, Default)]
struct DoneInner {
    fired: AtomicBool,
    token: CancellationToken,
}

impl DoneSignal {
    /// Fresh, unfired signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal; returns `true` only for the call that actually fired it
    pub fn fire(&self) -> bool {
        if self.inner.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.inner.token.cancel();
        true
    }

    /// True once fired
    pub fn is_fired(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    /// Wait until fired; returns immediately if already fired
    pub async fn wait(&self) {
        self.inner.token.cancelled().await;
    }
}

/// Counts records handed to the consumer against acknowledgments received
///
/// When gating is enabled, teardown waits until every emitted record has been
/// acknowledged so the consumer can finish processing before `done` fires.
#[derive(Debug)]
pub struct AckGate {
    enabled: bool,
    emitted: AtomicU64,
    acked: AtomicU64,
    notify: Notify,
}

impl AckGate {
    /// New gate; with `enabled == false` waits return at once
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            emitted: AtomicU64::new(0),
            acked: AtomicU64::new(0),
            notify: Notify::new(),
        }
    }

    /// Whether teardown waits for acknowledgments
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Count one record delivered to the consumer
    pub fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::AcqRel);
        self.notify.notify_waiters();
    }

    /// Count one acknowledgment from the consumer
    pub fn ack(&self) {
        self.acked.fetch_add(1, Ordering::AcqRel);
        self.notify.notify_waiters();
    }

    /// Records delivered so far
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Acquire)
    }

    /// Acknowledgments received so far
    pub fn acked(&self) -> u64 {
        self.acked.load(Ordering::Acquire)
    }

    /// Wait until `acked >= emitted`
    ///
    /// Returns `false` if `cancel` fired first.
    pub async fn wait_until_acked(&self, cancel: &CancellationToken) -> bool {
        if !self.enabled {
            return true;
        }
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so an ack between the check and the await is seen
            notified.as_mut().enable();

            if self.acked() >= self.emitted() {
                return true;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return false,
                _ = &mut notified => {}
            }
        }
    }
}
