// src/cancel.rs

//! Cooperative cancellation for a whole orchestration run.
//!
//! A [`CancelHandle`] is held by the caller; [`CancelSignal`] clones are
//! carried by the orchestrator, the limiter, and every runner. Cancellation
//! is level-triggered: once fired it stays fired, and `cancelled().await`
//! resolves immediately for late observers, so a cancel racing a natural
//! completion cannot deadlock anyone.

use std::sync::Arc;

use tokio::sync::watch;

/// Caller-side handle that can cancel a run.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Create a connected handle/signal pair.
    pub fn new() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (
            CancelHandle { tx },
            CancelSignal {
                rx,
                _keepalive: None,
            },
        )
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Observer side of a cancellation request. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
    /// Keeps the sender alive for `never()` signals so the channel never
    /// closes out from under `cancelled()`.
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl CancelSignal {
    /// A signal that never fires, for runs without caller cancellation.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _keepalive: Some(Arc::new(tx)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation has been requested.
    ///
    /// If the handle is dropped without cancelling, this pends forever.
    pub async fn cancelled(&mut self) {
        if *self.rx.borrow() {
            return;
        }
        loop {
            if self.rx.changed().await.is_err() {
                // Handle dropped without cancelling: this run can no longer
                // be cancelled, so park forever.
                std::future::pending::<()>().await;
            }
            if *self.rx.borrow() {
                return;
            }
        }
    }
}
