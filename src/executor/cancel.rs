//! Run cancellation
//!
//! A [`CancelHandle`] is held by whoever may abort the run (the Ctrl-C
//! listener); every [`CancelSignal`] clone observes it. The sequencer polls
//! the signal between steps and the command runner races it against the
//! running child process.

use std::sync::Arc;
use tokio::sync::watch;

/// Creates a connected handle/signal pair
#[must_use]
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx })
}

/// Triggers cancellation of a run
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes cancellation of a run
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires
    #[must_use]
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    /// Returns true once cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes when cancellation is requested; pends forever otherwise
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender gone without cancelling: nothing can fire anymore.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::never()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_never_is_not_cancelled() {
        assert!(!CancelSignal::never().is_cancelled());
    }

    #[test]
    fn test_cancel_is_observed_by_clones() {
        let (handle, signal) = cancel_pair();
        let other = signal.clone();
        assert!(!signal.is_cancelled());

        handle.cancel();
        assert!(signal.is_cancelled());
        assert!(other.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_future_completes() {
        let (handle, signal) = cancel_pair();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        });

        tokio::time::timeout(Duration::from_secs(2), signal.cancelled())
            .await
            .expect("cancellation should be observed");
    }

    #[tokio::test]
    async fn test_never_pends() {
        let signal = CancelSignal::never();
        let result = tokio::time::timeout(Duration::from_millis(30), signal.cancelled()).await;
        assert!(result.is_err());
    }
}
