//! Backend readiness signal.
//!
//! A `watch` channel carries the ready flag. Entry points that need the backend await
//! [`Readiness::wait_ready`] with a ceiling; dropping that future is the only way to cancel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::MatchError;

/// Default wait ceiling at connection-dependent entry points.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone)]
pub struct Readiness {
    tx: Arc<watch::Sender<bool>>,
}

impl Readiness {
    pub fn new(ready: bool) -> Self {
        let (tx, _rx) = watch::channel(ready);
        Self { tx: Arc::new(tx) }
    }

    pub fn set_ready(&self) {
        self.tx.send_replace(true);
        tracing::info!("match backend ready");
    }

    pub fn set_not_ready(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// Fail fast without waiting.
    pub fn check(&self) -> Result<(), MatchError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(MatchError::BackendNotReady(Duration::ZERO))
        }
    }

    /// Resolve once ready, or fail with `BackendNotReady` after `timeout`.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<(), MatchError> {
        let mut rx = self.tx.subscribe();
        // Release the `watch::Ref` before `rx` goes out of scope.
        let waited = tokio::time::timeout(timeout, rx.wait_for(|ready| *ready))
            .await
            .map(|r| r.map(|_| ()));
        match waited {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) | Err(_) => {
                tracing::warn!(?timeout, "match backend not ready");
                Err(MatchError::BackendNotReady(timeout))
            }
        }
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new(false)
    }
}
