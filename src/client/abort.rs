//! Cancellation for outbound requests.
//!
//! An `AbortSignal` combines a caller-triggered abort with a fixed deadline. The deadline starts
//! when the signal is created, so one signal shared by several requests bounds all of them.

use crate::client::RequestError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Aborts every signal it handed out.
#[derive(Debug)]
pub struct AbortController {
    tx: watch::Sender<bool>,
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// A signal that fires when `abort` is called or `timeout` elapses, whichever comes first.
    pub fn signal(&self, timeout: Duration) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
            deadline: Instant::now() + timeout,
        }
    }

    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
    deadline: Instant,
}

impl AbortSignal {
    /// A signal that only times out.
    pub fn timeout(timeout: Duration) -> Self {
        AbortController::new().signal(timeout)
    }

    /// True once the owning controller aborted. Timing out does not count.
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Runs `request` unless the signal fires first.
    pub async fn run<F, T>(&self, request: F) -> Result<T, RequestError>
    where
        F: Future<Output = Result<T, RequestError>>,
    {
        let mut rx = self.rx.clone();
        let aborted = async move {
            // a dropped controller can no longer abort
            if rx.wait_for(|aborted| *aborted).await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        tokio::select! {
            biased;
            _ = aborted => Err(RequestError::Aborted),
            _ = tokio::time::sleep_until(self.deadline) => Err(RequestError::TimedOut),
            result = request => result,
        }
    }
}
