use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::result::CallResult;

/// Creates a bounded result sink. A capacity of `0` is treated as `1`.
pub fn result_channel(capacity: usize) -> (ResultSender, ResultReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        ResultSender {
            inner: Arc::new(Mutex::new(Some(tx))),
        },
        ResultReceiver { rx },
    )
}

/// Producer half of the result sink.
///
/// Enqueueing never waits for the consumer: a full sink rejects the result. Closing is
/// one-shot and idempotent, every clone observes it.
#[derive(Debug, Clone)]
pub struct ResultSender {
    inner: Arc<Mutex<Option<mpsc::Sender<CallResult>>>>,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("full result channel")]
    Full(Box<CallResult>),

    #[error("closed result channel")]
    Closed(Box<CallResult>),
}

impl SendError {
    #[must_use]
    pub fn into_inner(self) -> CallResult {
        match self {
            Self::Full(result) | Self::Closed(result) => *result,
        }
    }
}

impl ResultSender {
    pub fn try_send(&self, result: CallResult) -> Result<(), SendError> {
        let inner = self.inner.lock();
        let Some(tx) = inner.as_ref() else {
            return Err(SendError::Closed(Box::new(result)));
        };

        tx.try_send(result).map_err(|err| match err {
            TrySendError::Full(result) => SendError::Full(Box::new(result)),
            TrySendError::Closed(result) => SendError::Closed(Box::new(result)),
        })
    }

    /// Closes the sink. Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        self.inner.lock().take().is_some()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_none()
    }

    /// Installs a fresh channel on a closed sink and returns its receiver.
    ///
    /// Returns `None` while the sink is still open.
    pub fn reopen(&self, capacity: usize) -> Option<ResultReceiver> {
        let mut inner = self.inner.lock();
        if inner.is_some() {
            return None;
        }

        let (tx, rx) = mpsc::channel(capacity.max(1));
        *inner = Some(tx);
        Some(ResultReceiver { rx })
    }
}

/// Consumer half of the result sink.
#[derive(Debug)]
pub struct ResultReceiver {
    rx: mpsc::Receiver<CallResult>,
}

impl ResultReceiver {
    /// Next result, or `None` once the sink is closed and drained.
    pub async fn recv(&mut self) -> Option<CallResult> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<CallResult> {
        self.rx.try_recv().ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.rx.max_capacity()
    }
}
