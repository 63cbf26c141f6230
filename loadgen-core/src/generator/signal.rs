use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// One-shot flag that tasks can wait on.
#[derive(Debug, Default)]
pub(crate) struct Signal {
    fired: AtomicBool,
    notify: Notify,
}

impl Signal {
    pub(crate) fn fire(&self) {
        self.fired.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub(crate) fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    pub(crate) async fn wait(&self) {
        loop {
            // Register before checking the flag so a concurrent `fire` can't slip between.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_fired() {
                return;
            }

            notified.await;
        }
    }
}

/// Signals shared between one run's dispatch loop and the generator handle.
#[derive(Debug, Default)]
pub(crate) struct RunSignals {
    /// Explicit stop requested.
    pub(crate) stop: Signal,
    /// The dispatch loop has finished and the result sink is closed.
    pub(crate) stopped: Signal,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn wait_returns_immediately_once_fired() {
        let signal = Signal::default();
        signal.fire();

        assert!(signal.is_fired());
        if timeout(Duration::from_millis(100), signal.wait()).await.is_err() {
            panic!("wait should not block on a fired signal");
        }
    }

    #[tokio::test]
    async fn wait_unblocks_on_fire() {
        let signal = Arc::new(Signal::default());

        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.wait().await })
        };

        tokio::task::yield_now().await;
        signal.fire();

        match timeout(Duration::from_secs(1), waiter).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => panic!("waiter task panicked: {err}"),
            Err(_) => panic!("wait did not unblock"),
        }
    }
}
