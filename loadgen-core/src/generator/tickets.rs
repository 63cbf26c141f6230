use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::error::{Error, Result};

/// Fixed-size pool of in-flight permissions.
///
/// Capacity never grows past the number given at construction: a ticket can only come
/// back to the pool by dropping the [`Ticket`] that was taken from it.
#[derive(Debug, Clone)]
pub struct Tickets {
    semaphore: Arc<Semaphore>,
    total: u32,
}

impl Tickets {
    pub fn new(total: u32) -> Result<Self> {
        if total == 0 {
            return Err(Error::InvalidCapacity);
        }

        // The semaphore reserves its top bits for flags.
        let total = (total as usize).min(Semaphore::MAX_PERMITS) as u32;

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(total as usize)),
            total,
        })
    }

    /// Waits until a ticket is free and takes it.
    pub async fn take(&self) -> Ticket {
        match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => Ticket { _permit: permit },
            // The semaphore is never closed; if it were, no ticket would ever free up.
            Err(_) => std::future::pending().await,
        }
    }

    pub fn try_take(&self) -> Option<Ticket> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| Ticket { _permit: permit })
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.semaphore.available_permits() as u32
    }
}

/// One unit of in-flight permission. Goes back to its pool when dropped.
#[derive(Debug)]
pub struct Ticket {
    _permit: OwnedSemaphorePermit,
}

impl Ticket {
    /// Returns the ticket to its pool right away.
    pub fn release(self) {}
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(Tickets::new(0), Err(Error::InvalidCapacity)));
    }

    #[tokio::test]
    async fn take_blocks_until_a_ticket_is_returned() {
        let tickets = match Tickets::new(2) {
            Ok(v) => v,
            Err(err) => panic!("expected pool: {err}"),
        };

        let first = tickets.take().await;
        let _second = tickets.take().await;
        assert_eq!(tickets.remaining(), 0);
        assert!(tickets.try_take().is_none());

        let waiter = {
            let tickets = tickets.clone();
            tokio::spawn(async move { tickets.take().await })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        first.release();

        match timeout(Duration::from_secs(1), waiter).await {
            Ok(Ok(_ticket)) => {}
            Ok(Err(err)) => panic!("waiter task panicked: {err}"),
            Err(_) => panic!("take did not unblock after release"),
        }
    }

    #[tokio::test]
    async fn returning_never_exceeds_capacity() {
        let tickets = match Tickets::new(3) {
            Ok(v) => v,
            Err(err) => panic!("expected pool: {err}"),
        };

        for _ in 0..10 {
            let taken: Vec<_> = (0..3).filter_map(|_| tickets.try_take()).collect();
            assert_eq!(taken.len(), 3);
            drop(taken);
            assert_eq!(tickets.remaining(), tickets.total());
        }
    }
}
