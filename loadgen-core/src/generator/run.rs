use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::caller::Caller;
use crate::result::CallResult;

use super::call::spawn_call;
use super::error::Result;
use super::params::ParamSet;
use super::signal::RunSignals;
use super::sink::{ResultSender, SendError};
use super::status::{AtomicStatus, Status};
use super::tickets::Tickets;

/// Drives calls against a [`Caller`] at a fixed rate, with a bounded number in flight,
/// for a fixed duration.
///
/// Each dispatched call produces at most one [`CallResult`], delivered to the result
/// sink without ever blocking. The sink is closed when a run ends, whether the deadline
/// passed or [`Generator::stop`] was called.
pub struct Generator<C: Caller> {
    shared: Arc<Shared<C>>,
    lps: u32,
    duration: Duration,
    concurrency: u32,
    tickets: Tickets,
    run: Mutex<Option<Arc<RunSignals>>>,
}

/// State shared between the generator handle, its dispatch loop and every call task.
pub(super) struct Shared<C> {
    pub(super) caller: Arc<C>,
    pub(super) timeout: Duration,
    pub(super) status: AtomicStatus,
    pub(super) call_count: AtomicI64,
    pub(super) result_sink: ResultSender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
enum StopCause {
    #[strum(serialize = "deadline exceeded")]
    Deadline,
    #[strum(serialize = "stop requested")]
    Stopped,
}

impl<C: Caller> Generator<C> {
    pub fn new(params: ParamSet<C>) -> Result<Self> {
        info!("new load generator");
        let params = params.validate()?;

        let concurrency = concurrency_budget(params.timeout, params.lps);
        let tickets = Tickets::new(concurrency)?;
        info!(concurrency, "load generator initialized");

        Ok(Self {
            shared: Arc::new(Shared {
                caller: params.caller,
                timeout: params.timeout,
                status: AtomicStatus::new(Status::Original),
                call_count: AtomicI64::new(0),
                result_sink: params.result_sink,
            }),
            lps: params.lps,
            duration: params.duration,
            concurrency,
            tickets,
            run: Mutex::new(None),
        })
    }

    /// Starts a run. Returns `false` unless the generator is fresh or stopped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        info!("starting load generator");

        let status = &self.shared.status;
        let from = if status.transition(Status::Original, Status::Starting) {
            Status::Original
        } else if status.transition(Status::Stopped, Status::Starting) {
            Status::Stopped
        } else {
            return false;
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            error!("load generator must be started from within a tokio runtime");
            status.store(from);
            return false;
        };

        let signals = Arc::new(RunSignals::default());
        *self.run.lock() = Some(signals.clone());

        let deadline = Instant::now() + self.duration;
        self.shared.call_count.store(0, Ordering::Relaxed);
        status.store(Status::Started);

        handle.spawn(gen_load(
            self.shared.clone(),
            self.tickets.clone(),
            signals,
            self.lps,
            deadline,
        ));

        true
    }

    /// Stops the current run and waits until it has fully stopped.
    ///
    /// Returns `false` if the generator was not running. Calls still in flight are not
    /// cancelled; their results are discarded.
    pub async fn stop(&self) -> bool {
        // `start` publishes a run's signals before storing `Started`; checking the
        // status under the same lock pins the run that is actually started.
        let signals = {
            let run = self.run.lock();
            if !self
                .shared
                .status
                .transition(Status::Started, Status::Stopping)
            {
                return false;
            }
            run.clone()
        };

        if let Some(signals) = signals {
            signals.stop.fire();
            signals.stopped.wait().await;
        }

        true
    }

    /// Waits for the current run to end on its own. Returns immediately if the
    /// generator was never started.
    pub async fn wait_stopped(&self) {
        let signals = self.run.lock().clone();
        if let Some(signals) = signals {
            signals.stopped.wait().await;
        }
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.shared.status.load()
    }

    /// Calls attempted in the current run.
    #[must_use]
    pub fn call_count(&self) -> i64 {
        self.shared.call_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn concurrency(&self) -> u32 {
        self.concurrency
    }

    #[must_use]
    pub fn tickets_remaining(&self) -> u32 {
        self.tickets.remaining()
    }
}

impl<C: Caller> Drop for Generator<C> {
    fn drop(&mut self) {
        // Don't leave a dispatch loop running until its deadline.
        if let Some(signals) = self.run.get_mut().as_ref() {
            signals.stop.fire();
        }
    }
}

impl<C> Shared<C> {
    /// Delivers a result if the generator is still running and the sink has room.
    pub(super) fn send_result(&self, result: CallResult) -> bool {
        if self.status.load() != Status::Started {
            print_ignored_result(&result, "stopped load generator");
            return false;
        }

        match self.result_sink.try_send(result) {
            Ok(()) => true,
            Err(err) => {
                let cause = match &err {
                    SendError::Full(_) => "full result channel",
                    SendError::Closed(_) => "closed result channel",
                };
                print_ignored_result(&err.into_inner(), cause);
                false
            }
        }
    }
}

fn print_ignored_result(result: &CallResult, cause: &str) {
    warn!(
        id = result.id,
        code = result.code.code(),
        msg = %result.msg,
        elapsed = ?result.elapsed,
        cause,
        "ignored result"
    );
}

async fn gen_load<C: Caller>(
    shared: Arc<Shared<C>>,
    tickets: Tickets,
    signals: Arc<RunSignals>,
    lps: u32,
    deadline: Instant,
) {
    info!("generating load");

    let mut throttle = (lps > 0).then(|| {
        let period = throttle_period(lps);
        info!(interval = ?period, "setting throttle");
        let mut throttle = tokio::time::interval_at(Instant::now() + period, period);
        throttle.set_missed_tick_behavior(MissedTickBehavior::Delay);
        throttle
    });

    let expired = tokio::time::sleep_until(deadline);
    tokio::pin!(expired);

    let cause = loop {
        if signals.stop.is_fired() {
            break StopCause::Stopped;
        }
        if Instant::now() >= deadline {
            break StopCause::Deadline;
        }

        // An exhausted pool stalls dispatch; the stop signal and the deadline still win.
        let ticket = tokio::select! {
            biased;
            () = signals.stop.wait() => break StopCause::Stopped,
            () = &mut expired => break StopCause::Deadline,
            ticket = tickets.take() => ticket,
        };
        spawn_call(shared.clone(), ticket);

        if let Some(throttle) = throttle.as_mut() {
            tokio::select! {
                biased;
                () = signals.stop.wait() => break StopCause::Stopped,
                () = &mut expired => break StopCause::Deadline,
                _ = throttle.tick() => {}
            }
        }
    };

    prepare_to_stop(&shared, &signals, cause);
    info!(
        call_count = shared.call_count.load(Ordering::Relaxed),
        "load generator stopped"
    );
}

fn prepare_to_stop<C>(shared: &Shared<C>, signals: &RunSignals, cause: StopCause) {
    info!(%cause, "prepare to stop load generator");

    // `stop()` may have already moved the status to `Stopping`.
    shared.status.transition(Status::Started, Status::Stopping);

    info!("closing result sink");
    if !shared.result_sink.close() {
        debug!("result sink was already closed");
    }

    shared.status.store(Status::Stopped);
    signals.stopped.fire();
}

/// `timeout / (1s / lps) + 1`, capped at `i32::MAX`.
///
/// Enough tickets that, at the target rate, calls bounded by `timeout` never starve
/// dispatch.
pub(crate) fn concurrency_budget(timeout: Duration, lps: u32) -> u32 {
    const CAP: u128 = i32::MAX as u128;

    let interval_ns = 1_000_000_000u128 / u128::from(lps.max(1));
    if interval_ns == 0 {
        return CAP as u32;
    }

    let total = timeout.as_nanos() / interval_ns + 1;
    total.min(CAP) as u32
}

fn throttle_period(lps: u32) -> Duration {
    let ns = 1_000_000_000u64 / u64::from(lps.max(1));
    Duration::from_nanos(ns.max(1))
}
