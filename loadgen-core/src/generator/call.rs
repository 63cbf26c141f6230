use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use futures::FutureExt as _;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::caller::Caller;
use crate::result::{CallResult, RawResp, RetCode};

use super::run::Shared;
use super::tickets::Ticket;

const PENDING: u8 = 0;
const COMPLETED: u8 = 1;
const TIMED_OUT: u8 = 2;
const FAILED: u8 = 3;

/// Per-call claim flag: whoever moves it out of `PENDING` owns the call's result.
#[derive(Debug, Default)]
struct CallSlot(AtomicU8);

impl CallSlot {
    fn claim(&self, from: u8, to: u8) -> bool {
        self.0
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Cancels the timeout timer once the call path no longer needs it.
struct TimerGuard(JoinHandle<()>);

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs one call on its own task. The ticket is held until the caller's future
/// resolves, even if the timeout already reported the call.
pub(super) fn spawn_call<C: Caller>(shared: Arc<Shared<C>>, ticket: Ticket) {
    tokio::spawn(async move {
        let _ticket = ticket;
        let slot = Arc::new(CallSlot::default());

        let outcome = AssertUnwindSafe(call_one(&shared, &slot))
            .catch_unwind()
            .await;

        if let Err(panic) = outcome {
            let msg = format!("async call panic ({})", panic_message(panic.as_ref()));
            error!(%msg, "call task panicked");

            // A timeout result may already be out; never report the same call twice.
            if slot.claim(PENDING, FAILED) || slot.claim(COMPLETED, FAILED) {
                shared.send_result(CallResult::fatal(msg));
            }
        }
    });
}

async fn call_one<C: Caller>(shared: &Arc<Shared<C>>, slot: &Arc<CallSlot>) {
    shared.call_count.fetch_add(1, Ordering::Relaxed);

    let Some(req) = shared.caller.build_request() else {
        if slot.claim(PENDING, COMPLETED) {
            shared.send_result(CallResult::fatal("invalid raw request"));
        }
        return;
    };

    let timeout = shared.timeout;
    let timer = TimerGuard(tokio::spawn({
        let shared = shared.clone();
        let slot = slot.clone();
        let req = req.clone();
        async move {
            tokio::time::sleep(timeout).await;
            if !slot.claim(PENDING, TIMED_OUT) {
                return;
            }

            let result = CallResult::new(
                req,
                RetCode::WarningCallTimeout,
                format!("timeout (expected < {timeout:?})"),
            )
            .with_elapsed(timeout);
            shared.send_result(result);
        }
    }));

    let started = Instant::now();
    let resp = shared.caller.call(req.req.clone(), timeout).await;
    let elapsed = started.elapsed();

    if !slot.claim(PENDING, COMPLETED) {
        debug!(id = req.id, ?elapsed, "call completed after timeout, result dropped");
        return;
    }
    drop(timer);

    let result = match resp {
        Err(err) => {
            let msg = format!("sync call error: {err}");
            let raw = RawResp {
                id: req.id,
                err: Some(msg.clone()),
                elapsed,
                ..RawResp::default()
            };
            CallResult::new(req, RetCode::ErrorCall, msg)
                .with_resp(raw)
                .with_elapsed(elapsed)
        }
        Ok(body) => {
            let raw = RawResp {
                id: req.id,
                resp: body,
                err: None,
                elapsed,
            };
            let mut result = shared.caller.check_response(&req, &raw);
            result.elapsed = elapsed;
            result
        }
    };

    shared.send_result(result);
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = panic.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic payload".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_has_a_single_owner() {
        let slot = CallSlot::default();
        assert!(slot.claim(PENDING, TIMED_OUT));
        assert!(!slot.claim(PENDING, COMPLETED));
        assert!(!slot.claim(PENDING, FAILED));
        assert!(!slot.claim(COMPLETED, FAILED));
    }

    #[test]
    fn completed_slot_can_still_fail() {
        let slot = CallSlot::default();
        assert!(slot.claim(PENDING, COMPLETED));
        assert!(slot.claim(COMPLETED, FAILED));
        assert!(!slot.claim(PENDING, TIMED_OUT));
    }

    #[test]
    fn panic_message_handles_common_payloads() {
        let static_str: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(42u32);

        assert_eq!(panic_message(static_str.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }
}
