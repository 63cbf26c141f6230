#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use loadgen_core::{
    CallResult, Caller, Generator, ParamSet, RawReq, RawResp, ResultReceiver, ResultSender,
    RetCode, result_channel,
};

#[derive(Debug, Clone)]
pub enum Behavior {
    Echo,
    Fail(String),
    Panic,
    PanicOnCheck,
    NoRequest,
    CalleeError,
}

/// In-process stand-in for a system under test.
#[derive(Debug)]
pub struct FakeCaller {
    delay: Duration,
    behavior: Behavior,
    next_id: AtomicI64,
    finished: AtomicU64,
}

impl FakeCaller {
    pub fn new(delay: Duration, behavior: Behavior) -> Self {
        Self {
            delay,
            behavior,
            next_id: AtomicI64::new(1),
            finished: AtomicU64::new(0),
        }
    }

    pub fn echo(delay: Duration) -> Self {
        Self::new(delay, Behavior::Echo)
    }

    pub fn finished(&self) -> u64 {
        self.finished.load(Ordering::Relaxed)
    }
}

impl Caller for FakeCaller {
    type Error = std::io::Error;

    fn build_request(&self) -> Option<RawReq> {
        if matches!(self.behavior, Behavior::NoRequest) {
            return None;
        }

        Some(RawReq {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            req: Bytes::from_static(b"ping"),
        })
    }

    fn call(
        &self,
        req: Bytes,
        _timeout: Duration,
    ) -> impl Future<Output = Result<Bytes, Self::Error>> + Send {
        async move {
            tokio::time::sleep(self.delay).await;
            self.finished.fetch_add(1, Ordering::Relaxed);

            match &self.behavior {
                Behavior::Fail(msg) => Err(std::io::Error::other(msg.clone())),
                Behavior::Panic => panic!("adapter defect"),
                _ => Ok(req),
            }
        }
    }

    fn check_response(&self, req: &RawReq, resp: &RawResp) -> CallResult {
        let result = match self.behavior {
            Behavior::CalleeError => {
                CallResult::new(req.clone(), RetCode::ErrorCallee, "callee failed")
            }
            Behavior::PanicOnCheck => panic!("check defect"),
            _ if resp.resp == req.req => CallResult::new(req.clone(), RetCode::Success, "echo"),
            _ => CallResult::new(req.clone(), RetCode::ErrorResponse, "unexpected echo"),
        };
        result.with_resp(resp.clone())
    }
}

pub struct Run {
    pub generator: Generator<FakeCaller>,
    pub tx: ResultSender,
    pub rx: ResultReceiver,
}

pub fn generator(
    caller: FakeCaller,
    timeout: Duration,
    lps: u32,
    duration: Duration,
    capacity: usize,
) -> Run {
    let (tx, rx) = result_channel(capacity);
    let params = ParamSet::new(caller, timeout, lps, duration, tx.clone());
    let generator = match Generator::new(params) {
        Ok(v) => v,
        Err(err) => panic!("expected a valid generator: {err}"),
    };

    Run { generator, tx, rx }
}

/// Collects results until the sink is closed.
pub async fn drain(rx: &mut ResultReceiver, within: Duration) -> Vec<CallResult> {
    let mut out = Vec::new();
    let collect = async {
        while let Some(result) = rx.recv().await {
            out.push(result);
        }
    };

    if tokio::time::timeout(within, collect).await.is_err() {
        panic!("result sink was not closed within {within:?}");
    }
    out
}
