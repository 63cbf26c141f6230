use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use loadgen_core::{CallResult, Caller, RawReq, RawResp, RetCode};
use rand::Rng as _;
use rand::seq::IndexedRandom as _;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::framing::{read_line, write_line};
use crate::proto::{Operator, ServerReq, ServerResp, formula};

const OPERAND_RANGE: std::ops::RangeInclusive<i64> = 1..=1000;

/// Added to the call timeout for the exchange's own bound. The generator reports the
/// timeout; this bound only reclaims the connection.
const TIMEOUT_SLACK: Duration = Duration::from_millis(50);

/// Sends random arithmetic requests to a TCP target, one connection per call.
#[derive(Debug)]
pub struct TcpCaller {
    addr: String,
    next_id: AtomicI64,
}

impl TcpCaller {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            next_id: AtomicI64::new(1),
        }
    }

    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn random_request(&self) -> ServerReq {
        let mut rng = rand::rng();
        let operator = Operator::ALL
            .choose(&mut rng)
            .copied()
            .unwrap_or(Operator::Add);

        ServerReq {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            operands: vec![
                rng.random_range(OPERAND_RANGE),
                rng.random_range(OPERAND_RANGE),
            ],
            operator,
        }
    }
}

impl Caller for TcpCaller {
    type Error = Error;

    fn build_request(&self) -> Option<RawReq> {
        let req = self.random_request();
        match serde_json::to_vec(&req) {
            Ok(body) => Some(RawReq {
                id: req.id,
                req: Bytes::from(body),
            }),
            Err(err) => {
                warn!(id = req.id, error = %err, "failed to encode request");
                None
            }
        }
    }

    fn call(
        &self,
        req: Bytes,
        timeout: Duration,
    ) -> impl Future<Output = Result<Bytes>> + Send {
        let addr = self.addr.clone();
        let bound = timeout.saturating_add(TIMEOUT_SLACK);
        async move {
            match tokio::time::timeout(bound, exchange(&addr, &req)).await {
                Ok(resp) => resp,
                Err(_) => Err(Error::Timeout(bound)),
            }
        }
    }

    fn check_response(&self, raw_req: &RawReq, raw_resp: &RawResp) -> CallResult {
        let (code, msg) = classify(raw_req, raw_resp);
        if !code.is_success() {
            debug!(id = raw_req.id, %code, %msg, "unexpected response");
        }
        CallResult::new(raw_req.clone(), code, msg).with_resp(raw_resp.clone())
    }
}

async fn exchange(addr: &str, req: &[u8]) -> Result<Bytes> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;

    let (read, mut write) = stream.split();
    write_line(&mut write, req).await?;

    let mut reader = BufReader::new(read);
    read_line(&mut reader).await
}

fn classify(raw_req: &RawReq, raw_resp: &RawResp) -> (RetCode, String) {
    let req: ServerReq = match serde_json::from_slice(&raw_req.req) {
        Ok(v) => v,
        Err(_) => {
            return (
                RetCode::FatalCall,
                format!(
                    "incorrectly formatted request: {}",
                    String::from_utf8_lossy(&raw_req.req)
                ),
            );
        }
    };

    let resp: ServerResp = match serde_json::from_slice(&raw_resp.resp) {
        Ok(v) => v,
        Err(_) => {
            return (
                RetCode::ErrorResponse,
                format!(
                    "incorrectly formatted response: {}",
                    String::from_utf8_lossy(&raw_resp.resp)
                ),
            );
        }
    };

    if resp.id != req.id {
        return (
            RetCode::ErrorResponse,
            format!("inconsistent id ({} != {})", req.id, resp.id),
        );
    }

    if let Some(err) = resp.err {
        return (RetCode::ErrorCallee, format!("abnormal server: {err}"));
    }

    let expected = match req.eval() {
        Ok(v) => v,
        Err(err) => {
            return (
                RetCode::FatalCall,
                format!("request cannot be evaluated: {err}"),
            );
        }
    };

    if resp.result != expected {
        return (
            RetCode::ErrorResponse,
            format!(
                "incorrect result: {}",
                formula(&req.operands, req.operator, resp.result, false)
            ),
        );
    }

    (RetCode::Success, format!("success ({})", resp.formula))
}
