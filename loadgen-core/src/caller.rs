use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use crate::result::{CallResult, RawReq, RawResp};

/// The pluggable side of a load run: knows how to build, perform and judge one call
/// against the system under test.
///
/// The generator never interprets payloads. It only measures [`Caller::call`], races it
/// against the configured timeout, and hands successful exchanges to
/// [`Caller::check_response`] for classification.
pub trait Caller: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Builds the next request. Ids should be unique per call; `None` means the caller
    /// could not produce one and the call is reported as fatal without being sent.
    fn build_request(&self) -> Option<RawReq>;

    /// Performs one exchange. Implementations should give up on their own once
    /// `timeout` has passed; the generator reports a timeout either way but keeps the
    /// call's ticket until this future resolves.
    fn call(
        &self,
        req: Bytes,
        timeout: Duration,
    ) -> impl Future<Output = std::result::Result<Bytes, Self::Error>> + Send;

    /// Classifies a completed exchange. Must not have side effects; the generator
    /// overwrites `elapsed` on the returned result with its own measurement.
    fn check_response(&self, req: &RawReq, resp: &RawResp) -> CallResult;
}
