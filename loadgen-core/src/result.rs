use std::time::Duration;

use bytes::Bytes;

/// A request built by a [`crate::Caller`], ready to be sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawReq {
    pub id: i64,
    pub req: Bytes,
}

/// What came back from one call, as seen by the generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResp {
    pub id: i64,
    pub resp: Bytes,
    pub err: Option<String>,
    pub elapsed: Duration,
}

/// Terminal classification of one dispatched call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumIter,
)]
#[repr(u16)]
pub enum RetCode {
    #[strum(serialize = "Success")]
    Success = 0,

    #[strum(serialize = "Call Timeout Warning")]
    WarningCallTimeout = 1001,

    #[strum(serialize = "Call Error")]
    ErrorCall = 2001,

    /// The response could not be parsed or did not match the request.
    #[strum(serialize = "Response Error")]
    ErrorResponse = 2002,

    /// The callee reported an internal error.
    #[strum(serialize = "Callee Error")]
    ErrorCallee = 2003,

    #[strum(serialize = "Call Fatal Error")]
    FatalCall = 3001,
}

impl RetCode {
    #[must_use]
    pub fn code(self) -> u16 {
        self as u16
    }

    #[must_use]
    pub fn plain(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::WarningCallTimeout => "Call Timeout Warning",
            Self::ErrorCall => "Call Error",
            Self::ErrorResponse => "Response Error",
            Self::ErrorCallee => "Callee Error",
            Self::FatalCall => "Call Fatal Error",
        }
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// The single outcome produced for one dispatched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    pub id: i64,
    /// `None` only when the call task failed before a request existed.
    pub req: Option<RawReq>,
    pub resp: Option<RawResp>,
    pub code: RetCode,
    pub msg: String,
    pub elapsed: Duration,
}

impl CallResult {
    #[must_use]
    pub fn new(req: RawReq, code: RetCode, msg: impl Into<String>) -> Self {
        Self {
            id: req.id,
            req: Some(req),
            resp: None,
            code,
            msg: msg.into(),
            elapsed: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_resp(mut self, resp: RawResp) -> Self {
        self.id = resp.id;
        self.resp = Some(resp);
        self
    }

    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub(crate) fn fatal(msg: impl Into<String>) -> Self {
        Self {
            id: -1,
            req: None,
            resp: None,
            code: RetCode::FatalCall,
            msg: msg.into(),
            elapsed: Duration::ZERO,
        }
    }
}
