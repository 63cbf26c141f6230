#![forbid(unsafe_code)]

mod caller;
mod error;
mod framing;
mod proto;

pub use caller::TcpCaller;
pub use error::{Error, Result, TcpErrorKind};
pub use framing::{DELIM, MAX_LINE, read_line, write_line};
pub use proto::{EvalError, Operator, ServerReq, ServerResp, formula};
