mod caller;
mod result;

pub mod generator;

pub use caller::Caller;
pub use generator::{
    Error, Generator, ParamSet, Result, ResultReceiver, ResultSender, SendError, Status, Ticket,
    Tickets, ValidationError, result_channel,
};
pub use result::{CallResult, RawReq, RawResp, RetCode};
