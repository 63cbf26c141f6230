mod call;
mod error;
mod params;
mod run;
mod signal;
mod sink;
mod status;
mod tickets;

pub use error::{Error, Result, ValidationError};
pub use params::ParamSet;
pub use run::Generator;
pub use sink::{ResultReceiver, ResultSender, SendError, result_channel};
pub use status::Status;
pub use tickets::{Ticket, Tickets};
