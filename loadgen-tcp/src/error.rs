use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum TcpErrorKind {
    Io,
    Timeout,
    Json,
    ConnectionClosed,
    LineTooLong,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("tcp i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("tcp exchange timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid json payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection closed before a full line was read")]
    ConnectionClosed,

    #[error("line longer than {0} bytes")]
    LineTooLong(usize),
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> TcpErrorKind {
        match self {
            Self::Io(_) => TcpErrorKind::Io,
            Self::Timeout(_) => TcpErrorKind::Timeout,
            Self::Json(_) => TcpErrorKind::Json,
            Self::ConnectionClosed => TcpErrorKind::ConnectionClosed,
            Self::LineTooLong(_) => TcpErrorKind::LineTooLong,
        }
    }
}
