use bytes::Bytes;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt as _, AsyncReadExt as _, AsyncWrite, AsyncWriteExt as _,
};

use crate::error::{Error, Result};

/// Every message, in both directions, is terminated by this byte.
pub const DELIM: u8 = b'\n';

/// Longest message accepted by [`read_line`], delimiter excluded.
pub const MAX_LINE: usize = 64 * 1024;

/// Reads one message, without its delimiter.
///
/// EOF before the delimiter is an error: a half-written line is never a message.
/// Reading stops after [`MAX_LINE`] bytes without a delimiter.
pub async fn read_line<R>(reader: &mut R) -> Result<Bytes>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut limited = reader.take(MAX_LINE as u64 + 1);
    limited.read_until(DELIM, &mut buf).await?;

    match buf.last() {
        Some(&DELIM) => {
            buf.pop();
            Ok(Bytes::from(buf))
        }
        _ if buf.len() > MAX_LINE => Err(Error::LineTooLong(MAX_LINE)),
        _ => Err(Error::ConnectionClosed),
    }
}

/// Writes one message followed by the delimiter, then flushes.
pub async fn write_line<W>(writer: &mut W, msg: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(msg).await?;
    writer.write_all(&[DELIM]).await?;
    writer.flush().await?;
    Ok(())
}
