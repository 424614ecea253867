//! Two-byte length-prefixed DNS message framing (RFC 1035 §4.2.2, RFC 7858 §3.3)
//!
//! Used on both sides of the proxy: client sessions over TLS and the TCP
//! fallback towards the upstream resolver.

use bytes::Bytes;
use std::io;
use tldns_domain::DomainError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload a 16-bit length prefix can describe.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

const LENGTH_PREFIX_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameRead {
    Frame(Bytes),
    /// Peer closed the stream on a frame boundary.
    Eof,
}

/// Reads exactly one frame.
///
/// Reads accumulate until the prefix and the body are complete, so a
/// transport that hands out partial records still yields whole frames.
/// An end of stream before the first prefix byte is a clean [`FrameRead::Eof`];
/// anywhere else it is a truncated frame.
pub async fn read_frame<S>(stream: &mut S) -> Result<FrameRead, DomainError>
where
    S: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_LEN];
    let received = read_until_full(stream, &mut prefix).await?;

    match received {
        0 => return Ok(FrameRead::Eof),
        LENGTH_PREFIX_LEN => {}
        _ => {
            return Err(DomainError::TruncatedFrame {
                expected: LENGTH_PREFIX_LEN,
                received,
            })
        }
    }

    let expected = u16::from_be_bytes(prefix) as usize;
    if expected == 0 {
        return Err(DomainError::EmptyFrame);
    }

    let mut payload = vec![0u8; expected];
    let received = read_until_full(stream, &mut payload).await?;
    if received < expected {
        return Err(DomainError::TruncatedFrame { expected, received });
    }

    Ok(FrameRead::Frame(Bytes::from(payload)))
}

/// Writes the prefix and the payload as one buffer, then flushes.
pub async fn write_frame<S>(stream: &mut S, payload: &[u8]) -> Result<(), DomainError>
where
    S: AsyncWrite + Unpin,
{
    if payload.is_empty() || payload.len() > MAX_FRAME_LEN {
        return Err(DomainError::InvalidFrameLength(payload.len()));
    }

    let mut buf = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    buf.extend_from_slice(payload);

    stream
        .write_all(&buf)
        .await
        .map_err(|e| DomainError::Write(e.to_string()))?;
    stream
        .flush()
        .await
        .map_err(|e| DomainError::Write(e.to_string()))?;

    Ok(())
}

/// Fills `buf` as far as the stream allows and returns the byte count.
/// Stops short only at end of stream.
async fn read_until_full<S>(stream: &mut S, buf: &mut [u8]) -> Result<usize, DomainError>
where
    S: AsyncRead + Unpin,
{
    let mut filled = 0;

    while filled < buf.len() {
        match stream.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            // rustls reports a TCP close without close_notify this way
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(DomainError::ConnectionIo(e.to_string())),
        }
    }

    Ok(filled)
}
