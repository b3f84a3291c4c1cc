//! Length-prefixed frame transport.
//!
//! Each frame is a 4-byte big-endian length followed by that many bytes of
//! message body. The [`Transport`] trait is what clients drive; the server
//! splits a stream into halves and uses [`read_frame`] / [`write_frame`]
//! directly so reads and writes never block each other.

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout, Duration};

pub mod heartbeat;
pub mod in_memory;
pub mod tcp;

pub use tcp::TcpTransport;

/// Default upper bound on a single frame body (64 KiB).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 64 * 1024;

/// Default timeout for writing one frame.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait::async_trait]
pub trait Transport: Send {
    async fn send_frame(&mut self, frame: &[u8]) -> anyhow::Result<()>;

    /// Next frame body. Cancel-safe: dropping the future loses no bytes.
    async fn recv_frame(&mut self) -> anyhow::Result<Vec<u8>>;
}

/// Read one frame body, rejecting empty and oversize frames.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_frame_size: u32,
) -> anyhow::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(read_error)?;

    let len = u32::from_be_bytes(len_buf);
    check_frame_len(len, max_frame_size)?;

    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await.map_err(read_error)?;
    Ok(buf)
}

fn check_frame_len(len: u32, max_frame_size: u32) -> anyhow::Result<()> {
    if len > max_frame_size {
        return Err(anyhow::anyhow!(
            "Frame too large: {} bytes (max: {})",
            len,
            max_frame_size
        ));
    }
    if len == 0 {
        return Err(anyhow::anyhow!("Invalid frame length: 0"));
    }
    Ok(())
}

/// Split one complete frame off the front of `buf`, if it holds one.
fn take_frame(buf: &mut Vec<u8>, max_frame_size: u32) -> anyhow::Result<Option<Vec<u8>>> {
    if buf.len() < 4 {
        return Ok(None);
    }
    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    check_frame_len(len, max_frame_size)?;
    let end = 4 + len as usize;
    if buf.len() < end {
        return Ok(None);
    }
    let frame = buf[4..end].to_vec();
    buf.drain(..end);
    Ok(Some(frame))
}

/// Write one frame body with its length prefix, giving up after `limit`.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frame: &[u8],
    max_frame_size: u32,
    limit: Duration,
) -> anyhow::Result<()> {
    if frame.len() > max_frame_size as usize {
        return Err(anyhow::anyhow!(
            "Frame too large: {} bytes (max: {})",
            frame.len(),
            max_frame_size
        ));
    }
    let send_op = async {
        let len = (frame.len() as u32).to_be_bytes();
        writer.write_all(&len).await.map_err(write_error)?;
        writer.write_all(frame).await.map_err(write_error)?;
        writer.flush().await.map_err(write_error)?;
        anyhow::Ok(())
    };
    timeout(limit, send_op)
        .await
        .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", limit))?
}

fn read_error(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        ErrorKind::UnexpectedEof => anyhow::anyhow!("Connection closed by peer"),
        ErrorKind::ConnectionReset => anyhow::anyhow!("Connection reset by peer"),
        _ => anyhow::anyhow!("Read error: {}", e),
    }
}

fn write_error(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset => {
            anyhow::anyhow!("Connection closed by peer")
        }
        _ => anyhow::anyhow!("Write error: {}", e),
    }
}

/// A [`Transport`] over any byte stream. Inbound bytes are buffered until
/// a whole frame is present, which keeps `recv_frame` cancel-safe.
pub struct StreamTransport<S> {
    stream: S,
    max_frame_size: u32,
    io_timeout: Duration,
    inbound: Vec<u8>,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            io_timeout: DEFAULT_IO_TIMEOUT,
            inbound: Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_frame(&mut self, frame: &[u8]) -> anyhow::Result<()> {
        write_frame(&mut self.stream, frame, self.max_frame_size, self.io_timeout).await
    }

    async fn recv_frame(&mut self) -> anyhow::Result<Vec<u8>> {
        loop {
            if let Some(frame) = take_frame(&mut self.inbound, self.max_frame_size)? {
                return Ok(frame);
            }
            let n = self
                .stream
                .read_buf(&mut self.inbound)
                .await
                .map_err(read_error)?;
            if n == 0 {
                return Err(anyhow::anyhow!("Connection closed by peer"));
            }
        }
    }
}
