//! Byte channel and packet envelope collaborators
//!
//! The wire layer never re-frames responses: whatever run of bytes the
//! channel has buffered when a read completes is taken as the full reply.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::FutureExt;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[async_trait]
pub trait ByteChannel: Send {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Wait until at least one byte is buffered, then drain everything
    /// currently buffered.
    async fn read_available(&mut self) -> io::Result<Bytes>;
}

/// Wraps and unwraps payloads with the channel's framing.
pub trait Envelope: Send + Sync {
    fn seal(&self, payload: Bytes) -> Bytes;

    fn open(&self, frame: Bytes) -> io::Result<Bytes>;
}

/// Envelope for channels that carry raw payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Envelope for Passthrough {
    fn seal(&self, payload: Bytes) -> Bytes {
        payload
    }

    fn open(&self, frame: Bytes) -> io::Result<Bytes> {
        Ok(frame)
    }
}

/// [`ByteChannel`] over any tokio stream, e.g. a `TcpStream` to a serial
/// bridge or one half of `tokio::io::duplex`.
pub struct StreamChannel<S> {
    stream: S,
    buffer: BytesMut,
}

impl<S> StreamChannel<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(256),
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait]
impl<S> ByteChannel for StreamChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await
    }

    async fn read_available(&mut self) -> io::Result<Bytes> {
        if self.buffer.is_empty() && self.stream.read_buf(&mut self.buffer).await? == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        // Drain whatever else is already readable without waiting again.
        while let Some(read) = self.stream.read_buf(&mut self.buffer).now_or_never() {
            if read? == 0 {
                break;
            }
        }
        Ok(self.buffer.split().freeze())
    }
}
