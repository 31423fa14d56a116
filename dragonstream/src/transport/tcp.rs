use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

use crate::error::{DragonStreamError, Result};
use crate::frame::{Frame, MAX_FRAME_LEN};
use crate::transport::Transport;

/// Length-prefixed frames over a TCP stream.
///
/// ```text
/// +------------+------------------+
/// | length(4B) | encoded frame    |
/// +------------+------------------+
/// ```
///
/// Received bytes accumulate in a read buffer that survives across calls, so
/// a `recv` cancelled mid-frame (for example by a timeout) resumes at the
/// same frame boundary on the next call.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    read_buf: BytesMut,
}

impl TcpTransport {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        debug!(peer = ?stream.peer_addr().ok(), "tcp transport connected");
        Ok(Self::from_stream(stream))
    }

    /// Wrap an accepted (or otherwise established) stream.
    pub fn from_stream(stream: TcpStream) -> Self {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "could not set TCP_NODELAY");
        }
        Self {
            stream,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    /// Unwrap the stream. Bytes already buffered but not yet returned as a
    /// frame are discarded.
    pub fn into_inner(self) -> TcpStream {
        self.stream
    }

    /// Split one complete frame off the front of the read buffer, if present.
    fn take_frame(&mut self) -> Result<Option<Frame>> {
        if self.read_buf.len() < 4 {
            return Ok(None);
        }
        let len = u32::from_be_bytes([
            self.read_buf[0],
            self.read_buf[1],
            self.read_buf[2],
            self.read_buf[3],
        ]) as usize;
        if len > MAX_FRAME_LEN {
            return Err(DragonStreamError::FieldTooLarge {
                field: "frame",
                size: len,
                max: MAX_FRAME_LEN,
            });
        }
        if self.read_buf.len() < 4 + len {
            self.read_buf.reserve(4 + len - self.read_buf.len());
            return Ok(None);
        }

        self.read_buf.advance(4);
        let body = self.read_buf.split_to(len);
        Frame::decode(&body).map(Some)
    }
}

const READ_CHUNK: usize = 4096;

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, frame: &Frame) -> Result<()> {
        let mut buf = BytesMut::with_capacity(4 + frame.encoded_len());
        buf.extend_from_slice(&[0u8; 4]);
        frame.encode_into(&mut buf)?;
        let len = (buf.len() - 4) as u32;
        buf[..4].copy_from_slice(&len.to_be_bytes());

        self.stream.write_all(&buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.take_frame()? {
                return Ok(frame);
            }
            // `read_buf` is cancellation safe: bytes are only ever appended.
            if self.stream.read_buf(&mut self.read_buf).await? == 0 {
                return Err(DragonStreamError::ConnectionClosed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;

    use super::*;
    use crate::frame::AbortReason;

    async fn connected_pair() -> (TcpTransport, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, accepted) = tokio::join!(TcpTransport::connect(addr), listener.accept());
        (client.unwrap(), accepted.unwrap().0)
    }

    #[tokio::test]
    async fn recv_resumes_after_timeout_mid_frame() {
        let (mut transport, mut raw) = connected_pair().await;
        let frame = Frame::abort(AbortReason::Timeout);
        let body = frame.encode().unwrap();
        let mut wire = (body.len() as u32).to_be_bytes().to_vec();
        wire.extend_from_slice(&body);

        // Length prefix and type byte only; the reason code is still in flight.
        raw.write_all(&wire[..5]).await.unwrap();
        let cut = tokio::time::timeout(Duration::from_millis(50), transport.recv()).await;
        assert!(cut.is_err());

        raw.write_all(&wire[5..]).await.unwrap();
        assert_eq!(transport.recv().await.unwrap(), frame);
    }

    #[tokio::test]
    async fn nodelay_is_enabled() {
        let (transport, raw) = connected_pair().await;
        assert!(transport.stream.nodelay().unwrap());
        assert!(TcpTransport::from_stream(raw).into_inner().nodelay().unwrap());
    }

    #[tokio::test]
    async fn two_frames_in_one_segment() {
        let (mut transport, mut raw) = connected_pair().await;
        let first = Frame::abort(AbortReason::Protocol);
        let second = Frame::abort(AbortReason::Internal);
        let mut wire = Vec::new();
        for frame in [&first, &second] {
            let body = frame.encode().unwrap();
            wire.extend_from_slice(&(body.len() as u32).to_be_bytes());
            wire.extend_from_slice(&body);
        }
        raw.write_all(&wire).await.unwrap();

        assert_eq!(transport.recv().await.unwrap(), first);
        assert_eq!(transport.recv().await.unwrap(), second);
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_rejected() {
        let (mut transport, mut raw) = connected_pair().await;
        raw.write_all(&((MAX_FRAME_LEN + 1) as u32).to_be_bytes())
            .await
            .unwrap();
        assert!(matches!(
            transport.recv().await,
            Err(DragonStreamError::FieldTooLarge { field: "frame", .. })
        ));
    }

    #[tokio::test]
    async fn closed_peer_is_reported() {
        let (mut transport, raw) = connected_pair().await;
        drop(raw);
        assert!(matches!(
            transport.recv().await,
            Err(DragonStreamError::ConnectionClosed)
        ));
    }
}
