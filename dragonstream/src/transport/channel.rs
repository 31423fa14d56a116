use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::{DragonStreamError, Result};
use crate::frame::Frame;
use crate::transport::Transport;

/// Frames buffered per direction before `send` waits.
const CHANNEL_DEPTH: usize = 16;

/// In-memory transport for two peers in the same process.
///
/// Frames still go through the wire codec, so a channel pair exercises the
/// same encode/decode path as TCP.
#[derive(Debug)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Bytes>,
    rx: mpsc::Receiver<Bytes>,
}

impl ChannelTransport {
    /// Two connected endpoints.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel(CHANNEL_DEPTH);
        let (b_tx, a_rx) = mpsc::channel(CHANNEL_DEPTH);
        (
            Self { tx: a_tx, rx: a_rx },
            Self { tx: b_tx, rx: b_rx },
        )
    }

    /// Push raw bytes to the peer, bypassing the encoder.
    pub async fn send_raw(&mut self, bytes: Bytes) -> Result<()> {
        self.tx
            .send(bytes)
            .await
            .map_err(|_| DragonStreamError::ConnectionClosed)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, frame: &Frame) -> Result<()> {
        let bytes = frame.encode()?;
        self.send_raw(bytes).await
    }

    async fn recv(&mut self) -> Result<Frame> {
        let bytes = self
            .rx
            .recv()
            .await
            .ok_or(DragonStreamError::ConnectionClosed)?;
        Frame::decode(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pair_delivers_both_ways() {
        let (mut a, mut b) = ChannelTransport::pair();
        a.send(&Frame::Abort { code: 1 }).await.unwrap();
        b.send(&Frame::Abort { code: 2 }).await.unwrap();
        assert_eq!(b.recv().await.unwrap(), Frame::Abort { code: 1 });
        assert_eq!(a.recv().await.unwrap(), Frame::Abort { code: 2 });
    }

    #[tokio::test]
    async fn dropped_peer_closes() {
        let (mut a, b) = ChannelTransport::pair();
        drop(b);
        assert!(matches!(
            a.recv().await,
            Err(DragonStreamError::ConnectionClosed)
        ));
        assert!(matches!(
            a.send(&Frame::Abort { code: 1 }).await,
            Err(DragonStreamError::ConnectionClosed)
        ));
    }
}
