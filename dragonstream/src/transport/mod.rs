//! Frame transports that carry the handshake between two peers.

pub mod channel;
pub mod tcp;

use async_trait::async_trait;

use crate::error::Result;
use crate::frame::Frame;

pub use channel::ChannelTransport;
pub use tcp::TcpTransport;

/// A bidirectional, ordered, reliable frame pipe to exactly one peer.
///
/// Implementations deliver whole frames; message boundaries are the
/// transport's concern. A closed peer surfaces as
/// [`DragonStreamError::ConnectionClosed`](crate::error::DragonStreamError::ConnectionClosed).
#[async_trait]
pub trait Transport: Send {
    /// Send one frame.
    async fn send(&mut self, frame: &Frame) -> Result<()>;

    /// Wait for the next frame from the peer.
    ///
    /// Must be cancellation safe: if the returned future is dropped before
    /// completing (the driver wraps it in a timeout), no frame is lost or
    /// split, and the next call picks up where this one stopped.
    async fn recv(&mut self) -> Result<Frame>;
}
