// DragonStream — framing and transports for the Dragonfly handshake
//
// Crate root: module declarations and public re-exports.

pub mod error;
pub mod frame;
pub mod transport;
pub mod driver;

pub use driver::{
    recv_payload, run_handshake, send_payload, HandshakeDriver, HandshakeOutcome,
    HandshakeTimings, DEFAULT_RECV_TIMEOUT,
};
pub use error::{DragonStreamError, Result};
pub use frame::{AbortReason, Frame, FrameType};
pub use transport::{ChannelTransport, TcpTransport, Transport};
