use thiserror::Error;

use dragontrust::DragonflyError;

/// All errors produced by the DragonStream framing and transport layer.
#[derive(Debug, Error)]
pub enum DragonStreamError {
    // ── Framing ─────────────────────────────────────────────────────────
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort { expected: usize, actual: usize },

    #[error("unknown frame type: 0x{0:02x}")]
    UnknownFrameType(u8),

    #[error("unknown cipher suite: 0x{0:04x}")]
    UnknownCipherSuite(u16),

    #[error("{field} too large: {size} bytes exceeds maximum {max}")]
    FieldTooLarge {
        field: &'static str,
        size: usize,
        max: usize,
    },

    #[error("{0} trailing bytes after frame")]
    TrailingBytes(usize),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("commit element is the point at infinity")]
    InfiniteElement,

    // ── Exchange ────────────────────────────────────────────────────────
    #[error("unexpected frame: expected {expected}, got {got}")]
    UnexpectedFrame {
        expected: &'static str,
        got: &'static str,
    },

    #[error("peer aborted the handshake (code 0x{0:02x})")]
    PeerAborted(u8),

    #[error("connection is closed")]
    ConnectionClosed,

    #[error("timed out waiting for the peer")]
    Timeout,

    #[error("handshake computation task failed: {0}")]
    Task(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("handshake error: {0}")]
    Handshake(#[from] DragonflyError),
}

pub type Result<T> = std::result::Result<T, DragonStreamError>;
