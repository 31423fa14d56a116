// DragonTrust error types

use thiserror::Error;

/// Top-level error type for the DragonTrust crate.
#[derive(Debug, Error)]
pub enum DragonflyError {
    // ── Curve arithmetic ────────────────────────────────────────────────
    #[error("point is not on the curve")]
    InvalidPoint,

    #[error("attempted to invert zero modulo p")]
    DivisionByZero,

    #[error("value is not a quadratic residue modulo p")]
    NotAResidue,

    #[error("modulus must be an odd prime")]
    InvalidModulus,

    #[error("invalid curve parameters: {0}")]
    InvalidCurve(String),

    // ── Password element derivation ─────────────────────────────────────
    #[error("no valid password element found after {iterations} iterations")]
    NoValidPointFound { iterations: u8 },

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    // ── Handshake errors ────────────────────────────────────────────────
    #[error("commit scalar is degenerate (< 2); secrets must be redrawn")]
    DegenerateScalar,

    #[error("peer scalar is outside [2, q)")]
    InvalidPeerScalar,

    #[error("peer element is not a valid finite curve point")]
    InvalidPeerElement,

    #[error("peer reflected our own commit back (reflection attack)")]
    ReflectionAttack,

    #[error("peer confirmation token does not match")]
    TokenMismatch,

    #[error("invalid handshake state transition: {from} -> {to}")]
    SessionState { from: String, to: String },

    // ── Payload protection ──────────────────────────────────────────────
    #[error("AEAD encryption failed: {0}")]
    Encryption(String),

    #[error("AEAD decryption failed: {0}")]
    Decryption(String),

    // ── Configuration ───────────────────────────────────────────────────
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DragonflyError {
    /// Whether the caller may recover locally by redrawing the session secrets.
    ///
    /// Every other error terminates the session.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DragonflyError::DegenerateScalar)
    }
}

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, DragonflyError>;
