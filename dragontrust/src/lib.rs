// DragonTrust — password-authenticated key exchange (Dragonfly / SAE)
//
// Crate root: module declarations and public re-exports.

pub mod error;
pub mod config;
pub mod identity;
pub mod math;
pub mod crypto;
pub mod hunting;
pub mod handshake;

// Re-export key types at crate root for convenience.
pub use config::{CurveId, SessionConfig};
pub use crypto::aead::{CipherSuite, SealedPayload};
pub use error::{DragonflyError, Result};
pub use handshake::{Commit, Confirm, HandshakeSession, HandshakeState, Pmk};
pub use hunting::PasswordElement;
pub use identity::Identity;
pub use math::{Curve, Point};
