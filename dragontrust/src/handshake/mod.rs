// Dragonfly commit/confirm handshake.
//
//   Peer A                                   Peer B
//     |--- Commit {scalar_A, element_A} --->|
//     |<-- Commit {scalar_B, element_B} ----|
//     |--- Confirm {token_A} -------------->|
//     |<-- Confirm {token_B} ---------------|
//     |============ PMK ====================|
//
// The exchange is symmetric: neither side is initiator or responder.

pub mod messages;
pub mod protocol;
pub mod state;

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use messages::{Commit, Confirm};
pub use protocol::HandshakeSession;
pub use state::{Committed, Created, HandshakeState, SecretComputed};

/// The 32-byte Pairwise Master Key produced by a confirmed handshake.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Pmk([u8; 32]);

impl Pmk {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl PartialEq for Pmk {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for Pmk {}

impl fmt::Debug for Pmk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pmk(..)")
    }
}
