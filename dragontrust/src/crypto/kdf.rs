// HKDF-SHA-256 expansions used by the handshake and the payload layer.

use hkdf::Hkdf;
use num_bigint::BigUint;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{DragonflyError, Result};

/// Label mixed into every hunting-and-pecking expansion.
pub const HUNTING_AND_PECKING_LABEL: &[u8] = b"Dragonfly Hunting And Pecking";

/// Label for the key that protects post-handshake payloads.
pub const PAYLOAD_KEY_LABEL: &[u8] = b"dragonfly payload key";

/// Expand `ikm` under `label` into an integer of exactly `bits` bits.
///
/// ```text
/// okm   = HKDF-Expand(HKDF-Extract(salt=none, ikm), label, ceil(bits / 8))
/// value = big-endian(okm) >> (8 * len(okm) - bits)
/// ```
pub fn expand_bits(ikm: &[u8], label: &[u8], bits: u64) -> Result<BigUint> {
    let len = ((bits + 7) / 8) as usize;
    let excess = len as u64 * 8 - bits;

    let hk = Hkdf::<Sha256>::new(None, ikm);
    let mut okm = Zeroizing::new(vec![0u8; len]);
    hk.expand(label, &mut okm)
        .map_err(|e| DragonflyError::KeyDerivation(format!("HKDF expand error: {e}")))?;

    Ok(BigUint::from_bytes_be(&okm) >> excess)
}

/// Derive the 32-byte payload key from a PMK.
pub fn derive_payload_key(pmk: &[u8; 32]) -> Result<Zeroizing<[u8; 32]>> {
    let hk = Hkdf::<Sha256>::new(None, pmk);
    let mut key = Zeroizing::new([0u8; 32]);
    hk.expand(PAYLOAD_KEY_LABEL, &mut *key)
        .map_err(|e| DragonflyError::KeyDerivation(format!("HKDF expand error: {e}")))?;
    Ok(key)
}
