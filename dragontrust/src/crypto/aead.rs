// Post-handshake payload protection keyed by the PMK.
//
// Suite IDs carried in sealed payloads:
//   0x0001 DRAGONFLY_AES256GCM_SHA256
//   0x0002 DRAGONFLY_CHACHA20POLY1305_SHA256

// Both aes-gcm and chacha20poly1305 re-export the same `aead` traits.
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce as AesNonce};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::kdf::derive_payload_key;
use crate::error::{DragonflyError, Result};
use crate::handshake::Pmk;

/// Cipher suite identifier (wire value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CipherSuite {
    /// AES-256-GCM — suite ID 0x0001.
    #[default]
    Aes256Gcm,
    /// ChaCha20-Poly1305 — suite ID 0x0002.
    #[serde(rename = "chacha20_poly1305")]
    ChaCha20Poly1305,
}

impl CipherSuite {
    /// Wire ID carried in sealed payloads.
    pub fn wire_id(self) -> u16 {
        match self {
            CipherSuite::Aes256Gcm => 0x0001,
            CipherSuite::ChaCha20Poly1305 => 0x0002,
        }
    }

    /// Resolve from a wire ID.
    pub fn from_wire_id(id: u16) -> Option<Self> {
        match id {
            0x0001 => Some(CipherSuite::Aes256Gcm),
            0x0002 => Some(CipherSuite::ChaCha20Poly1305),
            _ => None,
        }
    }
}

/// One-shot AEAD over the payload key. Dispatches on the suite.
enum AeadKey {
    ChaCha20Poly1305(Zeroizing<[u8; 32]>),
    Aes256Gcm(Zeroizing<[u8; 32]>),
}

impl AeadKey {
    fn new(suite: CipherSuite, key: Zeroizing<[u8; 32]>) -> Self {
        match suite {
            CipherSuite::ChaCha20Poly1305 => AeadKey::ChaCha20Poly1305(key),
            CipherSuite::Aes256Gcm => AeadKey::Aes256Gcm(key),
        }
    }

    fn encrypt(&self, nonce: &[u8; 12], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let payload = Payload { msg: plaintext, aad };
        match self {
            AeadKey::ChaCha20Poly1305(key) => {
                let cipher = ChaCha20Poly1305::new_from_slice(key.as_slice())
                    .map_err(|e| DragonflyError::Encryption(format!("cipher init: {e}")))?;
                cipher
                    .encrypt(Nonce::from_slice(nonce), payload)
                    .map_err(|e| DragonflyError::Encryption(format!("{e}")))
            }
            AeadKey::Aes256Gcm(key) => {
                let cipher = Aes256Gcm::new_from_slice(key.as_slice())
                    .map_err(|e| DragonflyError::Encryption(format!("aes-gcm init: {e}")))?;
                cipher
                    .encrypt(AesNonce::from_slice(nonce), payload)
                    .map_err(|e| DragonflyError::Encryption(format!("{e}")))
            }
        }
    }

    fn decrypt(&self, nonce: &[u8; 12], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let payload = Payload {
            msg: ciphertext,
            aad,
        };
        match self {
            AeadKey::ChaCha20Poly1305(key) => {
                let cipher = ChaCha20Poly1305::new_from_slice(key.as_slice())
                    .map_err(|e| DragonflyError::Decryption(format!("cipher init: {e}")))?;
                cipher
                    .decrypt(Nonce::from_slice(nonce), payload)
                    .map_err(|e| DragonflyError::Decryption(format!("{e}")))
            }
            AeadKey::Aes256Gcm(key) => {
                let cipher = Aes256Gcm::new_from_slice(key.as_slice())
                    .map_err(|e| DragonflyError::Decryption(format!("aes-gcm init: {e}")))?;
                cipher
                    .decrypt(AesNonce::from_slice(nonce), payload)
                    .map_err(|e| DragonflyError::Decryption(format!("{e}")))
            }
        }
    }
}

/// A payload encrypted under a PMK-derived key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub suite: CipherSuite,
    pub nonce: [u8; 12],
    /// Ciphertext with the 16-byte tag appended.
    pub ciphertext: Vec<u8>,
}

/// Encrypt `plaintext` under the payload key derived from `pmk`, with a fresh
/// random nonce.
pub fn seal(pmk: &Pmk, suite: CipherSuite, plaintext: &[u8], aad: &[u8]) -> Result<SealedPayload> {
    let mut nonce = [0u8; 12];
    OsRng.fill_bytes(&mut nonce);
    seal_with_nonce(pmk, suite, nonce, plaintext, aad)
}

/// Deterministic variant of [`seal`]; the caller guarantees nonce uniqueness.
pub fn seal_with_nonce(
    pmk: &Pmk,
    suite: CipherSuite,
    nonce: [u8; 12],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<SealedPayload> {
    let key = AeadKey::new(suite, derive_payload_key(pmk.as_bytes())?);
    let ciphertext = key.encrypt(&nonce, plaintext, aad)?;
    Ok(SealedPayload {
        suite,
        nonce,
        ciphertext,
    })
}

/// Verify and decrypt a sealed payload.
pub fn open(pmk: &Pmk, sealed: &SealedPayload, aad: &[u8]) -> Result<Vec<u8>> {
    let key = AeadKey::new(sealed.suite, derive_payload_key(pmk.as_bytes())?);
    key.decrypt(&sealed.nonce, &sealed.ciphertext, aad)
}
