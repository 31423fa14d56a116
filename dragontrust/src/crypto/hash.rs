// SHA-256 hashing and fixed-width transcript assembly.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::math::to_fixed_be;

/// SHA-256 hash of `data`, returning a 32-byte digest.
pub fn hash_sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// Incremental SHA-256 over a sequence of protocol fields.
///
/// Integers are absorbed at a caller-chosen fixed width so that the two peers
/// hash byte-identical strings regardless of leading zeros.
pub struct Transcript {
    hasher: Sha256,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.hasher.update(data);
        self
    }

    pub fn integer(mut self, value: &BigUint, width: usize) -> Self {
        self.hasher.update(to_fixed_be(value, width));
        self
    }

    pub fn finish(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.hasher.finalize());
        out
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
