// Values exchanged during the Dragonfly handshake.

use num_bigint::BigUint;

use crate::math::Point;

/// Commit exchange: each peer's scalar and element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// `(private + mask) mod q`, in `[2, q)`.
    pub scalar: BigUint,
    /// `-(mask · PE)`, a finite point on the curve.
    pub element: Point,
}

/// Confirm exchange: proof that the sender derived the same shared secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirm {
    /// SHA-256 over the shared secret and both commits, sender-first.
    pub token: [u8; 32],
}
