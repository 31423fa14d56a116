// Hunting and pecking: map a shared password and two peer identities onto a
// curve point both peers agree on.
//
//   base_c = SHA-256(max(idA, idB) || min(idA, idB) || password || c)
//   seed_c = (HKDF-Expand(base_c, label, bits(p) + 64) mod (p - 1)) + 1
//   PE     = (seed_c, sqrt(seed_c³ + a·seed_c + b)) for the first c that works
//
// Every counter is evaluated even after a hit, so the amount of work does not
// depend on which counter succeeds.

use num_bigint::BigUint;
use tracing::{debug, error, info};
use zeroize::Zeroizing;

use crate::crypto::hash::Transcript;
use crate::crypto::kdf::{expand_bits, HUNTING_AND_PECKING_LABEL};
use crate::error::{DragonflyError, Result};
use crate::identity::Identity;
use crate::math::{Curve, Point};

/// The password element: a finite curve point standing in for a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordElement {
    point: Point,
}

impl PasswordElement {
    /// Run hunting and pecking for counters `1..=max_iterations`.
    ///
    /// Both peers obtain the same point whichever of them is `local`.
    pub fn derive(
        curve: &Curve,
        password: &[u8],
        local: &Identity,
        peer: &Identity,
        max_iterations: u8,
    ) -> Result<Self> {
        let (high, low) = Identity::ordered(local, peer);
        let bits = curve.p().bits() + 64;
        let p_minus_one = curve.p() - 1u32;

        let mut chosen: Option<(u8, BigUint, bool)> = None;
        let mut candidates = 0u32;

        for counter in 1..=max_iterations {
            let base = Zeroizing::new(
                Transcript::new()
                    .bytes(high.as_bytes())
                    .bytes(low.as_bytes())
                    .bytes(password)
                    .bytes(&[counter])
                    .finish(),
            );
            let temp = expand_bits(&base[..], HUNTING_AND_PECKING_LABEL, bits)?;
            let seed = (temp % &p_minus_one) + 1u32;

            if curve.is_quadratic_residue(&curve.curve_equation(&seed)) {
                candidates += 1;
                debug!(counter, "password element candidate");
                if chosen.is_none() {
                    chosen = Some((counter, seed, base[31] & 1 == 1));
                }
            }
        }

        let Some((counter, x, base_is_odd)) = chosen else {
            error!(
                iterations = max_iterations,
                curve = curve.name(),
                "no password element found"
            );
            return Err(DragonflyError::NoValidPointFound {
                iterations: max_iterations,
            });
        };

        // Pick the root whose parity matches the winning base.
        let (root, other) = curve.lift_x(&x)?;
        let y = if root.bit(0) == base_is_odd { root } else { other };
        let point = curve.point(x, y)?;

        info!(
            counter,
            candidates,
            curve = curve.name(),
            "password element derived"
        );
        Ok(Self { point })
    }

    pub fn point(&self) -> &Point {
        &self.point
    }
}
