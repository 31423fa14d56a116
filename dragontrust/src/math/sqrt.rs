// Quadratic residuosity and modular square roots (Tonelli–Shanks).

use num_bigint::BigUint;
use num_traits::One;

use crate::error::{DragonflyError, Result};

/// Euler's criterion: `v^((p-1)/2) mod p == 1`.
///
/// Zero is reported as a non-residue, since the criterion yields 0 for it.
/// Nothing is a residue modulo a value that is not an odd prime candidate
/// (`p < 3` or even).
pub fn is_quadratic_residue(v: &BigUint, p: &BigUint) -> bool {
    if !is_odd_modulus(p) {
        return false;
    }
    let exponent = (p - 1u32) >> 1u32;
    (v % p).modpow(&exponent, p).is_one()
}

/// Solve `r² ≡ n (mod p)` for an odd prime `p`.
///
/// Returns one root `r`; the other is `p - r`. Fails with
/// [`DragonflyError::InvalidModulus`] for `p < 3` or even `p`, and with
/// [`DragonflyError::NotAResidue`] when `n` has no root.
pub fn sqrt_mod(n: &BigUint, p: &BigUint) -> Result<BigUint> {
    if !is_odd_modulus(p) {
        return Err(DragonflyError::InvalidModulus);
    }
    let n = n % p;
    if !is_quadratic_residue(&n, p) {
        return Err(DragonflyError::NotAResidue);
    }

    // p ≡ 3 (mod 4): r = n^((p+1)/4)
    if (p % 4u32) == BigUint::from(3u32) {
        let exponent = (p + 1u32) >> 2u32;
        return Ok(n.modpow(&exponent, p));
    }

    // p - 1 = q · 2^s with q odd
    let p_minus_one = p - 1u32;
    let s = p_minus_one.trailing_zeros().unwrap_or(0);
    let q = &p_minus_one >> s;

    // Any non-residue works as the generator of the 2-Sylow subgroup.
    let mut z = BigUint::from(2u32);
    while is_quadratic_residue(&z, p) {
        z += 1u32;
    }

    let mut m = s;
    let mut c = z.modpow(&q, p);
    let mut t = n.modpow(&q, p);
    let mut r = n.modpow(&((&q + 1u32) >> 1u32), p);

    while !t.is_one() {
        // Least i in (0, m) with t^(2^i) == 1.
        let mut i = 0u64;
        let mut t2 = t.clone();
        while !t2.is_one() {
            t2 = &t2 * &t2 % p;
            i += 1;
            if i == m {
                return Err(DragonflyError::NotAResidue);
            }
        }

        let b = c.modpow(&(BigUint::one() << (m - i - 1)), p);
        r = r * &b % p;
        c = &b * &b % p;
        t = t * &c % p;
        m = i;
    }

    Ok(r)
}

fn is_odd_modulus(p: &BigUint) -> bool {
    p.bit(0) && p > &BigUint::one()
}
