// Prime-field and elliptic-curve arithmetic.

pub mod curve;
pub mod params;
pub mod sqrt;

use num_bigint::BigUint;
use num_traits::Zero;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

pub use curve::{Curve, Point};
pub use sqrt::{is_quadratic_residue, sqrt_mod};

/// `(a - b) mod p` for values that may exceed `p`.
pub(crate) fn sub_mod(a: &BigUint, b: &BigUint, p: &BigUint) -> BigUint {
    let a = a % p;
    let b = b % p;
    if a >= b {
        a - b
    } else {
        p - (b - a)
    }
}

/// Number of bytes needed to hold any value below `modulus`.
pub fn byte_len(modulus: &BigUint) -> usize {
    ((modulus.bits() + 7) / 8) as usize
}

/// Big-endian encoding left-padded with zeros to exactly `len` bytes.
///
/// Values wider than `len` keep their low-order `len` bytes; callers only pass
/// values already reduced below the modulus `len` was computed from.
pub fn to_fixed_be(value: &BigUint, len: usize) -> Vec<u8> {
    let raw = value.to_bytes_be();
    let mut out = vec![0u8; len];
    if raw.len() >= len {
        out.copy_from_slice(&raw[raw.len() - len..]);
    } else {
        out[len - raw.len()..].copy_from_slice(&raw);
    }
    out
}

/// Draw a uniformly random integer in `[1, bound)` by rejection sampling.
pub fn random_in_range<R: RngCore + CryptoRng>(rng: &mut R, bound: &BigUint) -> BigUint {
    let bits = bound.bits();
    let len = ((bits + 7) / 8) as usize;
    let excess = len * 8 - bits as usize;

    loop {
        let mut buf = Zeroizing::new(vec![0u8; len]);
        rng.fill_bytes(&mut buf);
        buf[0] &= 0xFFu8 >> excess;
        let candidate = BigUint::from_bytes_be(&buf);
        if !candidate.is_zero() && &candidate < bound {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sub_mod_wraps() {
        let p = BigUint::from(17u32);
        assert_eq!(sub_mod(&BigUint::from(3u32), &BigUint::from(5u32), &p), BigUint::from(15u32));
        assert_eq!(sub_mod(&BigUint::from(5u32), &BigUint::from(3u32), &p), BigUint::from(2u32));
        assert_eq!(sub_mod(&BigUint::from(20u32), &BigUint::from(3u32), &p), BigUint::zero());
    }

    #[test]
    fn fixed_width_encoding_pads() {
        assert_eq!(to_fixed_be(&BigUint::from(0x0102u32), 4), vec![0, 0, 1, 2]);
        assert_eq!(to_fixed_be(&BigUint::zero(), 2), vec![0, 0]);
    }

    #[test]
    fn byte_len_rounds_up() {
        assert_eq!(byte_len(&BigUint::from(17u32)), 1);
        assert_eq!(byte_len(&BigUint::from(256u32)), 2);
        assert_eq!(byte_len(&BigUint::from(255u32)), 1);
    }

    #[test]
    fn random_values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let bound = BigUint::from(17u32);
        for _ in 0..500 {
            let v = random_in_range(&mut rng, &bound);
            assert!(!v.is_zero());
            assert!(v < bound);
        }
    }
}
