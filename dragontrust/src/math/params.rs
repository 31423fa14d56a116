// Built-in curve parameters.
//
// brainpoolP256r1 (RFC 5639 §3.4) is the protocol default. The textbook curve
// y² = x³ + 2x + 2 over F_17 has prime group order 19 and is small enough to
// enumerate exhaustively in tests.

use std::sync::OnceLock;

use num_bigint::BigUint;

use crate::math::Curve;

const BRAINPOOL_P256R1_P: &str = "A9FB57DBA1EEA9BC3E660A909D838D726E3BF623D52620282013481D1F6E5377";
const BRAINPOOL_P256R1_A: &str = "7D5A0975FC2C3057EEF67530417AFFE7FB8055C126DC5C6CE94A4B44F330B5D9";
const BRAINPOOL_P256R1_B: &str = "26DC5C6CE94A4B44F330B5D9BBD77CBF958416295CF7E1CE6BCCDC18FF8C07B6";
const BRAINPOOL_P256R1_Q: &str = "A9FB57DBA1EEA9BC3E660A909D838D718C397AA3B561A6F7901E0E82974856A7";

/// Affine base point of brainpoolP256r1. Dragonfly never uses it; it is kept
/// for arithmetic checks against a point of known order.
pub const BRAINPOOL_P256R1_GX: &str =
    "8BD2AEB9CB7E57CB2C4B482FFC81B7AFB9DE27E1E3BD23C23A4453BD9ACE3262";
pub const BRAINPOOL_P256R1_GY: &str =
    "547EF835C3DAC4FD97F8461A14611DC9C27745132DED8E545C1D54C72F046997";

static BRAINPOOL_P256R1: OnceLock<Curve> = OnceLock::new();
static TEXTBOOK17: OnceLock<Curve> = OnceLock::new();

/// Parse a hex constant known at compile time.
pub(crate) fn hex_constant(hex: &str) -> BigUint {
    BigUint::parse_bytes(hex.as_bytes(), 16).unwrap_or_default()
}

fn build(name: &str, a: BigUint, b: BigUint, p: BigUint, q: BigUint) -> Curve {
    match Curve::new(name, a, b, p, q) {
        Ok(curve) => curve,
        Err(e) => unreachable!("built-in curve {name} rejected: {e}"),
    }
}

/// brainpoolP256r1, cofactor 1.
pub fn brainpool_p256r1() -> &'static Curve {
    BRAINPOOL_P256R1.get_or_init(|| {
        build(
            "brainpoolP256r1",
            hex_constant(BRAINPOOL_P256R1_A),
            hex_constant(BRAINPOOL_P256R1_B),
            hex_constant(BRAINPOOL_P256R1_P),
            hex_constant(BRAINPOOL_P256R1_Q),
        )
    })
}

/// y² = x³ + 2x + 2 over F_17, group order 19.
pub fn textbook17() -> &'static Curve {
    TEXTBOOK17.get_or_init(|| {
        build(
            "textbook17",
            BigUint::from(2u32),
            BigUint::from(2u32),
            BigUint::from(17u32),
            BigUint::from(19u32),
        )
    })
}
