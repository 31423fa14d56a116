// Integration tests for the DragonTrust crypto layer.

use num_bigint::BigUint;

use dragontrust::crypto::aead::{open, seal, seal_with_nonce, CipherSuite};
use dragontrust::crypto::hash::{hash_sha256, Transcript};
use dragontrust::crypto::kdf::{derive_payload_key, expand_bits, HUNTING_AND_PECKING_LABEL};
use dragontrust::math::params::{brainpool_p256r1, textbook17};
use dragontrust::{DragonflyError, HandshakeSession, Identity, PasswordElement, Pmk, SessionConfig};

fn ids() -> (Identity, Identity) {
    (
        Identity::new("44:67:2d:2c:91:a6").unwrap(),
        Identity::new("44:37:2c:2f:91:36").unwrap(),
    )
}

fn handshake_pmk() -> Pmk {
    let (a, b) = ids();
    let config = SessionConfig::default();
    let mut sa = HandshakeSession::new(&config, b"abc1238", a.clone(), b.clone()).unwrap();
    let mut sb = HandshakeSession::new(&config, b"abc1238", b, a).unwrap();
    let ca = sa.commit().unwrap();
    let cb = sb.commit().unwrap();
    let ta = sa.compute_shared_secret(&cb).unwrap();
    let tb = sb.compute_shared_secret(&ca).unwrap();
    let pmk = sa.confirm(&tb).unwrap();
    assert_eq!(pmk, sb.confirm(&ta).unwrap());
    pmk
}

// ── SHA-256 and transcripts ──────────────────────────────────────────────

#[test]
fn sha256_known_vector() {
    let digest = hash_sha256(b"abc");
    assert_eq!(
        digest[..4],
        [0xba, 0x78, 0x16, 0xbf],
        "SHA-256(\"abc\") prefix"
    );
}

#[test]
fn transcript_matches_concatenation() {
    let mut concat = Vec::new();
    concat.extend_from_slice(b"id");
    concat.extend_from_slice(&[0, 0, 0, 7]);
    let t = Transcript::new()
        .bytes(b"id")
        .integer(&BigUint::from(7u32), 4)
        .finish();
    assert_eq!(t, hash_sha256(&concat));
}

#[test]
fn transcript_width_changes_digest() {
    let v = BigUint::from(1u32);
    let narrow = Transcript::new().integer(&v, 1).finish();
    let wide = Transcript::new().integer(&v, 32).finish();
    assert_ne!(narrow, wide);
}

// ── Key derivation ───────────────────────────────────────────────────────

#[test]
fn hunting_expansion_covers_field_plus_margin() {
    let curve = brainpool_p256r1();
    let bits = curve.p().bits() + 64;
    let v = expand_bits(&hash_sha256(b"base"), HUNTING_AND_PECKING_LABEL, bits).unwrap();
    assert!(v.bits() <= bits);
    // 320 random bits land above p with overwhelming probability.
    assert!(&v > curve.p());
}

#[test]
fn payload_key_depends_on_pmk() {
    let a = derive_payload_key(&[1u8; 32]).unwrap();
    let b = derive_payload_key(&[2u8; 32]).unwrap();
    assert_ne!(*a, *b);
}

// ── Password element ─────────────────────────────────────────────────────

#[test]
fn password_element_is_symmetric_on_both_curves() {
    let (a, b) = ids();
    for curve in [brainpool_p256r1(), textbook17()] {
        let pe_ab = PasswordElement::derive(curve, b"abc1238", &a, &b, 40).unwrap();
        let pe_ba = PasswordElement::derive(curve, b"abc1238", &b, &a, 40).unwrap();
        assert_eq!(pe_ab, pe_ba, "{}", curve.name());
        assert!(curve.is_on_curve(pe_ab.point()));
        assert!(!pe_ab.point().is_infinity());
    }
}

#[test]
fn password_element_depends_on_identities() {
    let curve = brainpool_p256r1();
    let (a, b) = ids();
    let c = Identity::new("44:37:2c:2f:91:37").unwrap();
    let pe_ab = PasswordElement::derive(curve, b"abc1238", &a, &b, 40).unwrap();
    let pe_ac = PasswordElement::derive(curve, b"abc1238", &a, &c, 40).unwrap();
    assert_ne!(pe_ab, pe_ac);
}

// ── Payload protection ───────────────────────────────────────────────────

#[test]
fn payload_roundtrip_under_handshake_pmk() {
    let pmk = handshake_pmk();
    for suite in [CipherSuite::Aes256Gcm, CipherSuite::ChaCha20Poly1305] {
        let sealed = seal(&pmk, suite, b"cloud key material", b"hdr").unwrap();
        assert_eq!(sealed.ciphertext.len(), b"cloud key material".len() + 16);
        assert_eq!(open(&pmk, &sealed, b"hdr").unwrap(), b"cloud key material");
    }
}

#[test]
fn empty_payload_roundtrip() {
    let pmk = Pmk::from_bytes([9u8; 32]);
    let sealed = seal(&pmk, CipherSuite::Aes256Gcm, b"", b"").unwrap();
    assert_eq!(sealed.ciphertext.len(), 16);
    assert!(open(&pmk, &sealed, b"").unwrap().is_empty());
}

#[test]
fn random_nonces_differ() {
    let pmk = Pmk::from_bytes([3u8; 32]);
    let a = seal(&pmk, CipherSuite::ChaCha20Poly1305, b"m", b"").unwrap();
    let b = seal(&pmk, CipherSuite::ChaCha20Poly1305, b"m", b"").unwrap();
    assert_ne!(a.nonce, b.nonce);
    assert_ne!(a.ciphertext, b.ciphertext);
}

#[test]
fn other_pmk_cannot_open() {
    let sealed =
        seal_with_nonce(&handshake_pmk(), CipherSuite::Aes256Gcm, [0u8; 12], b"x", b"").unwrap();
    assert!(matches!(
        open(&Pmk::from_bytes([0u8; 32]), &sealed, b""),
        Err(DragonflyError::Decryption(_))
    ));
}

#[test]
fn pmk_debug_is_redacted() {
    let pmk = Pmk::from_bytes([0xAB; 32]);
    let shown = format!("{pmk:?}");
    assert!(!shown.contains("171"));
    assert!(!shown.to_lowercase().contains("ab"));
}
