// Handshake phases.
//
// Each phase is a value that owns exactly the secrets it still needs and is
// consumed by the transition to the next one, so a later phase cannot be
// reached without going through the earlier ones:
//
//   Created --commit--> Committed --compute_shared_secret--> SecretComputed --confirm--> Pmk

use std::fmt;

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::crypto::hash::Transcript;
use crate::error::{DragonflyError, Result};
use crate::handshake::messages::{Commit, Confirm};
use crate::handshake::Pmk;
use crate::hunting::PasswordElement;
use crate::identity::Identity;
use crate::math::{random_in_range, to_fixed_be, Curve, Point};

/// Session-wide values fixed before the first phase.
#[derive(Debug, Clone)]
struct SessionContext {
    curve: Curve,
    pe: PasswordElement,
    local: Identity,
    peer: Identity,
}

/// The state of a [`HandshakeSession`](crate::handshake::HandshakeSession).
#[derive(Debug)]
pub enum HandshakeState {
    /// Password element derived, nothing sent yet.
    Created(Created),

    /// Local commit produced; waiting for the peer's commit.
    Committed(Committed),

    /// Shared secret computed and local token produced; waiting for the peer's token.
    SecretComputed(SecretComputed),

    /// Peer token verified and PMK derived.
    Confirmed(Pmk),

    /// A phase failed. The session must be discarded.
    Aborted,
}

impl HandshakeState {
    /// Human-readable label for the current state (used in error messages).
    pub fn label(&self) -> &'static str {
        match self {
            HandshakeState::Created(_) => "Created",
            HandshakeState::Committed(_) => "Committed",
            HandshakeState::SecretComputed(_) => "SecretComputed",
            HandshakeState::Confirmed(_) => "Confirmed",
            HandshakeState::Aborted => "Aborted",
        }
    }
}

// ── Created ──────────────────────────────────────────────────────────────

/// Start of a session: curve, password element and both identities.
#[derive(Debug, Clone)]
pub struct Created {
    ctx: SessionContext,
}

impl Created {
    pub fn new(curve: Curve, pe: PasswordElement, local: Identity, peer: Identity) -> Self {
        Self {
            ctx: SessionContext {
                curve,
                pe,
                local,
                peer,
            },
        }
    }

    pub fn curve(&self) -> &Curve {
        &self.ctx.curve
    }

    pub fn password_element(&self) -> &PasswordElement {
        &self.ctx.pe
    }

    /// Draw fresh `private` and `mask` in `[1, p)` and commit to them.
    ///
    /// Borrows rather than consumes: a [`DragonflyError::DegenerateScalar`]
    /// leaves this phase intact so the caller can simply call `commit` again.
    pub fn commit<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<Committed> {
        let p = self.ctx.curve.p();
        let private = random_in_range(rng, p);
        let mask = random_in_range(rng, p);
        self.commit_with_secrets(private, mask)
    }

    /// Commit with caller-chosen secrets (deterministic vectors and tests).
    ///
    /// `mask` is consumed here and dropped before this returns; it is never
    /// stored in any phase.
    pub fn commit_with_secrets(&self, private: BigUint, mask: BigUint) -> Result<Committed> {
        let curve = &self.ctx.curve;

        let scalar = (&private + &mask) % curve.q();
        if scalar < BigUint::from(2u32) {
            debug!("degenerate commit scalar, secrets must be redrawn");
            return Err(DragonflyError::DegenerateScalar);
        }

        let masked = curve.scalar_mul(&mask, self.ctx.pe.point())?;
        drop(mask);
        if masked.is_infinity() {
            debug!("mask is a multiple of the subgroup order, secrets must be redrawn");
            return Err(DragonflyError::DegenerateScalar);
        }
        let element = curve.negate(&masked);

        debug!(local = %self.ctx.local, "commit produced");
        Ok(Committed {
            ctx: self.ctx.clone(),
            private,
            scalar,
            element,
        })
    }
}

// ── Committed ────────────────────────────────────────────────────────────

/// Local commit sent; holds `private`, `scalar` and `element`.
pub struct Committed {
    ctx: SessionContext,
    private: BigUint,
    scalar: BigUint,
    element: Point,
}

impl Committed {
    /// The commit to send to the peer.
    pub fn message(&self) -> Commit {
        Commit {
            scalar: self.scalar.clone(),
            element: self.element.clone(),
        }
    }

    pub fn scalar(&self) -> &BigUint {
        &self.scalar
    }

    pub fn element(&self) -> &Point {
        &self.element
    }

    /// Validate the peer's commit, derive the shared value `k` and the local
    /// confirmation token.
    ///
    /// ```text
    /// K     = private · (peer_scalar · PE + peer_element)
    /// k     = K.x
    /// token = SHA-256(k || scalar || peer_scalar || element.x || peer_element.x || local_id)
    /// ```
    pub fn compute_shared_secret(self, peer: &Commit) -> Result<SecretComputed> {
        let curve = &self.ctx.curve;

        if peer.element.is_infinity() || !curve.is_on_curve(&peer.element) {
            warn!(peer = %self.ctx.peer, "peer element rejected");
            return Err(DragonflyError::InvalidPeerElement);
        }
        if peer.scalar < BigUint::from(2u32) || &peer.scalar >= curve.q() {
            warn!(peer = %self.ctx.peer, "peer scalar out of range");
            return Err(DragonflyError::InvalidPeerScalar);
        }
        if peer.scalar == self.scalar && curve.same_point(&peer.element, &self.element) {
            warn!(peer = %self.ctx.peer, "peer reflected our commit, aborting");
            return Err(DragonflyError::ReflectionAttack);
        }

        let z = curve.scalar_mul(&peer.scalar, self.ctx.pe.point())?;
        let zz = curve.add(&peer.element, &z)?;
        let shared = curve.scalar_mul(&self.private, &zz)?;
        let k = shared.x().ok_or(DragonflyError::InvalidPeerElement)?;

        let field_len = curve.field_len();
        let scalar_len = curve.scalar_len();
        let k = Zeroizing::new(to_fixed_be(k, field_len));

        let element_x = self.element.x().ok_or(DragonflyError::InvalidPoint)?;
        let peer_element_x = peer.element.x().ok_or(DragonflyError::InvalidPeerElement)?;

        let token = Transcript::new()
            .bytes(&k)
            .integer(&self.scalar, scalar_len)
            .integer(&peer.scalar, scalar_len)
            .integer(element_x, field_len)
            .integer(peer_element_x, field_len)
            .bytes(self.ctx.local.as_bytes())
            .finish();

        debug!(peer = %self.ctx.peer, "shared secret computed");
        Ok(SecretComputed {
            ctx: self.ctx,
            scalar: self.scalar,
            element: self.element,
            peer_scalar: peer.scalar.clone(),
            peer_element: peer.element.clone(),
            k,
            token,
        })
    }
}

impl fmt::Debug for Committed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Committed")
            .field("peer", &self.ctx.peer)
            .field("scalar", &self.scalar)
            .finish_non_exhaustive()
    }
}

// ── SecretComputed ───────────────────────────────────────────────────────

/// Shared value `k` known; local token sent.
pub struct SecretComputed {
    ctx: SessionContext,
    scalar: BigUint,
    element: Point,
    peer_scalar: BigUint,
    peer_element: Point,
    k: Zeroizing<Vec<u8>>,
    token: [u8; 32],
}

impl SecretComputed {
    /// The confirmation to send to the peer.
    pub fn message(&self) -> Confirm {
        Confirm { token: self.token }
    }

    /// Verify the peer's token and derive the PMK.
    ///
    /// The expected token swaps every local/peer pair relative to our own
    /// token, so each side reproduces exactly what the other one hashed. A
    /// mismatch never releases a PMK.
    ///
    /// ```text
    /// expected = SHA-256(k || peer_scalar || scalar || peer_element.x || element.x || peer_id)
    /// PMK      = SHA-256(k || (scalar + peer_scalar) mod q)
    /// ```
    pub fn confirm(self, peer: &Confirm) -> Result<Pmk> {
        let curve = &self.ctx.curve;
        let field_len = curve.field_len();
        let scalar_len = curve.scalar_len();

        let element_x = self.element.x().ok_or(DragonflyError::InvalidPoint)?;
        let peer_element_x = self
            .peer_element
            .x()
            .ok_or(DragonflyError::InvalidPeerElement)?;

        let expected = Transcript::new()
            .bytes(&self.k)
            .integer(&self.peer_scalar, scalar_len)
            .integer(&self.scalar, scalar_len)
            .integer(peer_element_x, field_len)
            .integer(element_x, field_len)
            .bytes(self.ctx.peer.as_bytes())
            .finish();

        if !bool::from(expected[..].ct_eq(&peer.token[..])) {
            warn!(peer = %self.ctx.peer, "peer confirmation token mismatch");
            return Err(DragonflyError::TokenMismatch);
        }

        let sum = (&self.scalar + &self.peer_scalar) % curve.q();
        let pmk = Transcript::new()
            .bytes(&self.k)
            .integer(&sum, scalar_len)
            .finish();

        debug!(peer = %self.ctx.peer, "peer token verified");
        Ok(Pmk::from_bytes(pmk))
    }
}

impl fmt::Debug for SecretComputed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretComputed")
            .field("peer", &self.ctx.peer)
            .field("scalar", &self.scalar)
            .field("peer_scalar", &self.peer_scalar)
            .finish_non_exhaustive()
    }
}
