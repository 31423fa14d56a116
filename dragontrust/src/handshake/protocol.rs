// Dragonfly session: drives one peer's side of the commit/confirm exchange.
//
// Both peers run the same sequence:
//
//   commit() -> send Commit
//   compute_shared_secret(peer Commit) -> send Confirm
//   confirm(peer Confirm) -> Pmk

use std::mem;

use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{DragonflyError, Result};
use crate::handshake::messages::{Commit, Confirm};
use crate::handshake::state::{Committed, Created, HandshakeState};
use crate::handshake::Pmk;
use crate::hunting::PasswordElement;
use crate::identity::Identity;
use crate::math::Curve;

/// One side of a Dragonfly handshake.
#[derive(Debug)]
pub struct HandshakeSession {
    state: HandshakeState,
}

impl HandshakeSession {
    /// Validate `config` and derive the password element for `local` talking
    /// to `peer`.
    pub fn new(
        config: &SessionConfig,
        password: &[u8],
        local: Identity,
        peer: Identity,
    ) -> Result<Self> {
        config.validate()?;
        let curve = config.curve();
        let pe = PasswordElement::derive(curve, password, &local, &peer, config.max_iterations)?;
        info!(local = %local, peer = %peer, curve = curve.name(), "session created");
        Ok(Self::from_parts(curve.clone(), pe, local, peer))
    }

    /// Build a session from an already derived password element.
    pub fn from_parts(curve: Curve, pe: PasswordElement, local: Identity, peer: Identity) -> Self {
        Self {
            state: HandshakeState::Created(Created::new(curve, pe, local, peer)),
        }
    }

    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    pub fn label(&self) -> &'static str {
        self.state.label()
    }

    /// The PMK, once the peer's confirmation has been verified.
    pub fn pmk(&self) -> Option<&Pmk> {
        match &self.state {
            HandshakeState::Confirmed(pmk) => Some(pmk),
            _ => None,
        }
    }

    /// Produce the local commit with secrets drawn from the OS RNG.
    pub fn commit(&mut self) -> Result<Commit> {
        self.commit_with_rng(&mut OsRng)
    }

    /// Produce the local commit with secrets drawn from `rng`.
    ///
    /// On [`DragonflyError::DegenerateScalar`] the session stays `Created` and
    /// the call may simply be repeated.
    pub fn commit_with_rng<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<Commit> {
        self.commit_via(|created| created.commit(rng))
    }

    /// Produce the local commit from caller-chosen `private` and `mask`.
    pub fn commit_with_secrets(&mut self, private: BigUint, mask: BigUint) -> Result<Commit> {
        self.commit_via(|created| created.commit_with_secrets(private, mask))
    }

    fn commit_via<F>(&mut self, f: F) -> Result<Commit>
    where
        F: FnOnce(&Created) -> Result<Committed>,
    {
        let created = match &self.state {
            HandshakeState::Created(created) => created,
            other => return Err(transition_error(other, "Committed")),
        };

        match f(created) {
            Ok(committed) => {
                let message = committed.message();
                self.state = HandshakeState::Committed(committed);
                Ok(message)
            }
            Err(DragonflyError::DegenerateScalar) => Err(DragonflyError::DegenerateScalar),
            Err(e) => {
                warn!(error = %e, "commit failed, session aborted");
                self.state = HandshakeState::Aborted;
                Err(e)
            }
        }
    }

    /// Process the peer's commit and produce the local confirmation.
    pub fn compute_shared_secret(&mut self, peer: &Commit) -> Result<Confirm> {
        let committed = match mem::replace(&mut self.state, HandshakeState::Aborted) {
            HandshakeState::Committed(committed) => committed,
            other => {
                let err = transition_error(&other, "SecretComputed");
                self.state = other;
                return Err(err);
            }
        };

        // Any failure past this point leaves the session Aborted.
        let computed = committed.compute_shared_secret(peer)?;
        let message = computed.message();
        self.state = HandshakeState::SecretComputed(computed);
        Ok(message)
    }

    /// Verify the peer's confirmation and release the PMK.
    pub fn confirm(&mut self, peer: &Confirm) -> Result<Pmk> {
        let computed = match mem::replace(&mut self.state, HandshakeState::Aborted) {
            HandshakeState::SecretComputed(computed) => computed,
            other => {
                let err = transition_error(&other, "Confirmed");
                self.state = other;
                return Err(err);
            }
        };

        let pmk = computed.confirm(peer)?;
        debug!("handshake confirmed");
        self.state = HandshakeState::Confirmed(pmk.clone());
        Ok(pmk)
    }
}

fn transition_error(from: &HandshakeState, to: &str) -> DragonflyError {
    DragonflyError::SessionState {
        from: from.label().into(),
        to: to.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CurveId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn textbook_config() -> SessionConfig {
        SessionConfig {
            curve: CurveId::Textbook17,
            ..SessionConfig::default()
        }
    }

    fn pair(config: &SessionConfig, pw_a: &[u8], pw_b: &[u8]) -> (HandshakeSession, HandshakeSession) {
        let a = Identity::new("alice").unwrap();
        let b = Identity::new("bob").unwrap();
        (
            HandshakeSession::new(config, pw_a, a.clone(), b.clone()).unwrap(),
            HandshakeSession::new(config, pw_b, b, a).unwrap(),
        )
    }

    /// Commit both sides, redrawing on the tiny curve's frequent degenerate scalars.
    fn commit_retrying(session: &mut HandshakeSession, rng: &mut StdRng) -> Commit {
        loop {
            match session.commit_with_rng(rng) {
                Ok(commit) => return commit,
                Err(DragonflyError::DegenerateScalar) => continue,
                Err(e) => panic!("commit failed: {e}"),
            }
        }
    }

    #[test]
    fn brainpool_handshake_agrees() {
        let (mut a, mut b) = pair(&SessionConfig::default(), b"abc1238", b"abc1238");
        let ca = a.commit().unwrap();
        let cb = b.commit().unwrap();
        let ta = a.compute_shared_secret(&cb).unwrap();
        let tb = b.compute_shared_secret(&ca).unwrap();
        let pa = a.confirm(&tb).unwrap();
        let pb = b.confirm(&ta).unwrap();
        assert_eq!(pa, pb);
        assert_eq!(a.label(), "Confirmed");
        assert_eq!(a.pmk(), Some(&pa));
    }

    #[test]
    fn confirm_before_commit_is_rejected() {
        let (mut a, _) = pair(&textbook_config(), b"pw", b"pw");
        let err = a.confirm(&Confirm { token: [0u8; 32] }).unwrap_err();
        assert!(matches!(err, DragonflyError::SessionState { .. }));
        assert_eq!(a.label(), "Created");
    }

    #[test]
    fn double_commit_is_rejected() {
        let mut rng = StdRng::seed_from_u64(7);
        let (mut a, _) = pair(&textbook_config(), b"pw", b"pw");
        commit_retrying(&mut a, &mut rng);
        let err = a.commit_with_rng(&mut rng).unwrap_err();
        assert!(matches!(err, DragonflyError::SessionState { .. }));
        assert_eq!(a.label(), "Committed");
    }

    #[test]
    fn degenerate_secrets_keep_session_created() {
        let (mut a, _) = pair(&textbook_config(), b"pw", b"pw");
        // 3 + 16 = 19 ≡ 0 (mod 19)
        let err = a
            .commit_with_secrets(BigUint::from(3u32), BigUint::from(16u32))
            .unwrap_err();
        assert!(matches!(err, DragonflyError::DegenerateScalar));
        assert_eq!(a.label(), "Created");
        a.commit_with_secrets(BigUint::from(3u32), BigUint::from(5u32))
            .unwrap();
        assert_eq!(a.label(), "Committed");
    }

    #[test]
    fn reflected_commit_aborts() {
        let mut rng = StdRng::seed_from_u64(11);
        let (mut a, _) = pair(&textbook_config(), b"pw", b"pw");
        let ca = commit_retrying(&mut a, &mut rng);
        let err = a.compute_shared_secret(&ca).unwrap_err();
        assert!(matches!(err, DragonflyError::ReflectionAttack));
        assert_eq!(a.label(), "Aborted");
        assert!(a.pmk().is_none());
    }

    #[test]
    fn password_mismatch_never_yields_pmk() {
        let (mut a, mut b) = pair(&SessionConfig::default(), b"right", b"wrong");
        let ca = a.commit().unwrap();
        let cb = b.commit().unwrap();
        let ta = a.compute_shared_secret(&cb).unwrap();
        let tb = b.compute_shared_secret(&ca).unwrap();
        assert!(matches!(a.confirm(&tb), Err(DragonflyError::TokenMismatch)));
        assert!(matches!(b.confirm(&ta), Err(DragonflyError::TokenMismatch)));
        assert!(a.pmk().is_none());
        assert_eq!(b.label(), "Aborted");
    }
}
