//! Run a complete Dragonfly handshake over a [`Transport`].
//!
//! ```text
//!   local                          peer
//!     |--- HELLO {identity} ------->|
//!     |<-- HELLO {identity} --------|   derive PE
//!     |--- COMMIT ----------------->|
//!     |<-- COMMIT ------------------|
//!     |--- CONFIRM ---------------->|
//!     |<-- CONFIRM -----------------|   verify, PMK
//! ```
//!
//! Both sides send before they receive, so the exchange is symmetric and
//! needs no initiator/responder roles. Any local failure is announced to the
//! peer with an ABORT frame on a best-effort basis.
//!
//! The big-integer work (hunting and pecking, the commit, `k` and the PMK)
//! runs on tokio's blocking pool so it never stalls the async workers.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use dragontrust::crypto::aead::{self, CipherSuite};
use dragontrust::{DragonflyError, HandshakeSession, Identity, Pmk, SessionConfig};

use crate::error::{DragonStreamError, Result};
use crate::frame::{AbortReason, Frame, FrameType};
use crate::transport::Transport;

/// How long to wait for each peer frame by default.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(30);

/// Wall-clock time spent in each phase of a handshake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandshakeTimings {
    /// Hunting and pecking.
    pub password_element: Duration,
    /// Drawing secrets and computing the local commit, retries included.
    pub commit: Duration,
    /// Validating the peer commit, computing `k` and the local token.
    pub shared_secret: Duration,
    /// Verifying the peer token and deriving the PMK.
    pub confirm: Duration,
    /// The whole exchange, network waits included.
    pub total: Duration,
}

/// Result of a successful handshake.
#[derive(Debug)]
pub struct HandshakeOutcome {
    pub pmk: Pmk,
    pub peer_identity: Identity,
    pub timings: HandshakeTimings,
}

/// Handshake runner with its session and transport settings.
#[derive(Debug, Clone)]
pub struct HandshakeDriver {
    config: SessionConfig,
    recv_timeout: Duration,
}

impl HandshakeDriver {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            recv_timeout: DEFAULT_RECV_TIMEOUT,
        }
    }

    /// Override the per-frame receive timeout.
    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn recv_timeout(&self) -> Duration {
        self.recv_timeout
    }

    /// Run the handshake as `local` with the shared `password`.
    pub async fn run<T>(
        &self,
        transport: &mut T,
        password: &[u8],
        local: Identity,
    ) -> Result<HandshakeOutcome>
    where
        T: Transport + ?Sized,
    {
        self.config.validate()?;

        match self.exchange(transport, password, local).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if let Some(reason) = abort_reason(&err) {
                    warn!(error = %err, code = reason.code(), "handshake failed, aborting");
                    // The peer may already be gone.
                    let _ = transport.send(&Frame::abort(reason)).await;
                } else {
                    warn!(error = %err, "handshake failed");
                }
                Err(err)
            }
        }
    }

    async fn exchange<T>(
        &self,
        transport: &mut T,
        password: &[u8],
        local: Identity,
    ) -> Result<HandshakeOutcome>
    where
        T: Transport + ?Sized,
    {
        let started = Instant::now();
        let mut timings = HandshakeTimings::default();

        transport
            .send(&Frame::Hello {
                identity: local.clone(),
            })
            .await?;
        let peer_identity = match self.recv(transport).await? {
            Frame::Hello { identity } => identity,
            other => return Err(unexpected(FrameType::Hello, &other)),
        };
        debug!(local = %local, peer = %peer_identity, "hello exchanged");

        let config = self.config.clone();
        let password = Zeroizing::new(password.to_vec());
        let peer = peer_identity.clone();
        let (mut session, commit, pe_time, commit_time) = blocking(move || {
            let phase = Instant::now();
            let mut session = HandshakeSession::new(&config, &password, local, peer)?;
            let pe_time = phase.elapsed();

            let phase = Instant::now();
            let commit = commit_with_retries(&mut session, config.commit_retries)?;
            Ok((session, commit, pe_time, phase.elapsed()))
        })
        .await?;
        timings.password_element = pe_time;
        timings.commit = commit_time;

        transport.send(&Frame::Commit(commit)).await?;
        let peer_commit = match self.recv(transport).await? {
            Frame::Commit(commit) => commit,
            other => return Err(unexpected(FrameType::Commit, &other)),
        };

        let (session, confirm, secret_time) = blocking(move || {
            let phase = Instant::now();
            let confirm = session.compute_shared_secret(&peer_commit)?;
            Ok((session, confirm, phase.elapsed()))
        })
        .await?;
        timings.shared_secret = secret_time;

        transport.send(&Frame::Confirm(confirm)).await?;
        let peer_confirm = match self.recv(transport).await? {
            Frame::Confirm(confirm) => confirm,
            other => return Err(unexpected(FrameType::Confirm, &other)),
        };

        let (pmk, confirm_time) = blocking(move || {
            let mut session = session;
            let phase = Instant::now();
            let pmk = session.confirm(&peer_confirm)?;
            Ok((pmk, phase.elapsed()))
        })
        .await?;
        timings.confirm = confirm_time;
        timings.total = started.elapsed();

        info!(
            peer = %peer_identity,
            pe_us = timings.password_element.as_micros() as u64,
            commit_us = timings.commit.as_micros() as u64,
            secret_us = timings.shared_secret.as_micros() as u64,
            confirm_us = timings.confirm.as_micros() as u64,
            total_us = timings.total.as_micros() as u64,
            "handshake complete"
        );

        Ok(HandshakeOutcome {
            pmk,
            peer_identity,
            timings,
        })
    }

    async fn recv<T>(&self, transport: &mut T) -> Result<Frame>
    where
        T: Transport + ?Sized,
    {
        recv_with_timeout(transport, self.recv_timeout).await
    }
}

/// Run a handshake with default transport settings.
pub async fn run_handshake<T>(
    transport: &mut T,
    config: &SessionConfig,
    password: &[u8],
    local: Identity,
) -> Result<HandshakeOutcome>
where
    T: Transport + ?Sized,
{
    HandshakeDriver::new(config.clone())
        .run(transport, password, local)
        .await
}

/// Seal `plaintext` under the PMK and send it as one SEALED frame.
pub async fn send_payload<T>(
    transport: &mut T,
    pmk: &Pmk,
    suite: CipherSuite,
    plaintext: &[u8],
    aad: &[u8],
) -> Result<()>
where
    T: Transport + ?Sized,
{
    let sealed = aead::seal(pmk, suite, plaintext, aad)?;
    transport.send(&Frame::Sealed(sealed)).await
}

/// Receive one SEALED frame and open it under the PMK.
pub async fn recv_payload<T>(
    transport: &mut T,
    pmk: &Pmk,
    aad: &[u8],
    timeout: Duration,
) -> Result<Vec<u8>>
where
    T: Transport + ?Sized,
{
    match recv_with_timeout(transport, timeout).await? {
        Frame::Sealed(sealed) => Ok(aead::open(pmk, &sealed, aad)?),
        other => Err(unexpected(FrameType::Sealed, &other)),
    }
}

/// Receive one frame, turning an ABORT from the peer into an error.
async fn recv_with_timeout<T>(transport: &mut T, timeout: Duration) -> Result<Frame>
where
    T: Transport + ?Sized,
{
    let frame = tokio::time::timeout(timeout, transport.recv())
        .await
        .map_err(|_| DragonStreamError::Timeout)??;
    match frame {
        Frame::Abort { code } => Err(DragonStreamError::PeerAborted(code)),
        frame => Ok(frame),
    }
}

/// Run CPU-bound handshake work on the blocking pool.
async fn blocking<F, R>(work: F) -> Result<R>
where
    F: FnOnce() -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DragonStreamError::Task(e.to_string()))?
}

fn commit_with_retries(
    session: &mut HandshakeSession,
    retries: u32,
) -> Result<dragontrust::Commit> {
    for attempt in 1..=retries {
        match session.commit() {
            Ok(commit) => return Ok(commit),
            Err(e) if e.is_retryable() => {
                debug!(attempt, "degenerate commit, redrawing secrets");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(DragonflyError::DegenerateScalar.into())
}

fn unexpected(expected: FrameType, got: &Frame) -> DragonStreamError {
    DragonStreamError::UnexpectedFrame {
        expected: expected.label(),
        got: got.frame_type().label(),
    }
}

/// The ABORT code to send for a local failure, if the peer should be told.
fn abort_reason(err: &DragonStreamError) -> Option<AbortReason> {
    match err {
        DragonStreamError::PeerAborted(_)
        | DragonStreamError::ConnectionClosed
        | DragonStreamError::Io(_) => None,
        DragonStreamError::Timeout => Some(AbortReason::Timeout),
        DragonStreamError::Task(_) => Some(AbortReason::Internal),
        DragonStreamError::Handshake(e) => Some(match e {
            DragonflyError::InvalidPeerScalar | DragonflyError::InvalidPeerElement => {
                AbortReason::InvalidCommit
            }
            DragonflyError::ReflectionAttack => AbortReason::Reflection,
            DragonflyError::TokenMismatch => AbortReason::TokenMismatch,
            DragonflyError::NoValidPointFound { .. } => AbortReason::NoPasswordElement,
            _ => AbortReason::Internal,
        }),
        _ => Some(AbortReason::Protocol),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_reasons_for_local_failures() {
        assert_eq!(
            abort_reason(&DragonflyError::TokenMismatch.into()),
            Some(AbortReason::TokenMismatch)
        );
        assert_eq!(
            abort_reason(&DragonflyError::InvalidPeerScalar.into()),
            Some(AbortReason::InvalidCommit)
        );
        assert_eq!(
            abort_reason(&DragonStreamError::TrailingBytes(3)),
            Some(AbortReason::Protocol)
        );
        assert_eq!(abort_reason(&DragonStreamError::Timeout), Some(AbortReason::Timeout));
        assert_eq!(
            abort_reason(&DragonStreamError::Task("panicked".into())),
            Some(AbortReason::Internal)
        );
    }

    #[test]
    fn no_abort_when_peer_is_gone() {
        assert_eq!(abort_reason(&DragonStreamError::ConnectionClosed), None);
        assert_eq!(abort_reason(&DragonStreamError::PeerAborted(4)), None);
    }

    #[tokio::test]
    async fn blocking_work_runs_off_the_async_thread() {
        let caller = std::thread::current().id();
        let worker = blocking(|| Ok(std::thread::current().id())).await.unwrap();
        assert_ne!(worker, caller);
    }

    #[tokio::test]
    async fn blocking_errors_and_panics_surface() {
        let err = blocking::<_, ()>(|| Err(DragonflyError::TokenMismatch.into()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DragonStreamError::Handshake(DragonflyError::TokenMismatch)
        ));

        let err = blocking::<_, ()>(|| panic!("boom")).await.unwrap_err();
        assert!(matches!(err, DragonStreamError::Task(_)));
    }

    #[test]
    fn driver_defaults() {
        let driver = HandshakeDriver::new(SessionConfig::default());
        assert_eq!(driver.recv_timeout(), DEFAULT_RECV_TIMEOUT);
        let driver = driver.with_recv_timeout(Duration::from_millis(250));
        assert_eq!(driver.recv_timeout(), Duration::from_millis(250));
    }
}
