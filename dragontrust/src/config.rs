// Session configuration.

use serde::{Deserialize, Serialize};

use crate::crypto::aead::CipherSuite;
use crate::error::{DragonflyError, Result};
use crate::math::{params, Curve};

/// Named curve selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveId {
    #[default]
    BrainpoolP256r1,
    /// y² = x³ + 2x + 2 over F_17. Test use only.
    Textbook17,
}

impl CurveId {
    pub fn curve(self) -> &'static Curve {
        match self {
            CurveId::BrainpoolP256r1 => params::brainpool_p256r1(),
            CurveId::Textbook17 => params::textbook17(),
        }
    }
}

/// Tunables for one handshake.
///
/// Every field has a default, so a partial JSON document such as
/// `{"max_iterations": 60}` is a complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub curve: CurveId,
    /// Hunting-and-pecking counters to try (the counter is one byte).
    pub max_iterations: u8,
    /// How many times a driver may redraw secrets after a degenerate scalar.
    pub commit_retries: u32,
    /// Suite used for post-handshake payloads.
    pub cipher_suite: CipherSuite,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            curve: CurveId::BrainpoolP256r1,
            max_iterations: 40,
            commit_retries: 8,
            cipher_suite: CipherSuite::Aes256Gcm,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)
            .map_err(|e| DragonflyError::InvalidConfig(format!("parse: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(DragonflyError::InvalidConfig(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.commit_retries == 0 {
            return Err(DragonflyError::InvalidConfig(
                "commit_retries must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn curve(&self) -> &'static Curve {
        self.curve.curve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.curve, CurveId::BrainpoolP256r1);
        assert_eq!(config.max_iterations, 40);
        assert_eq!(config.cipher_suite, CipherSuite::Aes256Gcm);
        config.validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = SessionConfig::from_json(r#"{"curve": "textbook17", "max_iterations": 10}"#)
            .unwrap();
        assert_eq!(config.curve, CurveId::Textbook17);
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.commit_retries, 8);
    }

    #[test]
    fn zero_iterations_rejected() {
        assert!(matches!(
            SessionConfig::from_json(r#"{"max_iterations": 0}"#),
            Err(DragonflyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn counter_overflow_rejected_by_parser() {
        assert!(SessionConfig::from_json(r#"{"max_iterations": 256}"#).is_err());
    }

    #[test]
    fn unknown_curve_rejected() {
        assert!(SessionConfig::from_json(r#"{"curve": "p256"}"#).is_err());
    }

    #[test]
    fn cipher_suite_by_name() {
        let config = SessionConfig::from_json(r#"{"cipher_suite": "chacha20_poly1305"}"#).unwrap();
        assert_eq!(config.cipher_suite, CipherSuite::ChaCha20Poly1305);
    }
}
