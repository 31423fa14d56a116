// Peer identities.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DragonflyError, Result};

/// Longest identity accepted, in bytes.
pub const MAX_IDENTITY_LEN: usize = 255;

/// A peer's stable identifier, typically a MAC address such as
/// `44:67:2d:2c:91:a6`.
///
/// Identities only feed hashes and the max/min ordering of the password
/// hash input; ordering is byte-wise lexicographic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.len() > MAX_IDENTITY_LEN {
            return Err(DragonflyError::InvalidConfig(format!(
                "identity must be 1..={MAX_IDENTITY_LEN} bytes, got {}",
                id.len()
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// `(max(a, b), min(a, b))`, independent of which side is local.
    pub fn ordered<'a>(a: &'a Identity, b: &'a Identity) -> (&'a Identity, &'a Identity) {
        if a >= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

impl TryFrom<String> for Identity {
    type Error = DragonflyError;

    fn try_from(value: String) -> Result<Self> {
        Identity::new(value)
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
