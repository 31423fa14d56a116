use bytes::{Buf, BufMut, Bytes, BytesMut};
use num_bigint::BigUint;

use dragontrust::crypto::aead::{CipherSuite, SealedPayload};
use dragontrust::math::Point;
use dragontrust::{Commit, Confirm, Identity};

use crate::error::{DragonStreamError, Result};

/// Longest big-endian integer accepted in a COMMIT frame (a 521-bit field).
pub const MAX_INTEGER_LEN: usize = 66;

/// Largest ciphertext carried by a SEALED frame.
pub const MAX_CIPHERTEXT_LEN: usize = 16 * 1024 * 1024;

/// Largest encoded frame of any type.
pub const MAX_FRAME_LEN: usize = 1 + 2 + 12 + 4 + MAX_CIPHERTEXT_LEN;

/// Frame type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    Hello = 0x01,
    Commit = 0x02,
    Confirm = 0x03,
    Sealed = 0x04,
    Abort = 0x05,
}

impl FrameType {
    pub fn label(self) -> &'static str {
        match self {
            FrameType::Hello => "HELLO",
            FrameType::Commit => "COMMIT",
            FrameType::Confirm => "CONFIRM",
            FrameType::Sealed => "SEALED",
            FrameType::Abort => "ABORT",
        }
    }
}

impl TryFrom<u8> for FrameType {
    type Error = DragonStreamError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(FrameType::Hello),
            0x02 => Ok(FrameType::Commit),
            0x03 => Ok(FrameType::Confirm),
            0x04 => Ok(FrameType::Sealed),
            0x05 => Ok(FrameType::Abort),
            other => Err(DragonStreamError::UnknownFrameType(other)),
        }
    }
}

/// Reason codes carried in ABORT frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AbortReason {
    /// Malformed or out-of-sequence frame.
    Protocol = 0x01,
    /// Peer commit failed validation.
    InvalidCommit = 0x02,
    /// Peer reflected our own commit.
    Reflection = 0x03,
    /// Confirmation token did not verify.
    TokenMismatch = 0x04,
    /// Hunting and pecking found no password element.
    NoPasswordElement = 0x05,
    /// Peer took too long.
    Timeout = 0x06,
    Internal = 0xFF,
}

impl AbortReason {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(AbortReason::Protocol),
            0x02 => Some(AbortReason::InvalidCommit),
            0x03 => Some(AbortReason::Reflection),
            0x04 => Some(AbortReason::TokenMismatch),
            0x05 => Some(AbortReason::NoPasswordElement),
            0x06 => Some(AbortReason::Timeout),
            0xFF => Some(AbortReason::Internal),
            _ => None,
        }
    }
}

/// DragonStream wire frame.
///
/// Binary layout (all fields big-endian):
///
/// ```text
/// +-------+----------------------------+
/// | type  |  ... fields per type ...   |
/// | (1B)  |                            |
/// +-------+----------------------------+
/// ```
///
/// Integers inside COMMIT are length-prefixed (1 byte) minimal big-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// HELLO: id_len(1) + identity(N), UTF-8
    Hello { identity: Identity },
    /// COMMIT: scalar(1+N) + element.x(1+N) + element.y(1+N)
    Commit(Commit),
    /// CONFIRM: token(32)
    Confirm(Confirm),
    /// SEALED: suite(2) + nonce(12) + ct_len(4) + ciphertext(N)
    Sealed(SealedPayload),
    /// ABORT: code(1)
    Abort { code: u8 },
}

impl Frame {
    /// Return the frame type discriminant.
    pub fn frame_type(&self) -> FrameType {
        match self {
            Frame::Hello { .. } => FrameType::Hello,
            Frame::Commit(_) => FrameType::Commit,
            Frame::Confirm(_) => FrameType::Confirm,
            Frame::Sealed(_) => FrameType::Sealed,
            Frame::Abort { .. } => FrameType::Abort,
        }
    }

    pub fn abort(reason: AbortReason) -> Self {
        Frame::Abort {
            code: reason.code(),
        }
    }

    /// Encode this frame into a byte buffer.
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Encode into a pre-allocated `BytesMut`.
    ///
    /// Fails for values the wire cannot carry: an infinite commit element,
    /// oversized integers or ciphertexts.
    pub fn encode_into(&self, buf: &mut BytesMut) -> Result<()> {
        match self {
            Frame::Hello { identity } => {
                buf.put_u8(FrameType::Hello as u8);
                // Identity guarantees 1..=255 bytes.
                buf.put_u8(identity.as_bytes().len() as u8);
                buf.put_slice(identity.as_bytes());
            }
            Frame::Commit(commit) => {
                let (x, y) = match &commit.element {
                    Point::Affine { x, y } => (x, y),
                    Point::Infinity => return Err(DragonStreamError::InfiniteElement),
                };
                buf.put_u8(FrameType::Commit as u8);
                put_integer(buf, &commit.scalar, "commit scalar")?;
                put_integer(buf, x, "element x")?;
                put_integer(buf, y, "element y")?;
            }
            Frame::Confirm(confirm) => {
                buf.put_u8(FrameType::Confirm as u8);
                buf.put_slice(&confirm.token);
            }
            Frame::Sealed(sealed) => {
                if sealed.ciphertext.len() > MAX_CIPHERTEXT_LEN {
                    return Err(DragonStreamError::FieldTooLarge {
                        field: "ciphertext",
                        size: sealed.ciphertext.len(),
                        max: MAX_CIPHERTEXT_LEN,
                    });
                }
                buf.put_u8(FrameType::Sealed as u8);
                buf.put_u16(sealed.suite.wire_id());
                buf.put_slice(&sealed.nonce);
                buf.put_u32(sealed.ciphertext.len() as u32);
                buf.put_slice(&sealed.ciphertext);
            }
            Frame::Abort { code } => {
                buf.put_u8(FrameType::Abort as u8);
                buf.put_u8(*code);
            }
        }
        Ok(())
    }

    /// The number of bytes this frame will occupy when encoded.
    pub fn encoded_len(&self) -> usize {
        // 1 byte for type tag in every variant
        1 + match self {
            Frame::Hello { identity } => 1 + identity.as_bytes().len(),
            Frame::Commit(commit) => {
                let element = match &commit.element {
                    Point::Affine { x, y } => 2 + integer_len(x) + integer_len(y),
                    Point::Infinity => 0,
                };
                1 + integer_len(&commit.scalar) + element
            }
            Frame::Confirm(_) => 32,
            Frame::Sealed(sealed) => 2 + 12 + 4 + sealed.ciphertext.len(),
            Frame::Abort { .. } => 1,
        }
    }

    /// Decode exactly one frame from `data`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut buf = data;
        Self::ensure_len(buf, 1)?;
        let frame_type = FrameType::try_from(buf.get_u8())?;

        let frame = match frame_type {
            FrameType::Hello => {
                Self::ensure_len(buf, 1)?;
                let len = buf.get_u8() as usize;
                Self::ensure_len(buf, len)?;
                let raw = buf[..len].to_vec();
                buf.advance(len);
                let id = String::from_utf8(raw)
                    .map_err(|e| DragonStreamError::InvalidIdentity(e.to_string()))?;
                let identity = Identity::new(id)
                    .map_err(|e| DragonStreamError::InvalidIdentity(e.to_string()))?;
                Frame::Hello { identity }
            }
            FrameType::Commit => {
                let scalar = get_integer(&mut buf, "commit scalar")?;
                let x = get_integer(&mut buf, "element x")?;
                let y = get_integer(&mut buf, "element y")?;
                Frame::Commit(Commit {
                    scalar,
                    element: Point::new(x, y),
                })
            }
            FrameType::Confirm => {
                Self::ensure_len(buf, 32)?;
                let mut token = [0u8; 32];
                buf.copy_to_slice(&mut token);
                Frame::Confirm(Confirm { token })
            }
            FrameType::Sealed => {
                Self::ensure_len(buf, 2 + 12 + 4)?;
                let wire_id = buf.get_u16();
                let suite = CipherSuite::from_wire_id(wire_id)
                    .ok_or(DragonStreamError::UnknownCipherSuite(wire_id))?;
                let mut nonce = [0u8; 12];
                buf.copy_to_slice(&mut nonce);
                let len = buf.get_u32() as usize;
                if len > MAX_CIPHERTEXT_LEN {
                    return Err(DragonStreamError::FieldTooLarge {
                        field: "ciphertext",
                        size: len,
                        max: MAX_CIPHERTEXT_LEN,
                    });
                }
                Self::ensure_len(buf, len)?;
                let ciphertext = buf[..len].to_vec();
                buf.advance(len);
                Frame::Sealed(SealedPayload {
                    suite,
                    nonce,
                    ciphertext,
                })
            }
            FrameType::Abort => {
                Self::ensure_len(buf, 1)?;
                Frame::Abort { code: buf.get_u8() }
            }
        };

        if buf.has_remaining() {
            return Err(DragonStreamError::TrailingBytes(buf.remaining()));
        }
        Ok(frame)
    }

    fn ensure_len(data: &[u8], needed: usize) -> Result<()> {
        if data.len() < needed {
            Err(DragonStreamError::FrameTooShort {
                expected: needed,
                actual: data.len(),
            })
        } else {
            Ok(())
        }
    }
}

fn integer_len(value: &BigUint) -> usize {
    (((value.bits() + 7) / 8) as usize).max(1)
}

fn put_integer(buf: &mut BytesMut, value: &BigUint, field: &'static str) -> Result<()> {
    let bytes = value.to_bytes_be();
    if bytes.len() > MAX_INTEGER_LEN {
        return Err(DragonStreamError::FieldTooLarge {
            field,
            size: bytes.len(),
            max: MAX_INTEGER_LEN,
        });
    }
    buf.put_u8(bytes.len() as u8);
    buf.put_slice(&bytes);
    Ok(())
}

fn get_integer(buf: &mut &[u8], field: &'static str) -> Result<BigUint> {
    Frame::ensure_len(*buf, 1)?;
    let len = buf.get_u8() as usize;
    if len > MAX_INTEGER_LEN {
        return Err(DragonStreamError::FieldTooLarge {
            field,
            size: len,
            max: MAX_INTEGER_LEN,
        });
    }
    Frame::ensure_len(*buf, len)?;
    let value = BigUint::from_bytes_be(&buf[..len]);
    buf.advance(len);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_reason_codes_roundtrip() {
        for reason in [
            AbortReason::Protocol,
            AbortReason::InvalidCommit,
            AbortReason::Reflection,
            AbortReason::TokenMismatch,
            AbortReason::NoPasswordElement,
            AbortReason::Timeout,
            AbortReason::Internal,
        ] {
            assert_eq!(AbortReason::from_code(reason.code()), Some(reason));
        }
        assert_eq!(AbortReason::from_code(0x42), None);
    }

    #[test]
    fn encoded_len_matches_encoding() {
        let frames = [
            Frame::Hello {
                identity: Identity::new("peer").unwrap(),
            },
            Frame::Commit(Commit {
                scalar: BigUint::from(0u32),
                element: Point::new(BigUint::from(256u32), BigUint::from(1u32)),
            }),
            Frame::Confirm(Confirm { token: [1u8; 32] }),
            Frame::abort(AbortReason::Timeout),
        ];
        for frame in frames {
            assert_eq!(frame.encode().unwrap().len(), frame.encoded_len());
        }
    }
}
