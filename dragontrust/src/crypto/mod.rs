// Crypto module declarations

pub mod aead;
pub mod hash;
pub mod kdf;
