//! Double SHA-256 hashing
//!
//! Proof-of-work digests in CC are SHA256(SHA256(data)), Bitcoin style.
//! A `Hash` holds its bytes in wire order (the order SHA-256 emits them
//! and the order they appear in a serialized header); the hex display
//! form is the byte-reversed big-endian number.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Errors from digest parsing
#[derive(Debug, Error, PartialEq)]
pub enum CryptoError {
    /// Hex input that does not encode exactly 32 bytes. Over-length
    /// input is a hard error, never silently truncated.
    #[error("hash hex must be exactly 64 characters, got {0}")]
    MalformedHexInput(usize),
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// 32-byte digest, stored in wire byte order
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// Create a zero hash (used for genesis previous hash)
    pub const fn zero() -> Self {
        Hash([0u8; 32])
    }

    /// Create a hash from wire-order bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    /// Parse a display-order hex string (most significant byte first)
    /// into the wire-order representation.
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        if hex_str.len() != 64 {
            return Err(CryptoError::MalformedHexInput(hex_str.len()));
        }
        let bytes = hex::decode(hex_str)?;
        let mut arr = [0u8; 32];
        for (i, byte) in bytes.iter().enumerate() {
            arr[31 - i] = *byte;
        }
        Ok(Hash(arr))
    }

    /// Convert to the display hex form (wire bytes reversed)
    pub fn to_hex(&self) -> String {
        let mut reversed = self.0;
        reversed.reverse();
        hex::encode(reversed)
    }

    /// Get the wire-order bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

/// Double SHA-256: SHA256(SHA256(data))
pub fn double_sha256(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&second);
    Hash(arr)
}
