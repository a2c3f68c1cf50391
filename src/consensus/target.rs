//! 256-bit unsigned arithmetic for difficulty targets
//!
//! Targets and proof-of-work digests are compared as 256-bit unsigned
//! integers. The type is 8x32-bit words, least significant word first,
//! with comparison and shifting implemented explicitly so the compact
//! decode has exact bit-level behavior.

use crate::constants::POW_LIMIT_BITS;
use crate::crypto::Hash;
use std::cmp::Ordering;
use std::fmt;

/// 256-bit unsigned integer, little-endian word order
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct U256([u32; 8]);

impl U256 {
    /// The zero value
    pub const fn zero() -> Self {
        U256([0u32; 8])
    }

    /// Whether this is the zero value
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    /// Widen a 32-bit value
    pub const fn from_u32(value: u32) -> Self {
        let mut words = [0u32; 8];
        words[0] = value;
        U256(words)
    }

    /// Interpret a wire-order digest as a little-endian 256-bit integer
    ///
    /// This is the "hash is a reversed-byte number" convention: the hex
    /// display of the hash equals the big-endian hex of this integer.
    pub fn from_hash(hash: &Hash) -> Self {
        let bytes = hash.as_bytes();
        let mut words = [0u32; 8];
        for (i, word) in words.iter_mut().enumerate() {
            let mut chunk = [0u8; 4];
            chunk.copy_from_slice(&bytes[i * 4..i * 4 + 4]);
            *word = u32::from_le_bytes(chunk);
        }
        U256(words)
    }

    /// Big-endian byte form (most significant byte first)
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (i, word) in self.0.iter().rev().enumerate() {
            bytes[i * 4..i * 4 + 4].copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    /// Big-endian hex, 64 characters
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_be_bytes())
    }

    /// Left shift by `shift` bits; bits shifted past the top are lost,
    /// a shift of 256 or more yields zero.
    pub fn shl(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::zero();
        }
        let word_shift = (shift / 32) as usize;
        let bit_shift = shift % 32;
        let mut words = [0u32; 8];
        for i in (word_shift..8).rev() {
            let mut word = self.0[i - word_shift] << bit_shift;
            if bit_shift > 0 && i > word_shift {
                word |= self.0[i - word_shift - 1] >> (32 - bit_shift);
            }
            words[i] = word;
        }
        U256(words)
    }

    /// Right shift by `shift` bits; a shift of 256 or more yields zero.
    pub fn shr(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::zero();
        }
        let word_shift = (shift / 32) as usize;
        let bit_shift = shift % 32;
        let mut words = [0u32; 8];
        for i in 0..(8 - word_shift) {
            let mut word = self.0[i + word_shift] >> bit_shift;
            if bit_shift > 0 && i + word_shift + 1 < 8 {
                word |= self.0[i + word_shift + 1] << (32 - bit_shift);
            }
            words[i] = word;
        }
        U256(words)
    }

    /// Decode a compact ("nBits") target: top byte is the exponent E
    /// (significant byte count), low 23 bits the mantissa M, bit 23 a
    /// sign flag. E <= 3 shifts M down, otherwise M is shifted up by
    /// `8*(E-3)` bits. A set sign flag or zero mantissa decodes to zero
    /// (never satisfiable), as does a shift past the 256-bit range.
    pub fn from_compact(bits: u32) -> Self {
        let exponent = bits >> 24;
        let mantissa = bits & 0x007f_ffff;

        let negative = bits & 0x0080_0000 != 0;
        if negative || mantissa == 0 {
            return U256::zero();
        }

        if exponent <= 3 {
            U256::from_u32(mantissa >> (8 * (3 - exponent)))
        } else {
            U256::from_u32(mantissa).shl(8 * (exponent - 3))
        }
    }

    /// The protocol-wide proof-of-work limit target
    pub fn pow_limit() -> Self {
        U256::from_compact(POW_LIMIT_BITS)
    }

    /// `min(self, limit)` under unsigned 256-bit ordering
    pub fn clamp_to(&self, limit: &U256) -> Self {
        if self > limit {
            *limit
        } else {
            *self
        }
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        // Most significant word first
        for i in (0..8).rev() {
            match self.0[i].cmp(&other.0[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U256({})", self.to_hex())
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
