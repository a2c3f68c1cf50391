//! Block header structure and its canonical 80-byte wire codec

use crate::crypto::{double_sha256, Hash};
use serde::{Deserialize, Serialize};

/// Serialized header size:
/// version(4) || prev_hash(32) || merkle_root(32) || time(4) || bits(4) || nonce(4)
pub const HEADER_SIZE: usize = 80;

/// Block header containing all proof-of-work inputs
///
/// Multi-byte integer fields are little-endian on the wire; the two
/// digest fields are written in wire byte order (the reverse of their
/// display hex).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockHeader {
    /// Protocol version
    pub version: i32,
    /// Hash of the previous block
    pub prev_hash: Hash,
    /// Merkle root of all transactions
    pub merkle_root: Hash,
    /// Block timestamp (seconds since Unix epoch)
    pub time: u32,
    /// Difficulty target (compact representation)
    pub bits: u32,
    /// Nonce varied by the PoW search
    pub nonce: u32,
}

impl BlockHeader {
    /// Create a new block header
    pub fn new(
        version: i32,
        prev_hash: Hash,
        merkle_root: Hash,
        time: u32,
        bits: u32,
        nonce: u32,
    ) -> Self {
        Self {
            version,
            prev_hash,
            merkle_root,
            time,
            bits,
            nonce,
        }
    }

    /// Serialize the header for hashing
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.version.to_le_bytes());
        bytes[4..36].copy_from_slice(&self.prev_hash.0);
        bytes[36..68].copy_from_slice(&self.merkle_root.0);
        bytes[68..72].copy_from_slice(&self.time.to_le_bytes());
        bytes[72..76].copy_from_slice(&self.bits.to_le_bytes());
        bytes[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        bytes
    }

    /// Exact inverse of [`BlockHeader::to_bytes`]
    ///
    /// The mining loops never deserialize; this exists for external
    /// tooling and for verifying the codec.
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut word = [0u8; 4];
        let mut digest = [0u8; 32];

        word.copy_from_slice(&bytes[0..4]);
        let version = i32::from_le_bytes(word);
        digest.copy_from_slice(&bytes[4..36]);
        let prev_hash = Hash::from_bytes(digest);
        digest.copy_from_slice(&bytes[36..68]);
        let merkle_root = Hash::from_bytes(digest);
        word.copy_from_slice(&bytes[68..72]);
        let time = u32::from_le_bytes(word);
        word.copy_from_slice(&bytes[72..76]);
        let bits = u32::from_le_bytes(word);
        word.copy_from_slice(&bytes[76..80]);
        let nonce = u32::from_le_bytes(word);

        Self::new(version, prev_hash, merkle_root, time, bits, nonce)
    }

    /// Calculate the proof-of-work hash of this header
    pub fn hash(&self) -> Hash {
        double_sha256(&self.to_bytes())
    }

    /// Step to the next search candidate: wrapping nonce increment,
    /// bumping `time` by exactly one when the nonce space wraps.
    pub fn advance_nonce(&mut self) {
        self.nonce = self.nonce.wrapping_add(1);
        if self.nonce == 0 {
            self.time = self.time.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> BlockHeader {
        BlockHeader::new(
            1,
            Hash::zero(),
            Hash::from_hex("4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b")
                .unwrap(),
            1737933600,
            0x1d00ffff,
            2083236893,
        )
    }

    #[test]
    fn test_header_layout() {
        let header = sample_header();
        let bytes = header.to_bytes();

        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[0..4], &1i32.to_le_bytes());
        assert_eq!(&bytes[4..36], &[0u8; 32]);
        // digest fields are wire order: display hex reversed
        assert_eq!(bytes[36], 0x3b);
        assert_eq!(bytes[67], 0x4a);
        assert_eq!(&bytes[68..72], &1737933600u32.to_le_bytes());
        assert_eq!(&bytes[72..76], &0x1d00ffffu32.to_le_bytes());
        assert_eq!(&bytes[76..80], &2083236893u32.to_le_bytes());
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample_header();
        let recovered = BlockHeader::from_bytes(&header.to_bytes());
        assert_eq!(header, recovered);
    }

    #[test]
    fn test_hash_deterministic() {
        let header = sample_header();
        assert_eq!(header.hash(), header.hash());
    }

    #[test]
    fn test_nonce_change_changes_hash() {
        let header = sample_header();
        let mut other = header;
        other.nonce = other.nonce.wrapping_add(1);
        assert_ne!(header.hash(), other.hash());
    }

    #[test]
    fn test_nonce_overflow_bumps_time() {
        let mut header = sample_header();
        header.nonce = 0xFFFF_FFFE;
        let before = header;

        header.advance_nonce();
        assert_eq!(header.nonce, 0xFFFF_FFFF);
        assert_eq!(header.time, before.time);

        header.advance_nonce();
        assert_eq!(header.nonce, 0);
        assert_eq!(header.time, before.time + 1);
        assert_eq!(header.version, before.version);
        assert_eq!(header.prev_hash, before.prev_hash);
        assert_eq!(header.merkle_root, before.merkle_root);
        assert_eq!(header.bits, before.bits);
    }
}
