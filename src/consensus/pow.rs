//! Proof-of-work validation
//!
//! A header satisfies proof-of-work when its double SHA-256 digest,
//! read as a little-endian 256-bit integer, is at most the target
//! decoded from its `bits` field.

use crate::consensus::{BlockHeader, U256};

/// Decode the header's target, optionally clamped to the
/// proof-of-work limit (node behavior; the standalone genesis tool
/// decodes directly).
pub fn decode_target(bits: u32, clamp_to_pow_limit: bool) -> U256 {
    let target = U256::from_compact(bits);
    if clamp_to_pow_limit {
        target.clamp_to(&U256::pow_limit())
    } else {
        target
    }
}

/// Check proof-of-work: hash(header) <= target(bits)
///
/// A zero target (invalid compact encoding) is never satisfiable.
pub fn check_proof_of_work(header: &BlockHeader, clamp_to_pow_limit: bool) -> bool {
    let target = decode_target(header.bits, clamp_to_pow_limit);
    if target.is_zero() {
        return false;
    }
    U256::from_hash(&header.hash()) <= target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Hash;

    fn easy_header() -> BlockHeader {
        // Regtest-grade bits: roughly half of all digests qualify
        BlockHeader::new(1, Hash::zero(), Hash::zero(), 1737933600, 0x207fffff, 0)
    }

    #[test]
    fn test_mined_header_passes() {
        let mut header = easy_header();
        while !check_proof_of_work(&header, false) {
            header.advance_nonce();
        }
        assert!(check_proof_of_work(&header, true));
    }

    #[test]
    fn test_zero_target_never_satisfiable() {
        let mut header = easy_header();
        header.bits = 0x00000000;
        assert!(!check_proof_of_work(&header, false));
        // negative mantissa decodes to zero as well
        header.bits = 0x1d80ffff;
        assert!(!check_proof_of_work(&header, false));
    }

    #[test]
    fn test_clamp_is_noop_at_or_below_limit() {
        assert_eq!(
            decode_target(0x1d00ffff, true),
            U256::from_compact(0x1d00ffff)
        );
        assert_eq!(decode_target(0x207fffff, true), U256::pow_limit());
    }

    #[test]
    fn test_clamp_caps_easier_than_limit() {
        // 0x2100ffff decodes above the limit ceiling
        let unclamped = decode_target(0x2100ffff, false);
        assert!(unclamped > U256::pow_limit());
        assert_eq!(decode_target(0x2100ffff, true), U256::pow_limit());
    }
}
