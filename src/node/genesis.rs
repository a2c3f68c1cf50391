//! Genesis block generation for CustomCoin (CC)
//!
//! The genesis header template is fixed: the parameters here together
//! with a mined nonce reproduce the chain's first block byte-for-byte.

use crate::consensus::BlockHeader;
use crate::constants::{
    BLOCK_REWARD, GENESIS_BITS, GENESIS_MERKLE_ROOT, GENESIS_TIMESTAMP, GENESIS_VERSION,
};
use crate::crypto::{CryptoError, Hash};
use crate::mining::{search, Progress, SearchOutcome, SearchParams};
use serde::Serialize;

/// Build the genesis header template (nonce 0, not yet mined)
pub fn genesis_header() -> Result<BlockHeader, CryptoError> {
    Ok(BlockHeader::new(
        GENESIS_VERSION,
        Hash::zero(),
        Hash::from_hex(GENESIS_MERKLE_ROOT)?,
        GENESIS_TIMESTAMP,
        GENESIS_BITS,
        0,
    ))
}

/// Mine the genesis block: single-threaded search with the tool's
/// conventions (no target clamp, progress every 100000 attempts).
pub fn mine_genesis<F>(progress: F) -> Result<SearchOutcome, CryptoError>
where
    F: FnMut(&Progress),
{
    let header = genesis_header()?;
    Ok(search(header, SearchParams::default(), progress))
}

/// Genesis template summary
#[derive(Debug, Serialize)]
pub struct GenesisInfo {
    pub hash: Hash,
    pub merkle_root: Hash,
    pub timestamp: u32,
    pub bits: u32,
    /// Coinbase subsidy of the first block, in base units
    pub reward: u64,
}

impl GenesisInfo {
    pub fn new() -> Result<Self, CryptoError> {
        let header = genesis_header()?;
        Ok(Self {
            hash: header.hash(),
            merkle_root: header.merkle_root,
            timestamp: header.time,
            bits: header.bits,
            reward: BLOCK_REWARD,
        })
    }
}
