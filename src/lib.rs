//! CustomCoin (CC) Mining Core Library
//!
//! Block header serialization, compact difficulty targets, and the
//! proof-of-work search loops used by the genesis tool and the node miner.
//!
//! CC is the short form used in logs and protocol identifiers.

pub mod consensus;
pub mod crypto;
pub mod mining;
pub mod node;

/// Protocol constants - HARD-CODED, NEVER CONFIGURABLE
pub mod constants {
    /// Base currency unit (8 decimal places)
    pub const COIN: u64 = 100_000_000;

    /// Coinbase reward per mined block (in base units)
    pub const BLOCK_REWARD: u64 = 50 * COIN;

    /// Easiest (numerically largest) target the chain ever accepts,
    /// in compact form. Decoded targets are clamped to this ceiling.
    /// Regtest-grade, matching the development network the node miner
    /// currently runs against.
    pub const POW_LIMIT_BITS: u32 = 0x207fffff;

    /// Compact difficulty bits stamped on node-miner block templates
    pub const TEMPLATE_BITS: u32 = 0x207fffff;

    /// Chain name (short form for logs and identifiers)
    pub const CHAIN_NAME: &str = "CC";

    /// Full chain name
    pub const CHAIN_FULL_NAME: &str = "CustomCoin";

    /// Genesis block timestamp (Unix timestamp)
    pub const GENESIS_TIMESTAMP: u32 = 1737933600; // 2025-01-26

    /// Genesis difficulty bits (Bitcoin's difficulty-1 target)
    pub const GENESIS_BITS: u32 = 0x1d00ffff;

    /// Genesis block version
    pub const GENESIS_VERSION: i32 = 1;

    /// Merkle root committed by the genesis block (display hex)
    pub const GENESIS_MERKLE_ROOT: &str =
        "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

    /// Message embedded in the genesis coinbase
    pub const GENESIS_COINBASE_MESSAGE: &str =
        "29/Jan/2025 CustomCoin: The Future of Decentralized Finance - Built for Speed, Security, and Scalability";
}
