//! Standalone CustomCoin genesis block miner
//!
//! No flags: every parameter is a compile-time constant. Prints
//! progress to standard output and exits 0 once a valid nonce is
//! found; the search has no other termination.

use cc_core::consensus::U256;
use cc_core::constants::CHAIN_FULL_NAME;
use cc_core::node::{genesis_header, mine_genesis};

fn main() {
    let header = match genesis_header() {
        Ok(header) => header,
        Err(e) => {
            eprintln!("invalid genesis parameters: {e}");
            std::process::exit(1);
        }
    };

    println!("Mining {CHAIN_FULL_NAME} genesis block...");
    println!("Target: {}", U256::from_compact(header.bits).to_hex());

    let outcome = match mine_genesis(|p| {
        println!(
            "Tried {} hashes, rate: {:.0} H/s, current hash: {}",
            p.attempts, p.hash_rate, p.current_hash
        );
    }) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("invalid genesis parameters: {e}");
            std::process::exit(1);
        }
    };

    println!();
    println!("Found valid genesis block!");
    println!("Nonce: {}", outcome.nonce);
    println!("Time: {}", outcome.time);
    println!("Hash: {}", outcome.hash);
    println!("Total hashes: {}", outcome.hashes);
    println!("Time taken: {} seconds", outcome.elapsed.as_secs());
}
